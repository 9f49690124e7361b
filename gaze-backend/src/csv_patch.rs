//! Row-level patches to the summary table
//!
//! A patch rewrites one column (`importance` or `Comments`) of selected data
//! rows. The file is read whole, edited in memory, and written back through a
//! temporary file in the same directory followed by an atomic rename.
//! [`FileLocks`] serializes concurrent patches of the same file.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Patch errors
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("CSV is empty")]
    EmptyCsv,

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Csv(#[from] csv::Error),
}

/// Column targeted by a patch request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchColumn {
    Importance,
    Comments,
}

impl PatchColumn {
    /// Header name written when the column has to be appended
    pub fn header_name(self) -> &'static str {
        match self {
            PatchColumn::Importance => "importance",
            PatchColumn::Comments => "Comments",
        }
    }

    /// Request field carrying the new cell value
    pub fn payload_field(self) -> &'static str {
        match self {
            PatchColumn::Importance => "importance",
            PatchColumn::Comments => "comment",
        }
    }

    /// Position of the column in `header`, matched case-insensitively
    pub fn find_in(self, header: &[String]) -> Option<usize> {
        let wanted = self.header_name().to_lowercase();
        header.iter().position(|h| h.trim().to_lowercase() == wanted)
    }
}

/// One cell update: data row `row_index` (header excluded) gets `value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowUpdate {
    pub row_index: usize,
    pub value: String,
}

impl RowUpdate {
    /// Decode a single update record
    ///
    /// Returns `None` for records that are not objects or whose `rowIndex`
    /// does not coerce to a non-negative integer.
    pub fn from_value(record: &Value, column: PatchColumn) -> Option<Self> {
        let fields = record.as_object()?;
        let row_index = coerce_row_index(fields.get("rowIndex")?)?;
        let value = match fields.get(column.payload_field()) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        Some(Self { row_index, value })
    }
}

/// Accepts integers, finite floats (truncated) and integer strings
fn coerce_row_index(value: &Value) -> Option<usize> {
    let index = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => {
                let f = n.as_f64()?;
                if !f.is_finite() {
                    return None;
                }
                f.trunc() as i64
            }
        },
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        Value::Bool(b) => i64::from(*b),
        _ => return None,
    };
    usize::try_from(index).ok()
}

/// Validated patch request body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchRequest {
    pub updates: Vec<RowUpdate>,
}

impl PatchRequest {
    /// Parse a request body
    ///
    /// The body must be a JSON object (an empty body or `null` counts as `{}`).
    /// A present `updates` member must be an array; malformed records inside
    /// it are dropped.
    pub fn from_body(body: &[u8], column: PatchColumn) -> Result<Self, PatchError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let payload: Value = serde_json::from_slice(body)
            .map_err(|e| PatchError::InvalidPayload(format!("body is not valid JSON ({})", e)))?;

        let fields = match &payload {
            Value::Null => return Ok(Self::default()),
            Value::Object(fields) => fields,
            _ => {
                return Err(PatchError::InvalidPayload(
                    "body must be a JSON object".to_string(),
                ))
            }
        };

        let records = match fields.get("updates") {
            None => return Ok(Self::default()),
            Some(Value::Array(records)) => records,
            Some(_) => {
                return Err(PatchError::InvalidPayload(
                    "updates must be a list".to_string(),
                ))
            }
        };

        let updates: Vec<RowUpdate> = records
            .iter()
            .filter_map(|record| RowUpdate::from_value(record, column))
            .collect();

        if updates.len() < records.len() {
            debug!(
                "Skipped {} malformed update record(s)",
                records.len() - updates.len()
            );
        }

        Ok(Self { updates })
    }
}

/// Result of a successful patch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchOutcome {
    /// Distinct in-range data rows written
    pub updated: usize,
    pub column_added: bool,
}

/// Apply `updates` to `column` of the CSV at `path`
///
/// Out-of-range rows are ignored. When a row appears more than once the last
/// update wins. Every row is padded to the header length on write.
pub fn apply_patch(
    path: &Path,
    column: PatchColumn,
    updates: &[RowUpdate],
) -> Result<PatchOutcome, PatchError> {
    let bom = starts_with_bom(path)?;
    let mut rows = read_rows(path)?;
    if rows.is_empty() {
        return Err(PatchError::EmptyCsv);
    }

    let (column_idx, column_added) = match column.find_in(&rows[0]) {
        Some(idx) => (idx, false),
        None => {
            rows[0].push(column.header_name().to_string());
            (rows[0].len() - 1, true)
        }
    };
    let width = rows[0].len();

    let mut latest: BTreeMap<usize, &str> = BTreeMap::new();
    for update in updates {
        match update.row_index.checked_add(1) {
            Some(physical) if physical < rows.len() => {
                latest.insert(physical, &update.value);
            }
            _ => {}
        }
    }

    for (&physical, &value) in &latest {
        let row = &mut rows[physical];
        if row.len() < width {
            row.resize(width, String::new());
        }
        row[column_idx] = value.to_string();
    }

    write_rows_atomic(path, &rows, width, bom)?;

    Ok(PatchOutcome {
        updated: latest.len(),
        column_added,
    })
}

/// Read every record, header included
///
/// A leading UTF-8 byte order mark is not part of the first cell.
pub fn read_rows(path: &Path) -> Result<Vec<Vec<String>>, PatchError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    if let Some(first) = rows.first_mut().and_then(|header| header.first_mut()) {
        if let Some(stripped) = first.strip_prefix('\u{feff}') {
            *first = stripped.to_string();
        }
    }
    Ok(rows)
}

/// Spreadsheet exports often start with a UTF-8 BOM; rewrites keep it
fn starts_with_bom(path: &Path) -> Result<bool, PatchError> {
    let mut head = Vec::with_capacity(UTF8_BOM.len());
    File::open(path)?
        .take(UTF8_BOM.len() as u64)
        .read_to_end(&mut head)?;
    Ok(head == UTF8_BOM)
}

fn write_rows_atomic(
    path: &Path,
    rows: &[Vec<String>],
    width: usize,
    bom: bool,
) -> Result<(), PatchError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    if bom {
        tmp.as_file_mut().write_all(&UTF8_BOM)?;
    }

    {
        // Excel dialect line endings, matching files produced by the annotation tooling
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .terminator(csv::Terminator::CRLF)
            .from_writer(tmp.as_file_mut());

        for row in rows {
            if row.len() < width {
                let mut padded = row.clone();
                padded.resize(width, String::new());
                writer.write_record(&padded)?;
            } else {
                writer.write_record(row)?;
            }
        }
        writer.flush()?;
    }

    // Temp files are created owner-only; keep the original file's mode
    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| PatchError::Io(e.error))?;
    Ok(())
}

/// Per-file async mutexes
///
/// The guard is owned, so it can travel into the blocking task that performs
/// the read-modify-write and is released only once the rename has happened.
#[derive(Debug, Clone, Default)]
pub struct FileLocks {
    locks: Arc<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>>,
}

impl FileLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `path`
    pub async fn acquire(&self, path: &Path) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(path.to_path_buf()).or_default().clone()
        };
        lock.lock_owned().await
    }
}
