//! Gaze array decoding
//!
//! Gaze recordings arrive as `.npy` arrays whose shape depends on the exporter:
//! `(N, 2+)` per-sample rows, `(F, P, 2+)` per-frame point sets, or a flat
//! `(2N,)` vector. All of them reduce to one `[x, y]` pair per sample.

use ndarray::{ArrayD, Ix1, Ix2, Ix3};
use ndarray_npy::{ReadNpyError, ReadNpyExt};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Largest per-axis value still treated as a normalized (0-1) coordinate
pub const NORMALIZED_LIMIT: f64 = 1.5;

/// Replacement for NaN coordinates
pub const NAN_SENTINEL: f64 = -1.0;

/// Gaze decoding errors
#[derive(Debug, Error)]
pub enum GazeError {
    #[error("failed to read gaze file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse gaze array: {0}")]
    Npy(#[from] ReadNpyError),

    #[error("unsupported gaze array dtype")]
    UnsupportedDtype,

    #[error("{0}")]
    Shape(String),
}

/// Decoded gaze points as served by `/api/gaze`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GazeResponse {
    pub points: Vec<[f64; 2]>,
    /// Heuristic: true when no coordinate exceeds [`NORMALIZED_LIMIT`]
    pub normalized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GazeResponse {
    /// No gaze data available
    pub fn empty() -> Self {
        Self {
            points: Vec::new(),
            normalized: true,
            error: None,
        }
    }

    /// Decode failure reported in-band
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::empty()
        }
    }

    pub fn from_points(points: Vec<[f64; 2]>) -> Self {
        let normalized = is_normalized(&points);
        Self {
            points,
            normalized,
            error: None,
        }
    }
}

/// Load and decode a gaze file
pub fn load_gaze_file(path: &Path) -> Result<GazeResponse, GazeError> {
    let bytes = std::fs::read(path)?;
    decode_gaze(&bytes)
}

/// Decode `.npy` bytes into gaze points
pub fn decode_gaze(bytes: &[u8]) -> Result<GazeResponse, GazeError> {
    let array = read_as_f64(bytes)?;
    let points = sanitize(extract_points(array)?);
    Ok(GazeResponse::from_points(points))
}

macro_rules! try_dtype {
    ($bytes:expr, $ty:ty) => {
        match ArrayD::<$ty>::read_npy($bytes) {
            Ok(array) => return Ok(array.mapv(|v| v as f64)),
            Err(ReadNpyError::WrongDescriptor(_)) => {}
            Err(e) => return Err(e.into()),
        }
    };
}

/// Read an `.npy` payload of any numeric dtype as `f64`
fn read_as_f64(bytes: &[u8]) -> Result<ArrayD<f64>, GazeError> {
    try_dtype!(bytes, f64);
    try_dtype!(bytes, f32);
    try_dtype!(bytes, i64);
    try_dtype!(bytes, i32);
    try_dtype!(bytes, i16);
    try_dtype!(bytes, i8);
    try_dtype!(bytes, u64);
    try_dtype!(bytes, u32);
    try_dtype!(bytes, u16);
    try_dtype!(bytes, u8);
    Err(GazeError::UnsupportedDtype)
}

/// Reduce an array of any supported rank to `[x, y]` pairs
///
/// - rank 2 with at least two columns: columns 0 and 1 of every row
/// - rank 3 with at least two coordinates: first point of every frame
/// - rank 1 with at least two values: consecutive pairs
/// - anything else: no points
pub fn extract_points(array: ArrayD<f64>) -> Result<Vec<[f64; 2]>, GazeError> {
    let shape = array.shape().to_vec();
    let last = shape.last().copied().unwrap_or(0);

    match shape.len() {
        2 if last >= 2 => {
            let rows = array.into_dimensionality::<Ix2>().map_err(shape_error)?;
            Ok(rows.outer_iter().map(|row| [row[0], row[1]]).collect())
        }
        3 if last >= 2 => {
            if shape[0] > 0 && shape[1] == 0 {
                return Err(GazeError::Shape(format!(
                    "gaze array of shape {:?} has no points per frame",
                    shape
                )));
            }
            let frames = array.into_dimensionality::<Ix3>().map_err(shape_error)?;
            Ok(frames
                .outer_iter()
                .map(|frame| [frame[[0, 0]], frame[[0, 1]]])
                .collect())
        }
        1 if shape[0] >= 2 => {
            let flat = array.into_dimensionality::<Ix1>().map_err(shape_error)?;
            if flat.len() % 2 != 0 {
                return Err(GazeError::Shape(format!(
                    "cannot reshape array of size {} into pairs",
                    flat.len()
                )));
            }
            let values: Vec<f64> = flat.iter().copied().collect();
            Ok(values.chunks_exact(2).map(|pair| [pair[0], pair[1]]).collect())
        }
        _ => Ok(Vec::new()),
    }
}

fn shape_error(err: ndarray::ShapeError) -> GazeError {
    GazeError::Shape(err.to_string())
}

/// NaN becomes [`NAN_SENTINEL`]; infinities clamp to the finite range
pub fn sanitize(mut points: Vec<[f64; 2]>) -> Vec<[f64; 2]> {
    for point in &mut points {
        for v in point.iter_mut() {
            if v.is_nan() {
                *v = NAN_SENTINEL;
            } else if *v == f64::INFINITY {
                *v = f64::MAX;
            } else if *v == f64::NEG_INFINITY {
                *v = f64::MIN;
            }
        }
    }
    points
}

/// Per-axis maximum, `[0, 0]` when there are no points
pub fn axis_max(points: &[[f64; 2]]) -> [f64; 2] {
    if points.is_empty() {
        return [0.0, 0.0];
    }
    points.iter().fold([f64::MIN, f64::MIN], |acc, p| {
        [acc[0].max(p[0]), acc[1].max(p[1])]
    })
}

/// Pixel coordinates below the limit on both axes are misclassified as
/// normalized; callers treat the flag as a hint.
pub fn is_normalized(points: &[[f64; 2]]) -> bool {
    let [max_x, max_y] = axis_max(points);
    max_x <= NORMALIZED_LIMIT && max_y <= NORMALIZED_LIMIT
}
