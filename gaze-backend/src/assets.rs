//! Well-known file resolution under the data root

use gaze_common::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Files the backend knows how to serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Asset {
    Video,
    QuickView,
    Gaze,
    /// Summary table as read by the viewer (fallback chain)
    Summary,
    /// Summary table that receives importance/comment patches
    SummaryPatchTarget,
    SummaryCategories,
    Transcript,
    Standing,
    QuickPreview,
    SurgicalRoleTransitions,
    Phases,
}

const MERGED_SUMMARY: &str = "lap_neon_gaze_semantic_summary_merged.csv";

impl Asset {
    pub const ALL: [Asset; 11] = [
        Asset::Video,
        Asset::QuickView,
        Asset::Gaze,
        Asset::Summary,
        Asset::SummaryPatchTarget,
        Asset::SummaryCategories,
        Asset::Transcript,
        Asset::Standing,
        Asset::QuickPreview,
        Asset::SurgicalRoleTransitions,
        Asset::Phases,
    ];

    /// Candidate file names, in priority order
    pub fn file_names(self) -> &'static [&'static str] {
        match self {
            Asset::Video => &["lap_full_voice.mp4"],
            Asset::QuickView => &["quickview.mp4"],
            Asset::Gaze => &["gaze_positions.npy"],
            Asset::Summary => &["summaryv3.csv", "summaryv2.csv", "summary.csv", MERGED_SUMMARY],
            Asset::SummaryPatchTarget => &["summaryv3.csv"],
            Asset::SummaryCategories => &[MERGED_SUMMARY],
            Asset::Transcript => &["lap+neon+gaze.srt"],
            Asset::Standing => &["standing.csv"],
            Asset::QuickPreview => &["uniform_samples.csv"],
            Asset::SurgicalRoleTransitions => &["surgical_role_transitions.md"],
            Asset::Phases => &["phases.csv"],
        }
    }

    /// Message reported when no candidate exists
    pub fn not_found_message(self) -> &'static str {
        match self {
            Asset::Video => "Video not found",
            Asset::QuickView => "Quick view video not found",
            Asset::Gaze => "Gaze data not found",
            Asset::Summary => "Summary CSV not found",
            Asset::SummaryPatchTarget => "summaryv3.csv not found",
            Asset::SummaryCategories => "Merged summary CSV not found",
            Asset::Transcript => "Transcript SRT not found",
            Asset::Standing => "Standing CSV not found",
            Asset::QuickPreview => "Quick preview CSV not found",
            Asset::SurgicalRoleTransitions => "surgical_role_transitions.md not found",
            Asset::Phases => "Phases CSV not found",
        }
    }
}

/// Resolves well-known assets against a fixed data root
///
/// Candidate paths are computed once at construction; existence is checked on
/// every lookup so files added or removed at runtime are picked up.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    root: PathBuf,
    paths: HashMap<Asset, Vec<PathBuf>>,
}

impl AssetResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let paths = Asset::ALL
            .iter()
            .map(|&asset| {
                let candidates = asset.file_names().iter().map(|name| root.join(name)).collect();
                (asset, candidates)
            })
            .collect();
        Self { root, paths }
    }

    /// Candidate paths for `asset`, in priority order
    pub fn candidates(&self, asset: Asset) -> &[PathBuf] {
        self.paths.get(&asset).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First existing candidate
    pub async fn locate(&self, asset: Asset) -> Option<PathBuf> {
        for candidate in self.candidates(asset) {
            if is_regular_file(candidate).await {
                return Some(candidate.clone());
            }
        }
        None
    }

    pub async fn exists(&self, asset: Asset) -> bool {
        self.locate(asset).await.is_some()
    }

    /// Like [`locate`](Self::locate), but a missing file is a `NotFound` error
    pub async fn require(&self, asset: Asset) -> Result<PathBuf> {
        self.locate(asset)
            .await
            .ok_or_else(|| Error::NotFound(asset.not_found_message().to_string()))
    }

    /// Path for a caller-supplied image name
    ///
    /// Only the final path component is kept, so the result always sits
    /// directly inside the data root. Returns `None` when nothing usable is left
    /// (empty names, `..`).
    pub fn image_path(&self, requested: &str) -> Option<PathBuf> {
        let name = Path::new(requested).file_name()?;
        Some(self.root.join(name))
    }
}

/// `true` when `path` exists and is not a directory or other special file
pub async fn is_regular_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn summary_prefers_newest_version() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("summary.csv"), "a\n").unwrap();
        fs::write(dir.path().join("summaryv2.csv"), "b\n").unwrap();
        let resolver = AssetResolver::new(dir.path());

        assert_eq!(
            resolver.locate(Asset::Summary).await,
            Some(dir.path().join("summaryv2.csv"))
        );

        fs::write(dir.path().join("summaryv3.csv"), "c\n").unwrap();
        assert_eq!(
            resolver.locate(Asset::Summary).await,
            Some(dir.path().join("summaryv3.csv"))
        );
    }

    #[tokio::test]
    async fn summary_falls_back_to_merged_table() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MERGED_SUMMARY), "a\n").unwrap();
        let resolver = AssetResolver::new(dir.path());

        assert_eq!(
            resolver.locate(Asset::Summary).await,
            Some(dir.path().join(MERGED_SUMMARY))
        );
        assert!(!resolver.exists(Asset::SummaryPatchTarget).await);
    }

    #[tokio::test]
    async fn require_reports_not_found_message() {
        let dir = TempDir::new().unwrap();
        let resolver = AssetResolver::new(dir.path());

        match resolver.require(Asset::Phases).await {
            Err(Error::NotFound(msg)) => assert_eq!(msg, "Phases CSV not found"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn directory_is_not_an_asset() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("phases.csv")).unwrap();
        let resolver = AssetResolver::new(dir.path());

        assert!(!resolver.exists(Asset::Phases).await);
    }

    #[test]
    fn image_path_strips_directories() {
        let resolver = AssetResolver::new("/data");

        assert_eq!(
            resolver.image_path("../../etc/passwd"),
            Some(PathBuf::from("/data/passwd"))
        );
        assert_eq!(
            resolver.image_path("nested/dir/report.heic"),
            Some(PathBuf::from("/data/report.heic"))
        );
        assert_eq!(resolver.image_path(".."), None);
        assert_eq!(resolver.image_path(""), None);
    }
}
