use std::path::PathBuf;

use color_eyre::Report;

/// Failures of the snapshot file.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("No snapshot found at {0}. Export the source library first")]
    NotFound(PathBuf),
    #[error("Snapshot at {path} is not a valid track list: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to access snapshot at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to serialize snapshot: {0}")]
    Serialize(serde_json::Error),
}

/// Transport or auth failure while reading from one of the catalogs.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to fetch liked tracks from the source at offset {offset}: {report:#}")]
    SourcePage { offset: u32, report: Report },
    #[error("Failed to fetch liked tracks from the destination: {0:#}")]
    LikedTracks(Report),
}

/// Failures that abort a whole export or sync run.
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
