use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::TrackRecord;
use super::error::SnapshotError;

/// The exported source library, stored as a pretty-printed JSON array.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole snapshot in stored order.
    pub fn load(&self) -> Result<Vec<TrackRecord>, SnapshotError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Err(SnapshotError::NotFound(self.path.clone()));
            }
            Err(source) => {
                return Err(SnapshotError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_reader(BufReader::new(file)).map_err(|source| SnapshotError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace the snapshot with `tracks`.
    ///
    /// The new content is written to a temporary file in the same directory,
    /// synced and then renamed over the old snapshot, so a failed write leaves
    /// the previous snapshot untouched.
    pub fn save(&self, tracks: &[TrackRecord]) -> Result<(), SnapshotError> {
        let io_error = |source: std::io::Error| SnapshotError::Io {
            path: self.path.clone(),
            source,
        };

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(io_error)?;

        let temp = NamedTempFile::new_in(parent).map_err(io_error)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, tracks).map_err(SnapshotError::Serialize)?;
            writer.write_all(b"\n").map_err(io_error)?;
            writer.flush().map_err(io_error)?;
        }
        temp.as_file().sync_all().map_err(io_error)?;
        temp.persist(&self.path)
            .map_err(|error| io_error(error.error))?;

        tracing::debug!(
            "Wrote {} tracks to snapshot {}",
            tracks.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Number of tracks in the snapshot, or 0 when there is no readable one.
    pub fn count(&self) -> usize {
        match self.load() {
            Ok(tracks) => tracks.len(),
            Err(SnapshotError::NotFound(_)) => 0,
            Err(error) => {
                tracing::warn!("Error reading snapshot: {}", error);
                0
            }
        }
    }
}
