//! Tracklist persistence
//!
//! Writes the final tracklist as a pretty-printed JSON array to
//! `<output_dir>/tracklist_<YYYYmmdd_HHMMSS>.json`. This file is the durable
//! artifact of a run.

use crate::types::ExtractionError;
use mixid_common::TrackEntry;
use std::path::PathBuf;

/// Writes timestamped tracklist files into one output folder
#[derive(Debug, Clone)]
pub struct TracklistWriter {
    output_dir: PathBuf,
}

impl TracklistWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Persist `tracklist` and return the file path
    pub fn write(&self, tracklist: &[TrackEntry]) -> Result<PathBuf, ExtractionError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|e| {
            ExtractionError::Persist(format!(
                "create {}: {}",
                self.output_dir.display(),
                e
            ))
        })?;

        let path = self.next_path();
        let json = serde_json::to_string_pretty(tracklist)
            .map_err(|e| ExtractionError::Persist(e.to_string()))?;
        std::fs::write(&path, json)
            .map_err(|e| ExtractionError::Persist(format!("write {}: {}", path.display(), e)))?;

        tracing::info!(path = %path.display(), entries = tracklist.len(), "Tracklist saved");
        Ok(path)
    }

    /// Timestamped file name; a numeric suffix avoids clobbering a file
    /// written within the same second
    fn next_path(&self) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let base = self.output_dir.join(format!("tracklist_{}.json", timestamp));
        if !base.exists() {
            return base;
        }
        (1u32..)
            .map(|n| {
                self.output_dir
                    .join(format!("tracklist_{}_{}.json", timestamp, n))
            })
            .find(|candidate| !candidate.exists())
            .unwrap_or(base)
    }
}
