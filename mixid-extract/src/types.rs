//! Collaborator traits and run-level error type
//!
//! The extraction pipeline talks to the outside world only through these
//! traits:
//! - **MediaSource** - fetch the mix into a scratch directory
//! - **Segmenter** - cut the mix into fixed-duration segments
//! - **Recognizer** - identify one segment
//! - **LinkResolver** - find a video link for an identified track
//! - **ProgressSink** - receive progress checkpoints
//!
//! Production implementations live in `services`; tests substitute fakes.

use crate::models::{RecognitionOutcome, Segment};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Run-level failures
///
/// Any of these aborts the whole run and is reported as a terminal failure.
/// Per-segment recognition problems never surface here; they are recorded as
/// tracklist entries instead.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Downloader could not fetch the source
    #[error("Failed to download track: {0}")]
    Download(String),

    /// Downloader finished but left no audio file behind
    #[error("Download failed: No mp3 file found in temp directory.")]
    NoAudioFile,

    /// Source audio could not be read or decoded
    #[error("Failed to decode audio: {0}")]
    Decode(String),

    /// Segmenter produced nothing to recognize
    #[error("Audio produced no segments")]
    NoSegments,

    /// Tracklist could not be written
    #[error("Failed to persist tracklist: {0}")]
    Persist(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetches a mix from its source URL
#[async_trait::async_trait]
pub trait MediaSource: Send + Sync {
    /// Download `source_url` into `workdir` and return the audio file path
    async fn fetch(&self, source_url: &str, workdir: &Path) -> Result<PathBuf, ExtractionError>;
}

/// Cuts one audio file into ordered fixed-duration segments
#[async_trait::async_trait]
pub trait Segmenter: Send + Sync {
    /// Split `media` into `chunk_duration`-second segments written to `scratch_dir`
    ///
    /// Segments cover the full duration in index order; the last one may be
    /// shorter. Unreadable input fails with [`ExtractionError::Decode`].
    async fn split(
        &self,
        media: &Path,
        chunk_duration: u32,
        scratch_dir: &Path,
    ) -> Result<Vec<Segment>, ExtractionError>;
}

/// Identifies one segment against a recognition service
///
/// Infallible by signature: every failure is expressed as a
/// [`RecognitionOutcome`] variant so the engine can classify it.
#[async_trait::async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, segment: &Segment) -> RecognitionOutcome;
}

/// Looks up an external video link for an identified track
///
/// `None` means "no link"; implementations swallow their own failures.
#[async_trait::async_trait]
pub trait LinkResolver: Send + Sync {
    async fn resolve(&self, artist: &str, title: &str) -> Option<String>;
}

/// Receives progress checkpoints in production order
#[async_trait::async_trait]
pub trait ProgressSink: Send + Sync {
    /// `progress` is a percentage in [0, 100], non-decreasing within a run
    async fn report(&self, message: &str, progress: f64);
}

/// Link resolver that never resolves anything (links disabled)
pub struct NoLinks;

#[async_trait::async_trait]
impl LinkResolver for NoLinks {
    async fn resolve(&self, _artist: &str, _title: &str) -> Option<String> {
        None
    }
}

/// Progress sink that only logs
pub struct LogProgress;

#[async_trait::async_trait]
impl ProgressSink for LogProgress {
    async fn report(&self, message: &str, progress: f64) {
        tracing::info!(progress = format!("{:.1}", progress), "{}", message);
    }
}
