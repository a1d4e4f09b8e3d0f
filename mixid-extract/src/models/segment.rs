//! Audio segment produced by the segmenter

use std::path::PathBuf;

/// Fixed-duration slice of the source mix, the unit sent to the recognizer
///
/// Segments of one run are contiguous: `end_seconds` of segment *i* equals
/// `start_seconds` of segment *i+1*. Only the last one may be shorter than the
/// nominal chunk duration.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// 0-based position in the mix
    pub index: u32,
    pub start_seconds: f64,
    pub end_seconds: f64,
    /// Temporary mono WAV holding the decoded audio of this slice
    pub media: PathBuf,
}

impl Segment {
    pub fn new(index: u32, start_seconds: f64, end_seconds: f64, media: PathBuf) -> Self {
        Self {
            index,
            start_seconds,
            end_seconds,
            media,
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }

    /// Reclaim the temporary audio file once recognition is done
    ///
    /// A file that is already gone is fine; other failures are logged because
    /// the scratch directory is removed at the end of the run anyway.
    pub fn discard(&self) {
        match std::fs::remove_file(&self.media) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                segment = self.index,
                path = %self.media.display(),
                error = %e,
                "Failed to remove segment file"
            ),
        }
    }
}
