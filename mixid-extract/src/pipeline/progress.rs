//! Progress checkpoints of an extraction run
//!
//! Percentages are fixed per stage so every run reports the same shape:
//! setup takes the first 30%, recognition spreads evenly over 30-80%, and the
//! merge and link passes finish the bar.

pub const STARTED: f64 = 0.0;
pub const DOWNLOADING: f64 = 10.0;
pub const SPLITTING: f64 = 20.0;
pub const SEGMENTS_READY: f64 = 30.0;
pub const MERGING: f64 = 85.0;
pub const RESOLVING_LINKS: f64 = 90.0;
pub const FINISHED: f64 = 100.0;

/// Width of the recognition band, starting at [`SEGMENTS_READY`]
const RECOGNITION_SPAN: f64 = 50.0;

/// Percentage reported before recognizing segment `position` of `total`
pub fn segment_progress(position: usize, total: usize) -> f64 {
    if total == 0 {
        return SEGMENTS_READY;
    }
    SEGMENTS_READY + (position as f64 / total as f64) * RECOGNITION_SPAN
}
