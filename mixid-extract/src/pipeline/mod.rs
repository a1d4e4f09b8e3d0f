//! Chunk identification and merge pipeline
//!
//! - `classify` - per-segment classification with the seen set
//! - `merge` - adjacent span coalescing
//! - `engine` - recognition loop, first-segment abort, link pass
//! - `extraction` - complete run from source URL to persisted tracklist
//! - `progress` - checkpoint percentages

pub mod classify;
pub mod engine;
pub mod extraction;
pub mod merge;
pub mod progress;

pub use classify::{chunk_span, fatal_tracklist, is_fatal_tracklist, Classifier};
pub use engine::TracklistEngine;
pub use extraction::{ExtractionOutput, ExtractionWorkflow};
pub use merge::{merge_spans, renumber};
