//! Per-segment classification
//!
//! Turns each recognition outcome into a raw tracklist entry. Holds the
//! run-wide "seen" set: an identification that already appeared earlier in
//! the mix becomes `duplicate or unknown`, unless it directly continues the
//! span of the previous segment (that case is left `ok` for the merge pass).

use crate::models::RecognitionOutcome;
use mixid_common::{TrackEntry, Tracklist};
use std::collections::HashSet;

/// `[index * chunk, (index + 1) * chunk]` in seconds
///
/// Uses the nominal chunk duration even for a short final segment so spans
/// add up exactly when merged.
pub fn chunk_span(index: u32, chunk_duration: u32) -> [u64; 2] {
    let index = u64::from(index);
    let chunk = u64::from(chunk_duration);
    [index * chunk, (index + 1) * chunk]
}

/// Single-entry tracklist returned when the first segment is fatal
pub fn fatal_tracklist(chunk_duration: u32, message: &str) -> Tracklist {
    vec![TrackEntry::fatal_error(
        1,
        [0, u64::from(chunk_duration)],
        message,
    )]
}

/// True when the tracklist is the result of a first-segment abort
pub fn is_fatal_tracklist(tracklist: &[TrackEntry]) -> bool {
    matches!(tracklist, [entry] if entry.status == mixid_common::TrackStatus::FatalError)
}

/// Stateful classifier for one run
pub struct Classifier {
    chunk_duration: u32,
    seen: HashSet<(String, String)>,
    /// Identity of the previous entry when it was `ok`
    previous_ok: Option<(String, String)>,
}

impl Classifier {
    pub fn new(chunk_duration: u32) -> Self {
        Self {
            chunk_duration,
            seen: HashSet::new(),
            previous_ok: None,
        }
    }

    /// Classify the outcome of segment `index`
    pub fn classify(&mut self, index: u32, outcome: RecognitionOutcome) -> TrackEntry {
        let order = index + 1;
        let span = chunk_span(index, self.chunk_duration);

        let entry = match outcome {
            RecognitionOutcome::Error { message, .. }
            | RecognitionOutcome::FatalError { message, .. } => {
                TrackEntry::error(order, span, message)
            }
            RecognitionOutcome::NotFound => TrackEntry::not_found(order, span),
            RecognitionOutcome::Identified { artist, title }
                if artist.trim().is_empty() || title.trim().is_empty() =>
            {
                TrackEntry::duplicate_or_unknown(order, span)
            }
            RecognitionOutcome::Identified { artist, title } => {
                let pair = (artist, title);
                if self.previous_ok.as_ref() == Some(&pair) || self.seen.insert(pair.clone()) {
                    TrackEntry::identified(order, span, pair.0, pair.1)
                } else {
                    TrackEntry::duplicate_or_unknown(order, span)
                }
            }
        };

        self.previous_ok = entry
            .identity()
            .map(|(artist, title)| (artist.to_string(), title.to_string()));
        entry
    }

    /// Number of distinct tracks identified so far
    pub fn distinct_tracks(&self) -> usize {
        self.seen.len()
    }
}
