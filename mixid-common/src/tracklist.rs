//! Tracklist data model
//!
//! A tracklist is the durable artifact of an extraction run: an ordered list of
//! entries, each covering one span of the mix. The JSON field names are a
//! contract with downstream tooling and must not change.

use serde::{Deserialize, Serialize};

/// Ordered tracklist produced by one extraction run
pub type Tracklist = Vec<TrackEntry>;

/// Classification of one tracklist entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackStatus {
    /// Track identified and not seen earlier in the mix
    #[serde(rename = "ok")]
    Ok,
    /// Recognition service returned no match
    #[serde(rename = "not found")]
    NotFound,
    /// Recognition failed for this chunk (run continues)
    #[serde(rename = "error")]
    Error,
    /// Track already identified earlier in the mix, or unclassifiable result
    #[serde(rename = "duplicate or unknown")]
    DuplicateOrUnknown,
    /// Credential or service failure on the first chunk (run aborted)
    #[serde(rename = "fatal error")]
    FatalError,
}

impl TrackStatus {
    /// Wire label, identical to the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackStatus::Ok => "ok",
            TrackStatus::NotFound => "not found",
            TrackStatus::Error => "error",
            TrackStatus::DuplicateOrUnknown => "duplicate or unknown",
            TrackStatus::FatalError => "fatal error",
        }
    }
}

impl std::fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the tracklist
///
/// `artist` and `title` are both present iff `status == Ok`. Build entries
/// through the per-status constructors to keep that true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEntry {
    /// 1-based position in the emitted list
    pub order: u32,
    /// `[start, end]` of the span in seconds
    pub chunk_seconds: [u64; 2],
    pub artist: Option<String>,
    pub title: Option<String>,
    pub status: TrackStatus,
    /// Failure detail for `error` and `fatal error` entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Video link resolved for `ok` entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_link: Option<String>,
}

impl TrackEntry {
    fn bare(order: u32, chunk_seconds: [u64; 2], status: TrackStatus) -> Self {
        Self {
            order,
            chunk_seconds,
            artist: None,
            title: None,
            status,
            error: None,
            external_link: None,
        }
    }

    /// Identified track
    pub fn identified(
        order: u32,
        chunk_seconds: [u64; 2],
        artist: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            artist: Some(artist.into()),
            title: Some(title.into()),
            ..Self::bare(order, chunk_seconds, TrackStatus::Ok)
        }
    }

    pub fn not_found(order: u32, chunk_seconds: [u64; 2]) -> Self {
        Self::bare(order, chunk_seconds, TrackStatus::NotFound)
    }

    pub fn duplicate_or_unknown(order: u32, chunk_seconds: [u64; 2]) -> Self {
        Self::bare(order, chunk_seconds, TrackStatus::DuplicateOrUnknown)
    }

    pub fn error(order: u32, chunk_seconds: [u64; 2], message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::bare(order, chunk_seconds, TrackStatus::Error)
        }
    }

    pub fn fatal_error(order: u32, chunk_seconds: [u64; 2], message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::bare(order, chunk_seconds, TrackStatus::FatalError)
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == TrackStatus::Ok
    }

    /// `(artist, title)` for identified entries
    pub fn identity(&self) -> Option<(&str, &str)> {
        match (self.status, self.artist.as_deref(), self.title.as_deref()) {
            (TrackStatus::Ok, Some(artist), Some(title)) => Some((artist, title)),
            _ => None,
        }
    }
}

/// Number of identified tracks in a tracklist
pub fn identified_count(tracklist: &[TrackEntry]) -> usize {
    tracklist.iter().filter(|entry| entry.is_ok()).count()
}
