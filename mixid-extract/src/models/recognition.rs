//! Result of recognizing one segment

use serde::{Deserialize, Serialize};

/// Service status codes that mean the credentials or account are unusable
pub const FATAL_STATUS_CODES: [i32; 3] = [3001, 3002, 3003];

/// Message fragments that identify a credential failure
pub const CREDENTIAL_ERROR_MARKERS: [&str; 2] = ["Access Key", "Invalid"];

/// Outcome of one recognition call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecognitionOutcome {
    /// Best-guess match
    Identified { artist: String, title: String },
    /// Service answered but found nothing
    NotFound,
    /// Transient or content failure (network hiccup, malformed response)
    Error { message: String, code: Option<i32> },
    /// Credential or authorization failure
    FatalError { message: String, code: Option<i32> },
}

impl RecognitionOutcome {
    pub fn identified(artist: impl Into<String>, title: impl Into<String>) -> Self {
        RecognitionOutcome::Identified {
            artist: artist.into(),
            title: title.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        RecognitionOutcome::Error {
            message: message.into(),
            code: None,
        }
    }

    /// Whether this outcome means the whole run cannot succeed
    ///
    /// True for `FatalError`, and for an `Error` that carries a fatal status
    /// code or whose message names a credential problem.
    pub fn indicates_credential_failure(&self) -> bool {
        match self {
            RecognitionOutcome::FatalError { .. } => true,
            RecognitionOutcome::Error { message, code } => {
                code.is_some_and(|c| FATAL_STATUS_CODES.contains(&c))
                    || CREDENTIAL_ERROR_MARKERS
                        .iter()
                        .any(|marker| message.contains(marker))
            }
            RecognitionOutcome::Identified { .. } | RecognitionOutcome::NotFound => false,
        }
    }

    /// Error payload for `Error` and `FatalError`
    pub fn error_message(&self) -> Option<&str> {
        match self {
            RecognitionOutcome::Error { message, .. }
            | RecognitionOutcome::FatalError { message, .. } => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failure_detection() {
        assert!(RecognitionOutcome::FatalError {
            message: "limit exceeded".to_string(),
            code: Some(3003),
        }
        .indicates_credential_failure());

        assert!(RecognitionOutcome::Error {
            message: "service said no".to_string(),
            code: Some(3001),
        }
        .indicates_credential_failure());

        assert!(RecognitionOutcome::error("Missing/Invalid Access Key").indicates_credential_failure());
        assert!(RecognitionOutcome::error("Invalid signature").indicates_credential_failure());

        assert!(!RecognitionOutcome::error("connection reset by peer").indicates_credential_failure());
        assert!(!RecognitionOutcome::Error {
            message: "timeout".to_string(),
            code: Some(2005),
        }
        .indicates_credential_failure());
        assert!(!RecognitionOutcome::NotFound.indicates_credential_failure());
        assert!(!RecognitionOutcome::identified("A", "X").indicates_credential_failure());
    }

    #[test]
    fn test_marker_match_is_case_sensitive() {
        assert!(!RecognitionOutcome::error("invalid payload").indicates_credential_failure());
    }
}
