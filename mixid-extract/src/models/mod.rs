//! Data models for the extraction pipeline

pub mod job;
pub mod recognition;
pub mod segment;

pub use job::{Job, JobState, JobStatus};
pub use recognition::{RecognitionOutcome, CREDENTIAL_ERROR_MARKERS, FATAL_STATUS_CODES};
pub use segment::Segment;
