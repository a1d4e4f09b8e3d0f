//! # mixid Common Library
//!
//! Shared code for the mixid tracklist extractor binaries:
//! - Tracklist data model (TrackEntry, TrackStatus)
//! - Event types (MixidEvent enum) and the EventBus
//! - Configuration loading
//! - Tracing initialisation

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod tracklist;

pub use error::{Error, Result};
pub use tracklist::{TrackEntry, TrackStatus, Tracklist};
