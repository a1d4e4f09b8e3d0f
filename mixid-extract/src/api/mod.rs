//! HTTP API handlers for mixid-extract
//!
//! REST for job submission and lookup, SSE for progress and results.

pub mod extract;
pub mod health;
pub mod sse;
pub mod ui;

pub use extract::extract_routes;
pub use health::health_routes;
pub use sse::job_event_stream;
pub use ui::ui_routes;
