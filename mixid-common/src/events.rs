//! Event types for the mixid event system
//!
//! Provides the job event definitions and the EventBus used to fan them out to
//! Server-Sent Events subscribers.

use crate::tracklist::TrackEntry;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// mixid event types
///
/// Events are broadcast via EventBus and serialized as-is for SSE transmission.
/// Each job produces zero or more `JobProgress` events followed by exactly one
/// terminal event (`JobCompleted` or `JobFailed`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MixidEvent {
    /// Extraction progress checkpoint
    ///
    /// Triggers:
    /// - SSE: Update progress bar and status line
    JobProgress {
        /// Job the checkpoint belongs to
        job_id: Uuid,
        /// Human-readable status line
        message: String,
        /// Percentage complete (0.0 - 100.0), non-decreasing within a job
        progress: f64,
        /// When the checkpoint was reached
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Extraction finished and the tracklist was persisted
    ///
    /// Triggers:
    /// - SSE: Render final tracklist, close stream
    JobCompleted {
        /// Completed job
        job_id: Uuid,
        /// Final merged tracklist
        tracklist: Vec<TrackEntry>,
        /// Location of the persisted JSON file
        output_location: String,
        /// When the job completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Extraction aborted with a run-level error
    ///
    /// Triggers:
    /// - SSE: Show error, close stream
    JobFailed {
        /// Failed job
        job_id: Uuid,
        /// Human-readable error message
        error: String,
        /// When the job failed
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl MixidEvent {
    /// Event type name, used as the SSE `event:` field
    pub fn event_type(&self) -> &str {
        match self {
            MixidEvent::JobProgress { .. } => "JobProgress",
            MixidEvent::JobCompleted { .. } => "JobCompleted",
            MixidEvent::JobFailed { .. } => "JobFailed",
        }
    }

    /// Job the event belongs to
    pub fn job_id(&self) -> Uuid {
        match self {
            MixidEvent::JobProgress { job_id, .. }
            | MixidEvent::JobCompleted { job_id, .. }
            | MixidEvent::JobFailed { job_id, .. } => *job_id,
        }
    }

    /// True for the last event a job emits
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MixidEvent::JobCompleted { .. } | MixidEvent::JobFailed { .. }
        )
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus for job events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use mixid_common::events::{EventBus, MixidEvent};
/// use uuid::Uuid;
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(MixidEvent::JobProgress {
///     job_id: Uuid::new_v4(),
///     message: "Starting extraction process...".to_string(),
///     progress: 0.0,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MixidEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<MixidEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: MixidEvent,
    ) -> Result<usize, broadcast::error::SendError<MixidEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: MixidEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(job_id: Uuid, pct: f64) -> MixidEvent {
        MixidEvent::JobProgress {
            job_id,
            message: format!("{}%", pct),
            progress: pct,
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let job_id = Uuid::new_v4();
        let json = serde_json::to_value(progress(job_id, 30.0)).unwrap();

        assert_eq!(json["type"], "JobProgress");
        assert_eq!(json["job_id"], job_id.to_string());
        assert_eq!(json["progress"], 30.0);
    }

    #[test]
    fn test_terminal_classification() {
        let job_id = Uuid::new_v4();
        assert!(!progress(job_id, 10.0).is_terminal());
        assert!(MixidEvent::JobFailed {
            job_id,
            error: "boom".to_string(),
            timestamp: chrono::Utc::now(),
        }
        .is_terminal());
        assert!(MixidEvent::JobCompleted {
            job_id,
            tracklist: vec![],
            output_location: "output/tracklist.json".to_string(),
            timestamp: chrono::Utc::now(),
        }
        .is_terminal());
    }

    #[tokio::test]
    async fn test_event_bus_preserves_emission_order() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let job_id = Uuid::new_v4();

        for pct in [0.0, 10.0, 20.0, 30.0] {
            bus.emit(progress(job_id, pct)).unwrap();
        }

        let mut seen = Vec::new();
        for _ in 0..4 {
            if let MixidEvent::JobProgress { progress, .. } = rx.recv().await.unwrap() {
                seen.push(progress);
            }
        }
        assert_eq!(seen, vec![0.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_emit_without_subscribers_errors() {
        let bus = EventBus::new(4);
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus.emit(progress(Uuid::new_v4(), 0.0)).is_err());
        assert_eq!(bus.capacity(), 4);
    }
}
