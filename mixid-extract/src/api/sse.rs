//! Server-Sent Events (SSE) for job progress streaming

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use mixid_common::events::MixidEvent;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// GET /jobs/:job_id/events - SSE event stream for one job
///
/// Replays the events the job has produced so far, then streams live ones:
/// - JobProgress (zero or more)
/// - JobCompleted or JobFailed (exactly one, then the stream ends)
///
/// A recently finished job replays its full history, terminal event
/// included. 404 when the job is unknown or its retention has run out.
pub async fn job_event_stream(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let (history, mut rx) = state
        .orchestrator
        .subscribe(job_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Job {} not found", job_id)))?;

    info!(job_id = %job_id, replayed = history.len(), "New SSE client connected to job events");

    let stream = async_stream::stream! {
        let mut finished = false;

        for event in history {
            finished = event.is_terminal();
            if let Some(sse_event) = to_sse_event(&event) {
                yield Ok(sse_event);
            }
            if finished {
                break;
            }
        }

        while !finished {
            match rx.recv().await {
                Some(event) => {
                    finished = event.is_terminal();
                    if let Some(sse_event) = to_sse_event(&event) {
                        yield Ok(sse_event);
                    }
                }
                None => {
                    warn!(job_id = %job_id, "SSE: Job channel closed before terminal event");
                    break;
                }
            }
        }

        info!(job_id = %job_id, "SSE: Job event stream ended");
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    ))
}

fn to_sse_event(event: &MixidEvent) -> Option<Event> {
    let event_type = event.event_type();
    match serde_json::to_string(event) {
        Ok(event_json) => {
            debug!("SSE: Sending job event: {}", event_type);
            Some(Event::default().event(event_type).data(event_json))
        }
        Err(e) => {
            warn!("SSE: Failed to serialize event {}: {}", event_type, e);
            None
        }
    }
}
