//! Background job orchestration
//!
//! Accepts extraction requests, runs each one on its own tokio task and
//! publishes its progress.
//!
//! Every event is appended to the job's history and pushed to each of the
//! job's subscribers over its own unbounded channel, all under the registry
//! write lock. A subscriber therefore sees the replayed history followed by
//! the live events, each exactly once and in order, no matter how busy other
//! jobs are. Events are also mirrored onto the process-wide [`EventBus`].
//!
//! Finished jobs stay in the registry for a retention period so that a
//! client connecting after a fast failure still gets the terminal event.

use crate::models::{Job, JobState, JobStatus};
use crate::pipeline::ExtractionWorkflow;
use crate::types::ProgressSink;
use mixid_common::events::{EventBus, MixidEvent};
use mixid_common::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// How long a finished job stays replayable
pub const DEFAULT_FINISHED_RETENTION: Duration = Duration::from_secs(600);

/// Upper bound on finished jobs kept for replay
pub const DEFAULT_MAX_FINISHED_JOBS: usize = 100;

/// A job plus the events it has produced so far
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub job: Job,
    pub history: Vec<MixidEvent>,
    /// Set when the terminal event is published
    pub finished_at: Option<Instant>,
    subscribers: Vec<mpsc::UnboundedSender<MixidEvent>>,
}

impl JobRecord {
    fn new(job: Job) -> Self {
        Self {
            job,
            history: Vec::new(),
            finished_at: None,
            subscribers: Vec::new(),
        }
    }

    fn publish(&mut self, event: &MixidEvent) {
        self.history.push(event.clone());
        // Disconnected clients drop out here
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn is_expired(&self, retention: Duration, now: Instant) -> bool {
        self.finished_at
            .is_some_and(|finished_at| now.saturating_duration_since(finished_at) >= retention)
    }

    fn status(&self) -> JobStatus {
        let mut state = JobState::Running;
        let mut progress = 0.0;
        let mut error = None;
        for event in &self.history {
            match event {
                MixidEvent::JobProgress { progress: p, .. } => progress = *p,
                MixidEvent::JobCompleted { .. } => {
                    state = JobState::Completed;
                    progress = 100.0;
                }
                MixidEvent::JobFailed { error: e, .. } => {
                    state = JobState::Failed;
                    progress = 100.0;
                    error = Some(e.clone());
                }
            }
        }

        let since_finish = self
            .finished_at
            .map(|finished_at| finished_at.elapsed().as_secs())
            .unwrap_or(0);

        JobStatus {
            job: self.job.clone(),
            state,
            progress,
            error,
            elapsed_seconds: self.job.elapsed_seconds().saturating_sub(since_finish),
        }
    }
}

/// Shared job bookkeeping
pub type JobRegistry = Arc<RwLock<HashMap<Uuid, JobRecord>>>;

/// How long and how many finished jobs are kept
#[derive(Debug, Clone, Copy)]
struct Retention {
    period: Duration,
    max_finished: usize,
}

impl Retention {
    /// Drop expired finished jobs, then the oldest ones over the cap
    fn prune(&self, registry: &mut HashMap<Uuid, JobRecord>, now: Instant) {
        registry.retain(|_, record| !record.is_expired(self.period, now));

        let mut finished: Vec<(Instant, Uuid)> = registry
            .iter()
            .filter_map(|(id, record)| record.finished_at.map(|at| (at, *id)))
            .collect();
        if finished.len() <= self.max_finished {
            return;
        }
        finished.sort();
        let excess = finished.len() - self.max_finished;
        for (_, id) in finished.into_iter().take(excess) {
            registry.remove(&id);
        }
    }
}

/// Runs extraction jobs in the background
pub struct JobOrchestrator {
    workflow: ExtractionWorkflow,
    registry: JobRegistry,
    event_bus: EventBus,
    retention: Retention,
    last_error: Arc<RwLock<Option<String>>>,
}

impl JobOrchestrator {
    pub fn new(workflow: ExtractionWorkflow, registry: JobRegistry, event_bus: EventBus) -> Self {
        Self {
            workflow,
            registry,
            event_bus,
            retention: Retention {
                period: DEFAULT_FINISHED_RETENTION,
                max_finished: DEFAULT_MAX_FINISHED_JOBS,
            },
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Override how long and how many finished jobs stay replayable
    pub fn with_retention(mut self, period: Duration, max_finished: usize) -> Self {
        self.retention = Retention {
            period,
            max_finished,
        };
        self
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Accept a job and start it in the background
    ///
    /// Returns as soon as the job is registered; progress and the result
    /// arrive as events tagged with the returned id.
    pub async fn submit(self: &Arc<Self>, source_url: &str, chunk_duration: u32) -> Result<Uuid> {
        let source_url = source_url.trim();
        if source_url.is_empty() {
            return Err(Error::InvalidInput("Source URL is required".to_string()));
        }
        if chunk_duration == 0 {
            return Err(Error::InvalidInput(
                "chunk_duration must be a positive number of seconds".to_string(),
            ));
        }

        let job = Job::new(source_url, chunk_duration);
        let job_id = job.job_id;

        self.registry
            .write()
            .await
            .insert(job_id, JobRecord::new(job.clone()));

        tracing::info!(
            job_id = %job_id,
            source_url = %job.source_url,
            chunk_duration,
            "Extraction job accepted"
        );

        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            orchestrator.run_job(job).await;
        });

        Ok(job_id)
    }

    async fn run_job(&self, job: Job) {
        let job_id = job.job_id;
        tracing::info!(job_id = %job_id, "Background extraction task started");

        let channel = JobChannel {
            job_id,
            registry: Arc::clone(&self.registry),
            event_bus: self.event_bus.clone(),
            retention: self.retention,
        };

        let terminal = match self
            .workflow
            .extract(&job.source_url, job.chunk_duration, &channel)
            .await
        {
            Ok(output) => {
                tracing::info!(
                    job_id = %job_id,
                    entries = output.tracklist.len(),
                    elapsed_seconds = job.elapsed_seconds(),
                    output = %output.output_location.display(),
                    "Extraction job completed"
                );
                MixidEvent::JobCompleted {
                    job_id,
                    tracklist: output.tracklist,
                    output_location: output.output_location.display().to_string(),
                    timestamp: chrono::Utc::now(),
                }
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Extraction job failed");
                *self.last_error.write().await = Some(e.to_string());
                MixidEvent::JobFailed {
                    job_id,
                    error: e.to_string(),
                    timestamp: chrono::Utc::now(),
                }
            }
        };

        channel.finish(terminal).await;
    }

    /// History so far plus a receiver for the job's remaining events
    ///
    /// For a finished job the history already ends with the terminal event
    /// and the receiver is closed. `None` if the job never existed or its
    /// retention has run out.
    pub async fn subscribe(
        &self,
        job_id: Uuid,
    ) -> Option<(Vec<MixidEvent>, mpsc::UnboundedReceiver<MixidEvent>)> {
        let mut registry = self.registry.write().await;
        let record = registry
            .get_mut(&job_id)
            .filter(|record| !record.is_expired(self.retention.period, Instant::now()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        if record.finished_at.is_none() {
            record.subscribers.push(tx);
        }
        Some((record.history.clone(), rx))
    }

    /// Current status of a running or recently finished job
    pub async fn get(&self, job_id: Uuid) -> Option<JobStatus> {
        self.registry
            .read()
            .await
            .get(&job_id)
            .filter(|record| !record.is_expired(self.retention.period, Instant::now()))
            .map(JobRecord::status)
    }

    /// In-flight jobs, oldest first
    pub async fn active_jobs(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self
            .registry
            .read()
            .await
            .values()
            .filter(|record| record.finished_at.is_none())
            .map(|record| record.job.clone())
            .collect();
        jobs.sort_by_key(|job| job.started_at);
        jobs
    }

    /// Message of the most recent failed job
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }
}

/// Event publisher for one job
struct JobChannel {
    job_id: Uuid,
    registry: JobRegistry,
    event_bus: EventBus,
    retention: Retention,
}

impl JobChannel {
    async fn emit(&self, event: MixidEvent) {
        let mut registry = self.registry.write().await;
        if let Some(record) = registry.get_mut(&self.job_id) {
            record.publish(&event);
        }
        self.event_bus.emit_lossy(event);
    }

    /// Publish the terminal event and close the job's subscriber channels
    async fn finish(&self, event: MixidEvent) {
        let mut registry = self.registry.write().await;
        if let Some(record) = registry.get_mut(&self.job_id) {
            record.publish(&event);
            record.subscribers.clear();
            record.finished_at = Some(Instant::now());
        }
        self.retention.prune(&mut registry, Instant::now());
        self.event_bus.emit_lossy(event);
        tracing::debug!(job_id = %self.job_id, "Job finished, kept for replay");
    }
}

#[async_trait::async_trait]
impl ProgressSink for JobChannel {
    async fn report(&self, message: &str, progress: f64) {
        tracing::info!(
            job_id = %self.job_id,
            progress = format!("{:.1}", progress),
            "{}",
            message
        );
        self.emit(MixidEvent::JobProgress {
            job_id: self.job_id,
            message: message.to_string(),
            progress,
            timestamp: chrono::Utc::now(),
        })
        .await;
    }
}
