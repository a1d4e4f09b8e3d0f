//! Shared test doubles for the extraction pipeline
//!
//! Each integration test binary uses a subset of these.
#![allow(dead_code)]

pub mod audio_generator;

use mixid_extract::models::{RecognitionOutcome, Segment};
use mixid_extract::pipeline::ExtractionWorkflow;
use mixid_extract::services::TracklistWriter;
use mixid_extract::types::{
    ExtractionError, LinkResolver, MediaSource, ProgressSink, Recognizer, Segmenter,
};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Media source that drops a placeholder file into the scratch directory
#[derive(Default)]
pub struct FakeSource {
    fail_with: Option<String>,
    gate: Option<Arc<Notify>>,
}

impl FakeSource {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            gate: None,
        }
    }

    /// Blocks `fetch` until the returned handle is notified
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        (
            Self {
                fail_with: None,
                gate: Some(Arc::clone(&gate)),
            },
            gate,
        )
    }
}

#[async_trait::async_trait]
impl MediaSource for FakeSource {
    async fn fetch(&self, _source_url: &str, workdir: &Path) -> Result<PathBuf, ExtractionError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(message) = &self.fail_with {
            return Err(ExtractionError::Download(message.clone()));
        }
        let path = workdir.join("mix.mp3");
        tokio::fs::write(&path, b"not really audio").await?;
        Ok(path)
    }
}

/// Segmenter producing `count` full-length segments with placeholder files
pub struct FakeSegmenter {
    pub count: u32,
}

#[async_trait::async_trait]
impl Segmenter for FakeSegmenter {
    async fn split(
        &self,
        _media: &Path,
        chunk_duration: u32,
        scratch_dir: &Path,
    ) -> Result<Vec<Segment>, ExtractionError> {
        let chunk = f64::from(chunk_duration);
        let mut segments = Vec::new();
        for index in 0..self.count {
            let path = scratch_dir.join(format!("segment_{:05}.wav", index));
            std::fs::write(&path, b"RIFF")?;
            segments.push(Segment::new(
                index,
                f64::from(index) * chunk,
                f64::from(index + 1) * chunk,
                path,
            ));
        }
        Ok(segments)
    }
}

/// Recognizer replaying a fixed script; `NotFound` once the script runs out
pub struct ScriptedRecognizer {
    outcomes: Mutex<VecDeque<RecognitionOutcome>>,
    calls: AtomicUsize,
}

impl ScriptedRecognizer {
    pub fn new(outcomes: Vec<RecognitionOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Recognizer for ScriptedRecognizer {
    async fn recognize(&self, _segment: &Segment) -> RecognitionOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(RecognitionOutcome::NotFound)
    }
}

/// Link resolver that records its lookups and always finds a link
#[derive(Default)]
pub struct RecordingLinks {
    lookups: Mutex<Vec<(String, String)>>,
}

impl RecordingLinks {
    pub fn lookups(&self) -> Vec<(String, String)> {
        self.lookups.lock().unwrap().clone()
    }

    pub fn link_for(title: &str) -> String {
        format!("https://www.youtube.com/watch?v={}", title)
    }
}

#[async_trait::async_trait]
impl LinkResolver for RecordingLinks {
    async fn resolve(&self, artist: &str, title: &str) -> Option<String> {
        self.lookups
            .lock()
            .unwrap()
            .push((artist.to_string(), title.to_string()));
        Some(Self::link_for(title))
    }
}

/// Progress sink collecting every checkpoint
#[derive(Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<(String, f64)>>,
}

impl RecordingSink {
    pub fn reports(&self) -> Vec<(String, f64)> {
        self.reports.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<(String, f64)> {
        self.reports.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl ProgressSink for RecordingSink {
    async fn report(&self, message: &str, progress: f64) {
        self.reports
            .lock()
            .unwrap()
            .push((message.to_string(), progress));
    }
}

/// Workflow over fakes, persisting into `output_dir`
pub fn fake_workflow(
    source: FakeSource,
    segments: u32,
    recognizer: Arc<ScriptedRecognizer>,
    links: Arc<RecordingLinks>,
    output_dir: &Path,
) -> ExtractionWorkflow {
    ExtractionWorkflow::new(
        Arc::new(source),
        Arc::new(FakeSegmenter { count: segments }),
        recognizer,
        links,
        TracklistWriter::new(output_dir),
    )
}
