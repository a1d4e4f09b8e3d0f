//! Extraction workflow
//!
//! One complete run, shared by the web service and the CLI:
//! download → split → recognize/merge/link → persist.
//!
//! All intermediate files live in a per-run scratch directory that is removed
//! when the run ends, whatever the outcome.

use super::classify::is_fatal_tracklist;
use super::engine::TracklistEngine;
use super::progress;
use crate::services::TracklistWriter;
use crate::types::{
    ExtractionError, LinkResolver, MediaSource, ProgressSink, Recognizer, Segmenter,
};
use mixid_common::tracklist::identified_count;
use mixid_common::Tracklist;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct ExtractionOutput {
    pub tracklist: Tracklist,
    /// Persisted JSON file
    pub output_location: PathBuf,
}

/// Collaborators for extraction runs
#[derive(Clone)]
pub struct ExtractionWorkflow {
    source: Arc<dyn MediaSource>,
    segmenter: Arc<dyn Segmenter>,
    recognizer: Arc<dyn Recognizer>,
    link_resolver: Arc<dyn LinkResolver>,
    writer: TracklistWriter,
}

impl ExtractionWorkflow {
    pub fn new(
        source: Arc<dyn MediaSource>,
        segmenter: Arc<dyn Segmenter>,
        recognizer: Arc<dyn Recognizer>,
        link_resolver: Arc<dyn LinkResolver>,
        writer: TracklistWriter,
    ) -> Self {
        Self {
            source,
            segmenter,
            recognizer,
            link_resolver,
            writer,
        }
    }

    /// Run one extraction and persist the tracklist
    ///
    /// A first-segment credential failure is not an error here: it yields the
    /// single-entry `fatal error` tracklist, which is persisted like any other.
    /// Run-level failures report a final "Error occurred" checkpoint before
    /// being returned.
    pub async fn extract(
        &self,
        source_url: &str,
        chunk_duration: u32,
        sink: &dyn ProgressSink,
    ) -> Result<ExtractionOutput, ExtractionError> {
        match self.run_stages(source_url, chunk_duration, sink).await {
            Ok(output) => Ok(output),
            Err(e) => {
                error!(source_url = %source_url, error = %e, "Error in extraction");
                sink.report(&format!("Error occurred: {}", e), progress::FINISHED)
                    .await;
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        source_url: &str,
        chunk_duration: u32,
        sink: &dyn ProgressSink,
    ) -> Result<ExtractionOutput, ExtractionError> {
        if chunk_duration == 0 {
            return Err(ExtractionError::InvalidInput(
                "chunk_duration must be a positive number of seconds".to_string(),
            ));
        }

        sink.report("Starting extraction process...", progress::STARTED)
            .await;

        let scratch = tempfile::Builder::new().prefix("mixid-").tempdir()?;

        sink.report("Downloading track from source...", progress::DOWNLOADING)
            .await;
        let media = self.source.fetch(source_url, scratch.path()).await?;
        info!(path = %media.display(), "Track downloaded");

        sink.report(
            &format!(
                "Track downloaded successfully. Splitting into {}s chunks...",
                chunk_duration
            ),
            progress::SPLITTING,
        )
        .await;
        let segments_dir = scratch.path().join("segments");
        tokio::fs::create_dir_all(&segments_dir).await?;
        let segments = self
            .segmenter
            .split(&media, chunk_duration, &segments_dir)
            .await?;
        if segments.is_empty() {
            return Err(ExtractionError::NoSegments);
        }

        sink.report(
            &format!(
                "Created {} chunks. Starting track identification...",
                segments.len()
            ),
            progress::SEGMENTS_READY,
        )
        .await;

        let engine = TracklistEngine::new(
            Arc::clone(&self.recognizer),
            Arc::clone(&self.link_resolver),
            chunk_duration,
        );
        let tracklist = engine.run(&segments, sink).await;

        let output_location = self.writer.write(&tracklist)?;

        if !is_fatal_tracklist(&tracklist) {
            sink.report(
                &format!(
                    "Extraction complete! Found {} tracks.",
                    identified_count(&tracklist)
                ),
                progress::FINISHED,
            )
            .await;
        }

        Ok(ExtractionOutput {
            tracklist,
            output_location,
        })
    }
}
