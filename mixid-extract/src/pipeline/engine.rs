//! Tracklist engine
//!
//! Drives recognition over the segments of one mix and turns the outcomes into
//! a merged tracklist:
//! 1. Recognize each segment in order, one call at a time
//! 2. Abort with a single `fatal error` entry if the first segment shows a
//!    credential failure
//! 3. Classify every outcome (seen set, duplicates)
//! 4. Merge adjacent identical spans
//! 5. Resolve video links for identified entries

use super::classify::{fatal_tracklist, Classifier};
use super::merge::merge_spans;
use super::progress;
use crate::models::{RecognitionOutcome, Segment};
use crate::types::{LinkResolver, ProgressSink, Recognizer};
use mixid_common::{TrackEntry, Tracklist};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Recognition + merge pipeline for one run
pub struct TracklistEngine {
    recognizer: Arc<dyn Recognizer>,
    link_resolver: Arc<dyn LinkResolver>,
    chunk_duration: u32,
}

impl TracklistEngine {
    pub fn new(
        recognizer: Arc<dyn Recognizer>,
        link_resolver: Arc<dyn LinkResolver>,
        chunk_duration: u32,
    ) -> Self {
        Self {
            recognizer,
            link_resolver,
            chunk_duration,
        }
    }

    /// Produce the tracklist for `segments`
    ///
    /// Recognizer failures never abort the run except on the first segment;
    /// they become `error` entries. Each segment's audio is discarded right
    /// after its recognition call.
    pub async fn run(&self, segments: &[Segment], sink: &dyn ProgressSink) -> Tracklist {
        let total = segments.len();
        let mut classifier = Classifier::new(self.chunk_duration);
        let mut entries: Vec<TrackEntry> = Vec::with_capacity(total);

        for (position, segment) in segments.iter().enumerate() {
            sink.report(
                &format!("Identifying chunk {}/{}...", position + 1, total),
                progress::segment_progress(position, total),
            )
            .await;

            let outcome = self.recognizer.recognize(segment).await;
            segment.discard();

            if position == 0 && outcome.indicates_credential_failure() {
                let message = outcome.error_message().unwrap_or_default().to_string();
                warn!(error = %message, "Credential or API error detected in first chunk, stopping");
                sink.report(
                    &format!("FATAL: Credential or API error detected. {}", message),
                    progress::FINISHED,
                )
                .await;
                return fatal_tracklist(self.chunk_duration, &message);
            }

            log_outcome(segment, &outcome);
            entries.push(classifier.classify(segment.index, outcome));
        }

        debug!(
            segments = total,
            distinct_tracks = classifier.distinct_tracks(),
            "Recognition pass complete"
        );

        sink.report("Merging sequential identical tracks...", progress::MERGING).await;
        let mut tracklist = merge_spans(entries);

        sink.report("Searching for video links...", progress::RESOLVING_LINKS).await;
        self.resolve_links(&mut tracklist).await;

        tracklist
    }

    /// Attach a video link to every `ok` entry; other entries are skipped
    async fn resolve_links(&self, tracklist: &mut Tracklist) {
        for entry in tracklist.iter_mut() {
            let link = match entry.identity() {
                Some((artist, title)) => self.link_resolver.resolve(artist, title).await,
                None => continue,
            };
            if link.is_none() {
                debug!(order = entry.order, "No video link found");
            }
            entry.external_link = link;
        }
    }
}

fn log_outcome(segment: &Segment, outcome: &RecognitionOutcome) {
    match outcome {
        RecognitionOutcome::Identified { artist, title } => {
            info!(segment = segment.index, "Identified: {} - {}", artist, title)
        }
        RecognitionOutcome::NotFound => {
            debug!(segment = segment.index, "No track found")
        }
        RecognitionOutcome::Error { message, code }
        | RecognitionOutcome::FatalError { message, code } => {
            warn!(segment = segment.index, code = ?code, "Recognition error: {}", message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NoLinks;
    use mixid_common::TrackStatus;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct Scripted(Mutex<Vec<RecognitionOutcome>>);

    #[async_trait::async_trait]
    impl Recognizer for Scripted {
        async fn recognize(&self, _segment: &Segment) -> RecognitionOutcome {
            self.0.lock().unwrap().remove(0)
        }
    }

    struct Silent;

    #[async_trait::async_trait]
    impl ProgressSink for Silent {
        async fn report(&self, _message: &str, _progress: f64) {}
    }

    fn segments(n: u32) -> Vec<Segment> {
        (0..n)
            .map(|i| {
                Segment::new(
                    i,
                    f64::from(i) * 10.0,
                    f64::from(i + 1) * 10.0,
                    PathBuf::from(format!("/nonexistent/segment_{:05}.wav", i)),
                )
            })
            .collect()
    }

    fn engine(outcomes: Vec<RecognitionOutcome>) -> TracklistEngine {
        TracklistEngine::new(Arc::new(Scripted(Mutex::new(outcomes))), Arc::new(NoLinks), 10)
    }

    #[tokio::test]
    async fn test_end_to_end_merge() {
        let tracklist = engine(vec![
            RecognitionOutcome::identified("A", "X"),
            RecognitionOutcome::identified("A", "X"),
            RecognitionOutcome::NotFound,
        ])
        .run(&segments(3), &Silent)
        .await;

        assert_eq!(
            tracklist,
            vec![
                TrackEntry::identified(1, [0, 20], "A", "X"),
                TrackEntry::not_found(2, [20, 30]),
            ]
        );
    }

    #[tokio::test]
    async fn test_first_segment_fatal_stops_run() {
        let tracklist = engine(vec![RecognitionOutcome::Error {
            message: "Missing/Invalid Access Key".to_string(),
            code: None,
        }])
        .run(&segments(3), &Silent)
        .await;

        assert_eq!(tracklist.len(), 1);
        assert_eq!(tracklist[0].status, TrackStatus::FatalError);
        assert_eq!(tracklist[0].error.as_deref(), Some("Missing/Invalid Access Key"));
    }

    #[tokio::test]
    async fn test_empty_segments_yield_empty_tracklist() {
        let tracklist = engine(vec![]).run(&[], &Silent).await;
        assert!(tracklist.is_empty());
    }
}
