//! Extraction workflow integration tests
//!
//! Full runs over fake collaborators: tracklist shape, fatal short-circuit,
//! dedup and merge rules, link pass, progress checkpoints, run-level errors.

mod helpers;

use helpers::{fake_workflow, FakeSource, RecordingLinks, RecordingSink, ScriptedRecognizer};
use mixid_common::{TrackEntry, TrackStatus, Tracklist};
use mixid_extract::models::RecognitionOutcome;
use mixid_extract::types::ExtractionError;
use std::sync::Arc;

fn identified(artist: &str, title: &str) -> RecognitionOutcome {
    RecognitionOutcome::identified(artist, title)
}

async fn run(
    outcomes: Vec<RecognitionOutcome>,
    segments: u32,
) -> (Tracklist, Arc<ScriptedRecognizer>, Arc<RecordingLinks>, RecordingSink) {
    let dir = tempfile::tempdir().unwrap();
    let recognizer = Arc::new(ScriptedRecognizer::new(outcomes));
    let links = Arc::new(RecordingLinks::default());
    let sink = RecordingSink::default();

    let workflow = fake_workflow(
        FakeSource::ok(),
        segments,
        Arc::clone(&recognizer),
        Arc::clone(&links),
        dir.path(),
    );
    let output = workflow
        .extract("https://soundcloud.com/dj/mix", 10, &sink)
        .await
        .unwrap();

    (output.tracklist, recognizer, links, sink)
}

#[tokio::test]
async fn test_end_to_end_merge_and_persist() {
    let dir = tempfile::tempdir().unwrap();
    let recognizer = Arc::new(ScriptedRecognizer::new(vec![
        identified("A", "X"),
        identified("A", "X"),
        RecognitionOutcome::NotFound,
    ]));
    let links = Arc::new(RecordingLinks::default());
    let sink = RecordingSink::default();

    let workflow = fake_workflow(FakeSource::ok(), 3, recognizer, links, dir.path());
    let output = workflow
        .extract("https://soundcloud.com/dj/mix", 10, &sink)
        .await
        .unwrap();

    let mut expected_first = TrackEntry::identified(1, [0, 20], "A", "X");
    expected_first.external_link = Some(RecordingLinks::link_for("X"));
    assert_eq!(
        output.tracklist,
        vec![expected_first, TrackEntry::not_found(2, [20, 30])]
    );

    // Persisted file holds the same tracklist
    assert!(output.output_location.starts_with(dir.path()));
    let saved: Tracklist =
        serde_json::from_str(&std::fs::read_to_string(&output.output_location).unwrap()).unwrap();
    assert_eq!(saved, output.tracklist);
}

#[tokio::test]
async fn test_progress_checkpoints() {
    let (_, _, _, sink) = run(
        vec![identified("A", "X"), identified("B", "Y"), identified("C", "Z")],
        3,
    )
    .await;

    let reports = sink.reports();
    let messages: Vec<&str> = reports.iter().map(|(m, _)| m.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Starting extraction process...",
            "Downloading track from source...",
            "Track downloaded successfully. Splitting into 10s chunks...",
            "Created 3 chunks. Starting track identification...",
            "Identifying chunk 1/3...",
            "Identifying chunk 2/3...",
            "Identifying chunk 3/3...",
            "Merging sequential identical tracks...",
            "Searching for video links...",
            "Extraction complete! Found 3 tracks.",
        ]
    );

    let percentages: Vec<f64> = reports.iter().map(|(_, p)| *p).collect();
    assert_eq!(percentages[..4], [0.0, 10.0, 20.0, 30.0]);
    assert!((percentages[5] - (30.0 + 50.0 / 3.0)).abs() < 1e-9);
    assert_eq!(percentages[7..], [85.0, 90.0, 100.0]);
    assert!(percentages.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_first_segment_fatal_short_circuits() {
    let dir = tempfile::tempdir().unwrap();
    let recognizer = Arc::new(ScriptedRecognizer::new(vec![
        RecognitionOutcome::FatalError {
            message: "Limit exceeded".to_string(),
            code: Some(3003),
        },
    ]));
    let links = Arc::new(RecordingLinks::default());
    let sink = RecordingSink::default();

    let workflow = fake_workflow(
        FakeSource::ok(),
        50,
        Arc::clone(&recognizer),
        Arc::clone(&links),
        dir.path(),
    );
    let output = workflow
        .extract("https://soundcloud.com/dj/mix", 10, &sink)
        .await
        .unwrap();

    assert_eq!(output.tracklist.len(), 1);
    let entry = &output.tracklist[0];
    assert_eq!(entry.status, TrackStatus::FatalError);
    assert_eq!(entry.order, 1);
    assert_eq!(entry.chunk_seconds, [0, 10]);
    assert_eq!(entry.error.as_deref(), Some("Limit exceeded"));

    assert_eq!(recognizer.calls(), 1);
    assert!(links.lookups().is_empty());
    // Fatal tracklist is still saved
    assert!(output.output_location.exists());

    let (message, progress) = sink.last().unwrap();
    assert_eq!(message, "FATAL: Credential or API error detected. Limit exceeded");
    assert_eq!(progress, 100.0);
    assert!(!sink
        .reports()
        .iter()
        .any(|(m, _)| m.starts_with("Extraction complete")));
}

#[tokio::test]
async fn test_credential_message_on_first_segment_is_fatal() {
    let (tracklist, recognizer, _, _) = run(
        vec![RecognitionOutcome::error("Missing/Invalid Access Key")],
        5,
    )
    .await;

    assert_eq!(tracklist.len(), 1);
    assert_eq!(tracklist[0].status, TrackStatus::FatalError);
    assert_eq!(recognizer.calls(), 1);
}

#[tokio::test]
async fn test_late_fatal_code_becomes_error_entry() {
    let (tracklist, recognizer, _, _) = run(
        vec![
            identified("A", "X"),
            RecognitionOutcome::FatalError {
                message: "Invalid Access Key".to_string(),
                code: Some(3001),
            },
            identified("B", "Y"),
        ],
        3,
    )
    .await;

    assert_eq!(recognizer.calls(), 3);
    let statuses: Vec<TrackStatus> = tracklist.iter().map(|e| e.status).collect();
    assert_eq!(
        statuses,
        vec![TrackStatus::Ok, TrackStatus::Error, TrackStatus::Ok]
    );
    assert_eq!(tracklist[1].error.as_deref(), Some("Invalid Access Key"));
}

#[tokio::test]
async fn test_non_adjacent_repeat_is_duplicate() {
    let (tracklist, _, _, _) = run(
        vec![
            identified("A", "X"),
            RecognitionOutcome::NotFound,
            identified("A", "X"),
        ],
        3,
    )
    .await;

    let statuses: Vec<TrackStatus> = tracklist.iter().map(|e| e.status).collect();
    assert_eq!(
        statuses,
        vec![
            TrackStatus::Ok,
            TrackStatus::NotFound,
            TrackStatus::DuplicateOrUnknown
        ]
    );
    assert!(tracklist[2].artist.is_none());
}

#[tokio::test]
async fn test_links_only_for_ok_entries() {
    let (tracklist, _, links, _) = run(
        vec![
            identified("A", "X"),
            RecognitionOutcome::NotFound,
            RecognitionOutcome::error("connection reset"),
            identified("A", "X"),
            identified("B", "Y"),
        ],
        5,
    )
    .await;

    assert_eq!(
        links.lookups(),
        vec![
            ("A".to_string(), "X".to_string()),
            ("B".to_string(), "Y".to_string())
        ]
    );
    for entry in &tracklist {
        assert_eq!(entry.external_link.is_some(), entry.status == TrackStatus::Ok);
    }
}

#[tokio::test]
async fn test_orders_are_contiguous_after_merge() {
    let (tracklist, _, _, _) = run(
        vec![
            identified("A", "X"),
            identified("A", "X"),
            identified("A", "X"),
            RecognitionOutcome::NotFound,
            identified("B", "Y"),
            identified("B", "Y"),
            RecognitionOutcome::error("timeout"),
            identified("", "Nameless"),
        ],
        8,
    )
    .await;

    let orders: Vec<u32> = tracklist.iter().map(|e| e.order).collect();
    assert_eq!(orders, (1..=tracklist.len() as u32).collect::<Vec<_>>());
    assert_eq!(tracklist.len(), 5);
    assert_eq!(tracklist[0].chunk_seconds, [0, 30]);
    assert_eq!(tracklist[2].chunk_seconds, [40, 60]);
    assert_eq!(tracklist[4].status, TrackStatus::DuplicateOrUnknown);
}

#[tokio::test]
async fn test_download_failure_is_run_error() {
    let dir = tempfile::tempdir().unwrap();
    let recognizer = Arc::new(ScriptedRecognizer::new(vec![]));
    let sink = RecordingSink::default();

    let workflow = fake_workflow(
        FakeSource::failing("scdl exited with 1"),
        3,
        Arc::clone(&recognizer),
        Arc::new(RecordingLinks::default()),
        dir.path(),
    );
    let err = workflow
        .extract("https://soundcloud.com/dj/mix", 10, &sink)
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractionError::Download(_)));
    assert_eq!(recognizer.calls(), 0);
    let (message, progress) = sink.last().unwrap();
    assert_eq!(
        message,
        "Error occurred: Failed to download track: scdl exited with 1"
    );
    assert_eq!(progress, 100.0);
    // Nothing persisted
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_zero_segments_is_run_error() {
    let dir = tempfile::tempdir().unwrap();
    let workflow = fake_workflow(
        FakeSource::ok(),
        0,
        Arc::new(ScriptedRecognizer::new(vec![])),
        Arc::new(RecordingLinks::default()),
        dir.path(),
    );

    let err = workflow
        .extract("https://soundcloud.com/dj/mix", 10, &RecordingSink::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractionError::NoSegments));
}

#[tokio::test]
async fn test_zero_chunk_duration_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let workflow = fake_workflow(
        FakeSource::ok(),
        3,
        Arc::new(ScriptedRecognizer::new(vec![])),
        Arc::new(RecordingLinks::default()),
        dir.path(),
    );

    let err = workflow
        .extract("https://soundcloud.com/dj/mix", 0, &RecordingSink::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractionError::InvalidInput(_)));
}
