// crates/vmb-testgen-core/src/events/tests.rs
// ============================================================================
// Module: Generation Event Unit Tests
// Description: JSON-line layout and file sink behavior.
// Dependencies: vmb-testgen-core, serde_json, tempfile
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions use panic-based helpers for clarity."
)]

use std::fs;

use serde_json::Value;

use super::FileLogSink;
use super::GenerationEvent;
use super::GenerationEventKind;
use super::GenerationLogSink;
use crate::labels::TestMode;

fn expanded() -> GenerationEvent {
    GenerationEvent::new(GenerationEventKind::DefinitionExpanded {
        description: "Push: one".to_string(),
        modes: vec![TestMode::NonP2sh, TestMode::P2sh32],
        short_ids: vec!["aaaaa".to_string(), "bbbbb".to_string()],
    })
}

#[test]
fn events_flatten_their_tag_and_fields() {
    let value = serde_json::to_value(expanded()).unwrap();
    assert_eq!(value["event"], "definition_expanded");
    assert_eq!(value["modes"], serde_json::json!(["nonP2SH", "P2SH32"]));
    assert!(value["timestamp_ms"].as_u64().unwrap() > 0);
}

#[test]
fn file_sink_appends_one_line_per_event() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    let sink = FileLogSink::new(&path).unwrap();
    sink.record(&expanded());
    sink.record(&GenerationEvent::new(GenerationEventKind::GenerationSummary {
        definitions: 1,
        vectors: 2,
        test_sets: 3,
    }));
    drop(sink);

    let reopened = FileLogSink::new(&path).unwrap();
    reopened.record(&GenerationEvent::new(GenerationEventKind::OutputVerified {
        directory: "out".to_string(),
        artifacts: 4,
        up_to_date: true,
    }));

    let contents = fs::read_to_string(&path).unwrap();
    let events: Vec<Value> =
        contents.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
    assert_eq!(events.len(), 3);
    assert_eq!(events[1]["event"], "generation_summary");
    assert_eq!(events[1]["test_sets"], 3);
    assert_eq!(events[2]["up_to_date"], true);
}
