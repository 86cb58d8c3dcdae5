//! Unit tests for the field differ and the span summarizer.

use chrono::{TimeZone, Utc};
use healthwatch::diff::{SpanDiff, SummarizeChange, diff_records};
use healthwatch::model::{EventId, EventRecord, FieldName, Status};

fn record() -> EventRecord {
    EventRecord {
        id: EventId("arn:aws:health:us-east-1::event/EC2/ISSUE/abc123".to_string()),
        status: Status::Open,
        service: "EC2".to_string(),
        region: "us-east-1".to_string(),
        event_type_code: "AWS_EC2_OPERATIONAL_ISSUE".to_string(),
        event_type_category: "issue".to_string(),
        scope: "PUBLIC".to_string(),
        description: "Increased API error rates".to_string(),
        start_time: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        last_updated_time: Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap(),
        end_time: None,
    }
}

// ---------------------------------------------------------------------------
// Field differ
// ---------------------------------------------------------------------------

#[test]
fn identical_snapshots_diff_empty() {
    let a = record();
    let b = a.clone();
    assert!(diff_records(&a, &b).is_empty());
}

#[test]
fn single_field_change_yields_one_entry() {
    let prior = record();
    let mut new = record();
    new.status = Status::Closed;

    let changes = diff_records(&prior, &new);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].field, FieldName::Status);
    assert_eq!(changes[0].prior.as_deref(), Some("open"));
    assert_eq!(changes[0].new.as_deref(), Some("closed"));
}

#[test]
fn cleared_field_gets_absent_marker() {
    let mut prior = record();
    prior.end_time = Some(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap());
    let new = record(); // end_time back to None

    let changes = diff_records(&prior, &new);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].field, FieldName::EndTime);
    assert!(changes[0].prior.is_some());
    assert!(changes[0].new.is_none());
}

#[test]
fn changes_follow_schema_order() {
    let prior = record();
    let mut new = record();
    // Mutate in reverse schema order; output must still be schema order.
    new.description = "Service restored".to_string();
    new.region = "us-west-2".to_string();
    new.status = Status::Closed;

    let changes = diff_records(&prior, &new);
    let fields: Vec<FieldName> = changes.iter().map(|c| c.field).collect();
    assert_eq!(
        fields,
        vec![FieldName::Status, FieldName::Region, FieldName::Description]
    );
}

#[test]
fn diff_is_symmetric_in_coverage() {
    let prior = record();
    let mut new = record();
    new.service = "S3".to_string();

    // Same number of changes in both directions, same field.
    let forward = diff_records(&prior, &new);
    let backward = diff_records(&new, &prior);
    assert_eq!(forward.len(), backward.len());
    assert_eq!(forward[0].field, backward[0].field);
}

// ---------------------------------------------------------------------------
// Span summarizer
// ---------------------------------------------------------------------------

#[test]
fn span_diff_emits_only_changed_lines() {
    let prior = "line one\nline two\nline three\n";
    let new = "line one\nline 2\nline three\n";

    let summary = SpanDiff.summarize(prior, new);
    assert!(summary.contains("- line two"));
    assert!(summary.contains("+ line 2"));
    assert!(!summary.contains("line one"));
    assert!(!summary.contains("line three"));
}

#[test]
fn span_diff_handles_appended_paragraph() {
    let prior = "We are investigating.\n";
    let new = "We are investigating.\nThe issue has been mitigated.\n";

    let summary = SpanDiff.summarize(prior, new);
    assert_eq!(summary, "+ The issue has been mitigated.\n");
}

#[test]
fn span_diff_on_whitespace_only_change_says_so() {
    let summary = SpanDiff.summarize("same text\n", "same text\n\n");
    assert!(summary.contains("whitespace-only"));
}
