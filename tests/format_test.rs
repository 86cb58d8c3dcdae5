//! Unit tests for the notification formatter.

use chrono::{TimeZone, Utc};
use healthwatch::classify::classify;
use healthwatch::diff::SUMMARY_THRESHOLD;
use healthwatch::model::{ChangeEntry, EventId, EventRecord, Status};
use healthwatch::notify::Severity;
use healthwatch::notify::format::{Formatter, MAX_BODY_LEN, TRUNCATION_MARKER};

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

fn entry(prior: Option<EventRecord>, new: EventRecord) -> ChangeEntry {
    ChangeEntry {
        seq: 1,
        id: new.id.clone(),
        prior,
        new,
    }
}

fn render(prior: Option<EventRecord>, new: EventRecord) -> Option<healthwatch::notify::Message> {
    let e = entry(prior, new);
    let classification = classify(&e);
    Formatter::default().render(&e, &classification)
}

// ---------------------------------------------------------------------------
// Created
// ---------------------------------------------------------------------------

#[test]
fn created_message_has_identity_title_and_full_body() {
    let message = render(None, record()).expect("created should render");

    assert!(message.title.contains("abc123"), "title: {}", message.title);
    assert!(message.title.contains("NEW"));
    assert!(message.body.contains("Increased API error rates"));
    assert!(message.body.contains("us-east-1"));
    assert_eq!(message.severity, Severity::Issue);
}

#[test]
fn created_closed_event_is_historical() {
    let mut rec = record();
    rec.status = Status::Closed;
    rec.end_time = Some(Utc.with_ymd_and_hms(2026, 3, 1, 13, 0, 0).unwrap());

    let message = render(None, rec).unwrap();
    assert!(message.title.contains("RESOLVED"));
    assert_eq!(message.severity, Severity::Historical);
}

// ---------------------------------------------------------------------------
// Modified
// ---------------------------------------------------------------------------

#[test]
fn status_change_renders_single_diff_line() {
    let mut new = record();
    new.status = Status::Closed;

    let message = render(Some(record()), new).unwrap();
    assert_eq!(message.body, "status: open → closed\n");
    assert!(message.title.contains("WAS RESOLVED"));
    assert_eq!(message.severity, Severity::Resolved);
}

#[test]
fn reopened_event_is_an_issue_again() {
    let mut prior = record();
    prior.status = Status::Closed;
    let new = record(); // open

    let message = render(Some(prior), new).unwrap();
    assert!(message.title.contains("WAS REOPENED"));
    assert_eq!(message.severity, Severity::Issue);
}

#[test]
fn ongoing_update_is_a_change() {
    let mut new = record();
    new.region = "us-west-2".to_string();

    let message = render(Some(record()), new).unwrap();
    assert!(message.title.contains("WAS UPDATED"));
    assert_eq!(message.severity, Severity::Change);
    assert!(message.body.contains("region: us-east-1 → us-west-2"));
}

#[test]
fn suppressed_renders_nothing() {
    assert!(render(Some(record()), record()).is_none());
}

// ---------------------------------------------------------------------------
// Description handling
// ---------------------------------------------------------------------------

#[test]
fn short_description_change_shows_full_before_and_after() {
    let mut new = record();
    new.description = "Error rates recovering".to_string();

    let message = render(Some(record()), new).unwrap();
    assert!(message.body.contains("Increased API error rates"));
    assert!(message.body.contains("Error rates recovering"));
}

#[test]
fn long_description_change_is_summarized() {
    let prior_rec = {
        let mut r = record();
        r.description = format!("unchanged preamble\n{}\n", "x".repeat(50));
        r
    };
    let mut new = record();
    // Well past the threshold on the new side, one changed line.
    new.description = format!(
        "unchanged preamble\n{}\n{}\n",
        "x".repeat(50),
        "y".repeat(SUMMARY_THRESHOLD * 14)
    );

    let message = render(Some(prior_rec), new).unwrap();
    assert!(message.body.contains("description changed:"));
    // The unchanged line never appears in a summary.
    assert!(!message.body.contains("unchanged preamble"));
    // And the whole body respects the bound even for a 6000-char change.
    assert!(message.body.chars().count() <= MAX_BODY_LEN);
}

// ---------------------------------------------------------------------------
// Truncation
// ---------------------------------------------------------------------------

#[test]
fn overlong_body_is_truncated_with_marker() {
    let formatter = Formatter::with_max_body_len(120);
    let mut rec = record();
    rec.description = "d".repeat(500);

    let e = entry(None, rec);
    let classification = classify(&e);
    let message = formatter.render(&e, &classification).unwrap();

    assert_eq!(message.body.chars().count(), 120);
    assert!(message.body.ends_with(TRUNCATION_MARKER));
}

#[test]
fn body_within_bound_is_untouched() {
    let message = render(None, record()).unwrap();
    assert!(message.body.chars().count() <= MAX_BODY_LEN);
    assert!(!message.body.contains(TRUNCATION_MARKER));
}
