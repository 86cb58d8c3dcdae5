//! Unit tests for change classification.

use chrono::{TimeZone, Utc};
use healthwatch::classify::{Classification, classify};
use healthwatch::model::{ChangeEntry, EventId, EventRecord, FieldName, Status};

fn record() -> EventRecord {
    EventRecord {
        id: EventId("arn:aws:health:eu-west-1::event/RDS/ISSUE/def456".to_string()),
        status: Status::Open,
        service: "RDS".to_string(),
        region: "eu-west-1".to_string(),
        event_type_code: "AWS_RDS_CONNECTIVITY_ISSUE".to_string(),
        event_type_category: "issue".to_string(),
        scope: "PUBLIC".to_string(),
        description: "Elevated connection failures".to_string(),
        start_time: Utc.with_ymd_and_hms(2026, 4, 10, 8, 0, 0).unwrap(),
        last_updated_time: Utc.with_ymd_and_hms(2026, 4, 10, 8, 15, 0).unwrap(),
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

#[test]
fn absent_prior_classifies_as_created() {
    let result = classify(&entry(None, record()));
    assert!(matches!(result, Classification::Created));
}

#[test]
fn equal_snapshots_classify_as_suppressed() {
    let result = classify(&entry(Some(record()), record()));
    assert!(matches!(result, Classification::Suppressed));
}

#[test]
fn changed_snapshot_classifies_as_modified_with_changes() {
    let mut new = record();
    new.status = Status::Closed;
    new.description = "Resolved".to_string();

    match classify(&entry(Some(record()), new)) {
        Classification::Modified { changes } => {
            assert_eq!(changes.len(), 2);
            assert_eq!(changes[0].field, FieldName::Status);
            assert_eq!(changes[1].field, FieldName::Description);
        }
        other => panic!("expected Modified, got {other:?}"),
    }
}

#[test]
fn feed_replay_is_suppressed() {
    // Simulates at-least-once feed delivery: after the store already holds
    // the new value, a replayed entry carries equal snapshots.
    let mut updated = record();
    updated.status = Status::Closed;

    let replay = entry(Some(updated.clone()), updated);
    assert!(matches!(classify(&replay), Classification::Suppressed));
}
