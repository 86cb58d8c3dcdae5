//! Core data model.
//!
//! An event record is one provider-reported status event at a point in
//! observation. It has a stable identity (the provider ARN) and a fixed,
//! closed set of fields; a new write with the same identity replaces the
//! prior version.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Event Record
// ---------------------------------------------------------------------------

/// One provider health event, as persisted in the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Stable unique identity assigned by the provider. Never changes
    /// across revisions of the same event.
    pub id: EventId,

    /// Whether the event is currently open or has been closed out.
    pub status: Status,

    /// Affected service (e.g. "EC2").
    pub service: String,

    /// Affected region (e.g. "us-east-1").
    pub region: String,

    /// Provider event type code (e.g. "AWS_EC2_OPERATIONAL_ISSUE").
    pub event_type_code: String,

    /// Event type category. Ingestion only admits "issue" events.
    pub event_type_category: String,

    /// Event scope. Ingestion only admits "PUBLIC" events.
    pub scope: String,

    /// Latest free-text description from the provider. Can run to several
    /// thousand characters.
    pub description: String,

    pub start_time: DateTime<Utc>,
    pub last_updated_time: DateTime<Utc>,
    /// Set once the provider closes the event.
    pub end_time: Option<DateTime<Utc>>,
}

impl EventRecord {
    /// Decode a stored JSON snapshot back into a typed record.
    ///
    /// Validation happens here, at the store boundary — downstream
    /// components only ever see well-formed records.
    pub fn from_snapshot(snapshot: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(snapshot.clone()).map_err(Error::Json)
    }

    /// Encode this record as a JSON snapshot for storage.
    pub fn to_snapshot(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(Error::Json)
    }

    /// The value of one schema field, rendered as display text.
    /// `None` means the field is absent (only `end_time` can be).
    pub fn field_value(&self, field: FieldName) -> Option<String> {
        match field {
            FieldName::Status => Some(self.status.to_string()),
            FieldName::Service => Some(self.service.clone()),
            FieldName::Region => Some(self.region.clone()),
            FieldName::EventTypeCode => Some(self.event_type_code.clone()),
            FieldName::EventTypeCategory => Some(self.event_type_category.clone()),
            FieldName::Scope => Some(self.scope.clone()),
            FieldName::Description => Some(self.description.clone()),
            FieldName::StartTime => Some(self.start_time.to_rfc3339()),
            FieldName::LastUpdatedTime => Some(self.last_updated_time.to_rfc3339()),
            FieldName::EndTime => self.end_time.map(|t| t.to_rfc3339()),
        }
    }
}

/// Newtype for event identities (provider ARNs).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl EventId {
    /// Short display form: the final path segment of the ARN.
    pub fn short(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Event status as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Open,
    Closed,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Status::Open => "open",
            Status::Closed => "closed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "open" => Ok(Status::Open),
            "closed" => Ok(Status::Closed),
            other => Err(Error::Other(format!("unknown status code: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Field schema
// ---------------------------------------------------------------------------

/// The closed set of diffable record fields.
///
/// `ALL` fixes the deterministic field order used by the differ and the
/// formatter; it is declaration order, not hash or insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    Status,
    Service,
    Region,
    EventTypeCode,
    EventTypeCategory,
    Scope,
    Description,
    StartTime,
    LastUpdatedTime,
    EndTime,
}

impl FieldName {
    pub const ALL: [FieldName; 10] = [
        FieldName::Status,
        FieldName::Service,
        FieldName::Region,
        FieldName::EventTypeCode,
        FieldName::EventTypeCategory,
        FieldName::Scope,
        FieldName::Description,
        FieldName::StartTime,
        FieldName::LastUpdatedTime,
        FieldName::EndTime,
    ];

    /// Short wire/display name, matching the serde rename.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldName::Status => "status",
            FieldName::Service => "service",
            FieldName::Region => "region",
            FieldName::EventTypeCode => "event_type_code",
            FieldName::EventTypeCategory => "event_type_category",
            FieldName::Scope => "scope",
            FieldName::Description => "description",
            FieldName::StartTime => "start_time",
            FieldName::LastUpdatedTime => "last_updated_time",
            FieldName::EndTime => "end_time",
        }
    }

    /// Human label used in rendered notifications.
    pub fn label(self) -> &'static str {
        match self {
            FieldName::Status => "Status",
            FieldName::Service => "Service",
            FieldName::Region => "Region",
            FieldName::EventTypeCode => "Event Type",
            FieldName::EventTypeCategory => "Event Type Category",
            FieldName::Scope => "Event Scope",
            FieldName::Description => "Description",
            FieldName::StartTime => "Start Time",
            FieldName::LastUpdatedTime => "Last Updated",
            FieldName::EndTime => "End Time",
        }
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Change-Feed Entry
// ---------------------------------------------------------------------------

/// One store mutation, as read from the change feed.
///
/// `prior` is absent on the first write for an identity. Entries for a
/// given identity arrive in commit order (by `seq`).
#[derive(Debug, Clone)]
pub struct ChangeEntry {
    /// Feed sequence number. Monotonic across the whole feed.
    pub seq: i64,
    pub id: EventId,
    pub prior: Option<EventRecord>,
    pub new: EventRecord,
}
