//! Notification rendering.
//!
//! Pure transform from a classified change to a [`Message`]: no network,
//! no store access. The body is bounded; overlong content is cut at the
//! bound and marked, never silently dropped.

use crate::classify::Classification;
use crate::diff::{FieldChange, SUMMARY_THRESHOLD, SpanDiff, SummarizeChange};
use crate::model::{ChangeEntry, EventRecord, FieldName, Status};
use crate::notify::{Message, MetaField, Severity};

/// Maximum rendered body length in characters. Keeps headroom under the
/// 4096-character webhook embed description limit.
pub const MAX_BODY_LEN: usize = 3800;

/// Appended when a body is cut at the bound.
pub const TRUNCATION_MARKER: &str = "… [truncated]";

/// Marker rendered for a field with no value on one side of a change.
const ABSENT: &str = "(absent)";

/// Renders classified changes into notification messages.
pub struct Formatter {
    max_body_len: usize,
    summarizer: Box<dyn SummarizeChange + Send + Sync>,
}

impl Default for Formatter {
    fn default() -> Self {
        Self {
            max_body_len: MAX_BODY_LEN,
            summarizer: Box::new(SpanDiff),
        }
    }
}

impl Formatter {
    /// Formatter with a custom body bound. Mostly for tests.
    pub fn with_max_body_len(max_body_len: usize) -> Self {
        Self {
            max_body_len,
            ..Self::default()
        }
    }

    /// Swap the description-change summarization strategy.
    pub fn with_summarizer(mut self, s: Box<dyn SummarizeChange + Send + Sync>) -> Self {
        self.summarizer = s;
        self
    }

    /// Render a classification into a message.
    ///
    /// Suppressed yields `None`: nothing to say, nothing to send.
    pub fn render(&self, entry: &ChangeEntry, classification: &Classification) -> Option<Message> {
        match classification {
            Classification::Created => Some(self.render_created(&entry.new)),
            Classification::Modified { changes } => {
                Some(self.render_modified(entry, changes))
            }
            Classification::Suppressed => None,
        }
    }

    fn render_created(&self, record: &EventRecord) -> Message {
        let (title, severity) = match record.status {
            Status::Open => (
                format!(
                    "NEW: {} {} DETECTED ({})",
                    record.service,
                    event_code_display(record),
                    record.id.short()
                ),
                Severity::Issue,
            ),
            // First observation of an already-closed event: posterity only.
            Status::Closed => (
                format!(
                    "(RESOLVED) {} {} DETECTED ({})",
                    record.service,
                    event_code_display(record),
                    record.id.short()
                ),
                Severity::Historical,
            ),
        };

        let mut body = String::new();
        body.push_str(&format!("SERVICE: {}\n", record.service));
        body.push_str(&format!("REGION: {}\n", record.region));
        body.push_str(&format!("STATUS: {}\n\n", record.status));
        body.push_str(&record.description);

        Message {
            id: record.id.clone(),
            title,
            body: self.truncate(body),
            severity,
            fields: meta_fields(record),
        }
    }

    fn render_modified(&self, entry: &ChangeEntry, changes: &[FieldChange]) -> Message {
        let record = &entry.new;
        let prior_status = entry.prior.as_ref().map(|p| p.status);

        let (verb, severity) = match (prior_status, record.status) {
            (Some(Status::Open), Status::Closed) => ("WAS RESOLVED", Severity::Resolved),
            (Some(Status::Closed), Status::Open) => ("WAS REOPENED", Severity::Issue),
            (Some(Status::Closed), Status::Closed) => ("(RESOLVED)", Severity::Historical),
            _ => ("WAS UPDATED", Severity::Change),
        };
        let title = format!(
            "{} {} {} ({})",
            record.service,
            event_code_display(record),
            verb,
            record.id.short()
        );

        // One line per changed field, in the differ's schema order. The
        // description gets special handling when either side is long.
        let mut body = String::new();
        for change in changes {
            if change.field == FieldName::Description {
                body.push_str(&self.render_description_change(change));
            } else {
                body.push_str(&format!(
                    "{}: {} → {}\n",
                    change.field,
                    change.prior.as_deref().unwrap_or(ABSENT),
                    change.new.as_deref().unwrap_or(ABSENT),
                ));
            }
        }

        Message {
            id: record.id.clone(),
            title,
            body: self.truncate(body),
            severity,
            fields: meta_fields(record),
        }
    }

    fn render_description_change(&self, change: &FieldChange) -> String {
        let prior = change.prior.as_deref().unwrap_or("");
        let new = change.new.as_deref().unwrap_or("");

        if prior.chars().count() <= SUMMARY_THRESHOLD && new.chars().count() <= SUMMARY_THRESHOLD {
            // Short enough to show in full.
            format!("description: {prior} → {new}\n")
        } else {
            format!(
                "description changed:\n{}",
                self.summarizer.summarize(prior, new)
            )
        }
    }

    /// Cut `body` at the bound and append the truncation marker.
    fn truncate(&self, body: String) -> String {
        if body.chars().count() <= self.max_body_len {
            return body;
        }
        let keep = self
            .max_body_len
            .saturating_sub(TRUNCATION_MARKER.chars().count());
        let mut cut: String = body.chars().take(keep).collect();
        cut.push_str(TRUNCATION_MARKER);
        cut
    }
}

/// Event type code with underscores spaced out for readability.
fn event_code_display(record: &EventRecord) -> String {
    record.event_type_code.replace('_', " ")
}

/// Structured metadata shown alongside the body.
fn meta_fields(record: &EventRecord) -> Vec<MetaField> {
    let mut fields = vec![
        MetaField {
            name: FieldName::StartTime.label().to_string(),
            value: record.start_time.to_rfc3339(),
        },
        MetaField {
            name: FieldName::LastUpdatedTime.label().to_string(),
            value: record.last_updated_time.to_rfc3339(),
        },
        MetaField {
            name: FieldName::Region.label().to_string(),
            value: record.region.clone(),
        },
    ];
    if let Some(end) = record.end_time {
        fields.push(MetaField {
            name: FieldName::EndTime.label().to_string(),
            value: end.to_rfc3339(),
        });
    }
    fields
}
