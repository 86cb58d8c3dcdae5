//! Field-level diffing of event record snapshots.
//!
//! [`diff_records`] is a pure function: it walks the fixed schema in
//! declaration order and reports every field whose rendered value differs.
//! Long description changes are condensed by a pluggable
//! [`SummarizeChange`] strategy so notifications stay readable.

use similar::{ChangeTag, TextDiff};

use crate::model::{EventRecord, FieldName};

/// Per-side length at or under which the formatter shows a full
/// before/after description instead of a span summary. Tunable.
pub const SUMMARY_THRESHOLD: usize = 400;

/// One attribute whose value differs between prior and new snapshot.
///
/// `None` is the explicit absent marker: a field that was set and is now
/// absent appears with `new: None` (field cleared).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: FieldName,
    pub prior: Option<String>,
    pub new: Option<String>,
}

/// Compare two snapshots sharing an identity and return the changed fields
/// in schema order. Equal fields never appear; equality is exact.
pub fn diff_records(prior: &EventRecord, new: &EventRecord) -> Vec<FieldChange> {
    FieldName::ALL
        .iter()
        .filter_map(|&field| {
            let before = prior.field_value(field);
            let after = new.field_value(field);
            if before == after {
                None
            } else {
                Some(FieldChange {
                    field,
                    prior: before,
                    new: after,
                })
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Description summarization
// ---------------------------------------------------------------------------

/// Strategy for condensing a long free-text change into a short summary.
///
/// The formatter consults this when either side of a description change
/// exceeds [`SUMMARY_THRESHOLD`]; swapping the strategy touches neither the
/// classifier nor the dispatcher.
pub trait SummarizeChange {
    fn summarize(&self, prior: &str, new: &str) -> String;
}

/// Default summarizer: a line-level span diff.
///
/// Emits only added and removed lines, prefixed `+ ` / `- `, in document
/// order. Unchanged lines are dropped entirely, which is what keeps a
/// 6000-character description change down to the few lines that moved.
#[derive(Debug, Default)]
pub struct SpanDiff;

impl SummarizeChange for SpanDiff {
    fn summarize(&self, prior: &str, new: &str) -> String {
        let diff = TextDiff::from_lines(prior, new);
        let mut out = String::new();
        for change in diff.iter_all_changes() {
            let prefix = match change.tag() {
                ChangeTag::Equal => continue,
                ChangeTag::Delete => "- ",
                ChangeTag::Insert => "+ ",
            };
            let line = change.value().trim_end_matches('\n');
            if line.trim().is_empty() {
                continue;
            }
            out.push_str(prefix);
            out.push_str(line);
            out.push('\n');
        }
        if out.is_empty() {
            // Whitespace-only difference. Say so rather than emit nothing.
            out.push_str("(whitespace-only change)\n");
        }
        out
    }
}
