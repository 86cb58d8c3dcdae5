//! Change classification.
//!
//! Decides what one change-feed entry means: a creation, a modification,
//! or a no-op to suppress. Stateless across entries — the feed itself
//! carries the ordering, the store carries the history.

use crate::diff::{FieldChange, diff_records};
use crate::model::ChangeEntry;

/// Outcome of classifying one change-feed entry.
#[derive(Debug, Clone)]
pub enum Classification {
    /// First observation of this identity.
    Created,
    /// Seen before, at least one field changed.
    Modified { changes: Vec<FieldChange> },
    /// Seen before, nothing changed. The idempotence guard: a replayed
    /// feed entry lands here and never re-notifies.
    Suppressed,
}

/// Classify one entry.
///
/// Absent prior means Created — the differ is never consulted. Otherwise
/// an empty diff means Suppressed, a non-empty one Modified.
pub fn classify(entry: &ChangeEntry) -> Classification {
    let Some(ref prior) = entry.prior else {
        return Classification::Created;
    };

    let changes = diff_records(prior, &entry.new);
    if changes.is_empty() {
        Classification::Suppressed
    } else {
        Classification::Modified { changes }
    }
}
