//! Change-entry processing span helpers.
//!
//! Provides span creation and classification recording for feed entries
//! flowing through the pipeline.

use tracing::Span;

use crate::model::EventId;

/// Start a span for processing one change-feed entry.
///
/// The `entry.outcome` field is declared empty and can be updated via
/// [`record_outcome`].
pub fn start_entry_span(seq: i64, id: &EventId) -> Span {
    tracing::info_span!(
        "entry.process",
        "entry.seq" = seq,
        "entry.id" = %id,
        "entry.outcome" = tracing::field::Empty,
    )
}

/// Record the classification outcome on the given span.
pub fn record_outcome(span: &Span, outcome: &str) {
    span.record("entry.outcome", outcome);
    span.in_scope(|| {
        tracing::info!(outcome, "entry classified");
    });
}
