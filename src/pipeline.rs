//! The change-detection and diff-notification pipeline.
//!
//! Synchronous batch entry point: drain pending change-feed entries,
//! classify each, render and deliver notifications, acknowledge. Each
//! entry is processed to completion before the next, and failures are
//! isolated per entry — one bad entry never blocks the batch.

use opentelemetry::KeyValue;
use tracing::{Instrument, error, info, warn};
use uuid::Uuid;

use crate::classify::{Classification, classify};
use crate::error::{Error, Result};
use crate::notify::dispatch::{Dispatcher, Transport};
use crate::notify::format::Formatter;
use crate::store::Store;
use crate::store::records::ChangeRow;
use crate::telemetry::entry::{record_outcome, start_entry_span};
use crate::telemetry::metrics;

/// Counts from one batch invocation.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub created: usize,
    pub modified: usize,
    pub suppressed: usize,
    pub malformed: usize,
    pub failed: usize,
}

/// Drains the change feed and turns entries into delivered notifications.
pub struct Pipeline<T: Transport> {
    store: Store,
    formatter: Formatter,
    dispatcher: Dispatcher<T>,
}

impl<T: Transport> Pipeline<T> {
    pub fn new(store: Store, formatter: Formatter, dispatcher: Dispatcher<T>) -> Self {
        Self {
            store,
            formatter,
            dispatcher,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Process up to `limit` pending feed entries.
    ///
    /// Each entry is acknowledged once handled, whatever the outcome:
    /// suppressed and malformed entries have nothing left to do, and a
    /// delivery failure is terminal for its entry (reported, not retried
    /// in-process). A replayed entry whose snapshots are equal classifies
    /// as suppressed, so reprocessing never re-notifies.
    pub async fn process_batch(&self, limit: i64) -> Result<BatchSummary> {
        let invocation = Uuid::new_v4();
        let rows = self.store.read_changes(limit).await?;
        let mut summary = BatchSummary::default();

        for row in rows {
            summary.processed += 1;
            let seq = row.seq;
            match self.process_entry(row, invocation).await {
                Ok(outcome) => match outcome {
                    EntryOutcome::Created => summary.created += 1,
                    EntryOutcome::Modified => summary.modified += 1,
                    EntryOutcome::Suppressed => summary.suppressed += 1,
                },
                Err(Error::MalformedEntry { seq, ref reason }) => {
                    warn!(seq, %reason, "skipping malformed change-feed entry");
                    metrics::entries_classified().add(1, &[KeyValue::new("outcome", "malformed")]);
                    summary.malformed += 1;
                }
                Err(e) => {
                    error!(seq, error = %e, "entry processing failed");
                    metrics::entries_classified().add(1, &[KeyValue::new("outcome", "failed")]);
                    summary.failed += 1;
                }
            }
            // Ack regardless of outcome so a poison entry cannot wedge
            // the feed.
            self.store.ack_change(seq).await?;
        }

        if summary.processed > 0 {
            info!(
                invocation = %invocation,
                processed = summary.processed,
                created = summary.created,
                modified = summary.modified,
                suppressed = summary.suppressed,
                malformed = summary.malformed,
                failed = summary.failed,
                "batch complete"
            );
        }
        Ok(summary)
    }

    async fn process_entry(&self, row: ChangeRow, invocation: Uuid) -> Result<EntryOutcome> {
        let start = std::time::Instant::now();
        let entry = row.into_entry()?;
        let span = start_entry_span(entry.seq, &entry.id);

        async {
            let classification = classify(&entry);
            let outcome = match classification {
                Classification::Created => EntryOutcome::Created,
                Classification::Modified { .. } => EntryOutcome::Modified,
                Classification::Suppressed => EntryOutcome::Suppressed,
            };
            record_outcome(&span, outcome.as_str());
            metrics::entries_classified().add(1, &[KeyValue::new("outcome", outcome.as_str())]);

            // Suppressed terminates here: no message, no dispatch.
            if let Some(message) = self.formatter.render(&entry, &classification) {
                self.dispatcher.dispatch(&message, invocation).await?;
            }

            metrics::operation_duration_ms().record(
                start.elapsed().as_secs_f64() * 1000.0,
                &[KeyValue::new("operation", "entry.process")],
            );
            Ok(outcome)
        }
        .instrument(span.clone())
        .await
    }
}

#[derive(Debug, Clone, Copy)]
enum EntryOutcome {
    Created,
    Modified,
    Suppressed,
}

impl EntryOutcome {
    fn as_str(self) -> &'static str {
        match self {
            EntryOutcome::Created => "created",
            EntryOutcome::Modified => "modified",
            EntryOutcome::Suppressed => "suppressed",
        }
    }
}
