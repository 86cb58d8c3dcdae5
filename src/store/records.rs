//! Record operations: put with expiry and change capture, get, feed
//! consumption, expired-row purge.
//!
//! `put` is the only writer. Inside one transaction it reads the prior
//! snapshot, upserts the record, appends a `(prior, new)` pair to the
//! change feed, and fires a NOTIFY — so feed entries are in commit order
//! and per-identity order for free.

use chrono::{DateTime, Duration, Utc};
use opentelemetry::KeyValue;

use crate::error::{Error, Result};
use crate::model::{ChangeEntry, EventId, EventRecord};
use crate::telemetry::metrics;

/// Postgres NOTIFY channel fired when a feed entry is appended.
pub const FEED_CHANNEL: &str = "record_changed";

/// A raw change-feed row. Snapshots are still JSON here; parsing into
/// typed records happens in [`ChangeRow::into_entry`] so one bad row
/// surfaces as a per-entry error, not a batch failure.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChangeRow {
    pub seq: i64,
    pub identity: String,
    pub prior: Option<serde_json::Value>,
    pub next: serde_json::Value,
    pub committed_at: DateTime<Utc>,
}

impl ChangeRow {
    /// Parse the stored snapshots into a typed entry.
    pub fn into_entry(self) -> Result<ChangeEntry> {
        let new = EventRecord::from_snapshot(&self.next).map_err(|e| Error::MalformedEntry {
            seq: self.seq,
            reason: format!("bad new snapshot: {e}"),
        })?;
        let prior = match self.prior {
            Some(ref snapshot) => {
                Some(
                    EventRecord::from_snapshot(snapshot).map_err(|e| Error::MalformedEntry {
                        seq: self.seq,
                        reason: format!("bad prior snapshot: {e}"),
                    })?,
                )
            }
            None => None,
        };
        if self.identity.is_empty() {
            return Err(Error::MalformedEntry {
                seq: self.seq,
                reason: "missing identity".to_string(),
            });
        }
        Ok(ChangeEntry {
            seq: self.seq,
            id: EventId(self.identity),
            prior,
            new,
        })
    }
}

impl super::Store {
    /// Insert-or-replace a record, stamping its expiry, and append the
    /// change-feed entry. Returns the feed sequence number.
    pub async fn put_record(&self, record: &EventRecord, retention: Duration) -> Result<i64> {
        let snapshot = record.to_snapshot()?;
        let now = Utc::now();
        let expires_at = now + retention;

        let mut tx = self.pool().begin().await?;

        let prior: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT snapshot FROM event_records WHERE identity = $1 FOR UPDATE")
                .bind(&record.id.0)
                .fetch_optional(&mut *tx)
                .await?;

        sqlx::query(
            "INSERT INTO event_records (identity, snapshot, updated_at, expires_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (identity)
             DO UPDATE SET snapshot = $2, updated_at = $3, expires_at = $4",
        )
        .bind(&record.id.0)
        .bind(&snapshot)
        .bind(now)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        let seq: (i64,) = sqlx::query_as(
            "INSERT INTO record_changes (identity, prior, next, committed_at)
             VALUES ($1, $2, $3, $4)
             RETURNING seq",
        )
        .bind(&record.id.0)
        .bind(prior.map(|(s,)| s))
        .bind(&snapshot)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        // NOTIFY is transactional — only fires on commit
        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(FEED_CHANNEL)
            .bind(&record.id.0)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        metrics::store_operations().add(1, &[KeyValue::new("operation", "put")]);
        Ok(seq.0)
    }

    /// Fetch a record by identity. `None` if absent or already reaped.
    pub async fn get_record(&self, id: &EventId) -> Result<Option<EventRecord>> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT snapshot FROM event_records WHERE identity = $1")
                .bind(&id.0)
                .fetch_optional(self.pool())
                .await?;

        metrics::store_operations().add(1, &[KeyValue::new("operation", "get")]);
        row.map(|(snapshot,)| EventRecord::from_snapshot(&snapshot))
            .transpose()
    }

    /// Read up to `limit` pending change-feed rows in commit order.
    ///
    /// Rows stay in the feed until [`ack_change`](Self::ack_change) —
    /// at-least-once consumption; the classifier suppresses replays.
    pub async fn read_changes(&self, limit: i64) -> Result<Vec<ChangeRow>> {
        let rows: Vec<ChangeRow> = sqlx::query_as(
            "SELECT seq, identity, prior, next, committed_at
             FROM record_changes ORDER BY seq LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        metrics::store_operations().add(
            1,
            &[KeyValue::new(
                "operation",
                if rows.is_empty() { "read_empty" } else { "read" },
            )],
        );
        Ok(rows)
    }

    /// Acknowledge one processed feed row, removing it from the feed.
    pub async fn ack_change(&self, seq: i64) -> Result<()> {
        sqlx::query("DELETE FROM record_changes WHERE seq = $1")
            .bind(seq)
            .execute(self.pool())
            .await?;
        metrics::store_operations().add(1, &[KeyValue::new("operation", "ack")]);
        Ok(())
    }

    /// Discard records past their expiry horizon. Emits no feed entries —
    /// passive expiry owes no notification. Returns the reaped count.
    pub async fn purge_expired(&self) -> Result<u64> {
        let purged = sqlx::query("DELETE FROM event_records WHERE expires_at < now()")
            .execute(self.pool())
            .await?
            .rows_affected();
        metrics::store_operations().add(1, &[KeyValue::new("operation", "purge")]);
        Ok(purged)
    }

    /// List stored records, newest first. Operator inspection.
    pub async fn list_records(&self, limit: i64) -> Result<Vec<EventRecord>> {
        let rows: Vec<(serde_json::Value,)> = sqlx::query_as(
            "SELECT snapshot FROM event_records ORDER BY updated_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|(snapshot,)| EventRecord::from_snapshot(snapshot))
            .collect()
    }
}
