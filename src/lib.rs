//! # healthwatch
//!
//! Cloud health-event monitor. Polls the provider's health API, persists
//! event records in Postgres with an expiry horizon, detects new and changed
//! events through a change-capture feed, and posts human-readable diffs to a
//! chat webhook.
//!
//! The store is the single source of truth for "what changed" — a replayed
//! feed entry whose snapshots are equal classifies as suppressed and never
//! re-notifies.

pub mod classify;
pub mod config;
pub mod diff;
pub mod error;
pub mod ingest;
pub mod model;
pub mod notify;
pub mod pipeline;
pub mod store;
pub mod telemetry;
