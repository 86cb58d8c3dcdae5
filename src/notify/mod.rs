//! Notification rendering and delivery.
//!
//! `format` turns a classification into a bounded, human-readable
//! [`Message`]; `dispatch` delivers it to the configured webhook channel
//! with a failure-notice fallback.

pub mod dispatch;
pub mod format;

use serde::{Deserialize, Serialize};

use crate::model::EventId;

/// A rendered notification, ready for delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Identity of the event this message describes. Carried for failure
    /// notices and log correlation, not rendered by itself.
    pub id: EventId,
    pub title: String,
    /// Bounded-length body. Overlong content is truncated with a visible
    /// marker, never silently dropped.
    pub body: String,
    pub severity: Severity,
    /// Structured metadata shown alongside the body (region, timestamps).
    pub fields: Vec<MetaField>,
}

/// One structured metadata field attached to a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaField {
    pub name: String,
    pub value: String,
}

/// Visual severity of a notification, mapped to an embed color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// New or reopened issue.
    Issue,
    /// Open issue now closed out.
    Resolved,
    /// Ongoing issue updated with new info.
    Change,
    /// Closed issue, info for posterity only.
    Historical,
}

impl Severity {
    /// Embed color code for the webhook payload.
    pub fn color(self) -> u32 {
        match self {
            Severity::Issue => 0xFF0000,      // red
            Severity::Resolved => 0x00FF00,   // green
            Severity::Change => 0xFFBF00,     // amber
            Severity::Historical => 0x0096FF, // blue
        }
    }
}
