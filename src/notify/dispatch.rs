//! Notification delivery.
//!
//! One primary attempt per message. On primary failure, at most one
//! failure-notice attempt to the secondary channel when one is configured.
//! Failures are isolated per message — a dead webhook never blocks the
//! rest of a batch.

use opentelemetry::KeyValue;
use secrecy::{ExposeSecret, SecretString};
use tracing::{error, warn};
use uuid::Uuid;

use crate::error::{Channel, Error, Result};
use crate::notify::{Message, MetaField, Severity};
use crate::telemetry::metrics;

/// Delivery transport for rendered messages.
///
/// Production uses [`WebhookTransport`]; tests substitute a recorder.
pub trait Transport {
    fn deliver(
        &self,
        url: &SecretString,
        message: &Message,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// How a dispatch concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Primary channel acknowledged the message.
    Primary,
    /// Primary failed; the secondary channel received a failure notice.
    FailureNotified { reason: String },
}

/// Delivers messages to the configured channels.
pub struct Dispatcher<T: Transport> {
    transport: T,
    primary: SecretString,
    secondary: Option<SecretString>,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T, primary: SecretString, secondary: Option<SecretString>) -> Self {
        Self {
            transport,
            primary,
            secondary,
        }
    }

    /// Deliver one message: exactly one primary attempt, at most one
    /// secondary attempt. No in-process retry of the primary message.
    ///
    /// `invocation` tags the failure notice so it can be correlated with
    /// the batch that produced it.
    pub async fn dispatch(&self, message: &Message, invocation: Uuid) -> Result<Delivery> {
        match self.transport.deliver(&self.primary, message).await {
            Ok(()) => {
                metrics::notifications().add(
                    1,
                    &[
                        KeyValue::new("channel", "primary"),
                        KeyValue::new("result", "ok"),
                    ],
                );
                Ok(Delivery::Primary)
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(id = %message.id, %reason, "primary delivery failed");
                metrics::notifications().add(
                    1,
                    &[
                        KeyValue::new("channel", "primary"),
                        KeyValue::new("result", "error"),
                    ],
                );
                self.notify_failure(message, reason, invocation).await
            }
        }
    }

    async fn notify_failure(
        &self,
        message: &Message,
        reason: String,
        invocation: Uuid,
    ) -> Result<Delivery> {
        let Some(ref secondary) = self.secondary else {
            // No failure channel configured. The log line above is all the
            // end user gets; the caller still sees the error.
            return Err(Error::Transport {
                channel: Channel::Primary,
                reason,
            });
        };

        let notice = failure_notice(message, &reason, invocation);
        match self.transport.deliver(secondary, &notice).await {
            Ok(()) => {
                metrics::notifications().add(
                    1,
                    &[
                        KeyValue::new("channel", "secondary"),
                        KeyValue::new("result", "ok"),
                    ],
                );
                Ok(Delivery::FailureNotified { reason })
            }
            Err(e) => {
                // Terminal for this message. Logged, never retried.
                error!(id = %message.id, error = %e, "failure-notice delivery failed");
                metrics::notifications().add(
                    1,
                    &[
                        KeyValue::new("channel", "secondary"),
                        KeyValue::new("result", "error"),
                    ],
                );
                Err(Error::Transport {
                    channel: Channel::Secondary,
                    reason: e.to_string(),
                })
            }
        }
    }
}

/// Minimal notice sent to the secondary channel when primary delivery
/// fails: original identity and title, failure reason, invocation id.
fn failure_notice(message: &Message, reason: &str, invocation: Uuid) -> Message {
    Message {
        id: message.id.clone(),
        title: format!("DELIVERY FAILED: {}", message.title),
        body: format!(
            "event: {}\nreason: {}\ninvocation: {}",
            message.id, reason, invocation
        ),
        severity: Severity::Issue,
        fields: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Webhook transport
// ---------------------------------------------------------------------------

/// Discord-style webhook transport: POSTs the message as a JSON embed.
///
/// Retry/backoff (rate-limit handling) is this transport's concern, not the
/// dispatcher's; the current implementation makes a single bounded-timeout
/// attempt and reports failure upward.
pub struct WebhookTransport {
    http: reqwest::Client,
    /// Deployment label, rendered in the embed footer. Tagging only.
    environment: String,
}

impl WebhookTransport {
    pub fn new(environment: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Other(format!("failed to build http client: {e}")))?;
        Ok(Self {
            http,
            environment: environment.into(),
        })
    }

    fn embed_payload(&self, message: &Message) -> serde_json::Value {
        let fields: Vec<serde_json::Value> = message
            .fields
            .iter()
            .map(|MetaField { name, value }| {
                serde_json::json!({ "name": name, "value": value, "inline": true })
            })
            .collect();

        serde_json::json!({
            "embeds": [{
                "title": message.title,
                "description": message.body,
                "color": message.severity.color(),
                "fields": fields,
                "footer": { "text": format!("healthwatch · {}", self.environment) },
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }]
        })
    }
}

impl Transport for WebhookTransport {
    async fn deliver(&self, url: &SecretString, message: &Message) -> Result<()> {
        let response = self
            .http
            .post(url.expose_secret())
            .json(&self.embed_payload(message))
            .send()
            .await
            .map_err(|e| Error::Other(format!("request error: {e}")))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            // Transport errors carry the reason only; the dispatcher
            // attributes the channel.
            Err(Error::Other(format!("webhook returned {status}")))
        }
    }
}
