//! Ingestion driver: fetches provider health events, enriches them with
//! their latest description, normalizes them into the record schema, and
//! writes them through the store.
//!
//! Everything upstream of the store is this module's concern — pagination,
//! the detail-call chunk limit, filtering. Downstream components never see
//! a raw provider payload.

use chrono::{DateTime, Duration, Utc};
use opentelemetry::KeyValue;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::model::{EventId, EventRecord};
use crate::store::Store;
use crate::telemetry::metrics;

/// The provider's detail endpoint accepts at most this many identities
/// per call.
const DETAIL_CHUNK: usize = 10;

/// Only events in this category are ingested.
const CATEGORY_ISSUE: &str = "issue";

/// Only events with this scope are ingested.
const SCOPE_PUBLIC: &str = "PUBLIC";

// ---------------------------------------------------------------------------
// Provider wire types
// ---------------------------------------------------------------------------

/// One event as listed by the provider, before detail enrichment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
    pub arn: String,
    pub service: String,
    pub region: String,
    pub status_code: String,
    pub event_type_code: String,
    pub event_type_category: String,
    pub event_scope_code: String,
    pub start_time: DateTime<Utc>,
    pub last_updated_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventsPage {
    events: Vec<ApiEvent>,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailsResponse {
    successful_set: Vec<EventDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventDetail {
    event: EventRef,
    #[serde(default)]
    event_description: Option<EventDescription>,
}

#[derive(Debug, Deserialize)]
struct EventRef {
    arn: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventDescription {
    latest_description: String,
}

// ---------------------------------------------------------------------------
// Health feed
// ---------------------------------------------------------------------------

/// Source of provider health events.
///
/// Production uses [`HealthClient`]; tests substitute a canned feed.
pub trait HealthFeed {
    /// List current issue-category events, all pages.
    fn list_issue_events(&self) -> impl Future<Output = Result<Vec<ApiEvent>>> + Send;

    /// Fetch latest descriptions for up to [`DETAIL_CHUNK`] identities.
    /// Identities the provider cannot resolve are simply missing from the
    /// result.
    fn describe_events(
        &self,
        arns: &[String],
    ) -> impl Future<Output = Result<Vec<(String, String)>>> + Send;
}

/// HTTP client for the provider health API.
pub struct HealthClient {
    http: reqwest::Client,
    base_url: String,
}

impl HealthClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Other(format!("failed to build http client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

impl HealthFeed for HealthClient {
    async fn list_issue_events(&self) -> Result<Vec<ApiEvent>> {
        let mut events = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(format!("{}/events", self.base_url))
                .query(&[("eventTypeCategory", CATEGORY_ISSUE)]);
            if let Some(ref token) = next_token {
                request = request.query(&[("nextToken", token.as_str())]);
            }

            let page: EventsPage = request.send().await?.error_for_status()?.json().await?;
            events.extend(page.events);

            match page.next_token {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        Ok(events)
    }

    async fn describe_events(&self, arns: &[String]) -> Result<Vec<(String, String)>> {
        let response: DetailsResponse = self
            .http
            .post(format!("{}/event-details", self.base_url))
            .json(&serde_json::json!({ "eventArns": arns }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .successful_set
            .into_iter()
            .filter_map(|detail| {
                detail
                    .event_description
                    .map(|d| (detail.event.arn, d.latest_description))
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Ingestion pass
// ---------------------------------------------------------------------------

/// Counts from one ingestion pass.
#[derive(Debug, Default)]
pub struct IngestSummary {
    pub fetched: usize,
    pub written: usize,
    pub skipped: usize,
}

/// One full ingestion pass: list, enrich, normalize, write through.
///
/// Events without a resolvable description are skipped with a warning; a
/// single bad event never aborts the pass.
pub async fn run(feed: &impl HealthFeed, store: &Store, retention: Duration) -> Result<IngestSummary> {
    let listed = feed.list_issue_events().await?;

    // Doubly ensure only public, issue-type events reach the store.
    let events: Vec<ApiEvent> = listed
        .into_iter()
        .filter(|e| e.event_scope_code == SCOPE_PUBLIC && e.event_type_category == CATEGORY_ISSUE)
        .collect();

    let mut summary = IngestSummary {
        fetched: events.len(),
        ..Default::default()
    };

    for chunk in events.chunks(DETAIL_CHUNK) {
        let arns: Vec<String> = chunk.iter().map(|e| e.arn.clone()).collect();
        let descriptions = feed.describe_events(&arns).await?;

        for event in chunk {
            let Some((_, description)) = descriptions.iter().find(|(arn, _)| *arn == event.arn)
            else {
                warn!(arn = %event.arn, "no description for event, skipping");
                summary.skipped += 1;
                continue;
            };

            let record = match normalize(event, description.clone()) {
                Ok(record) => record,
                Err(e) => {
                    warn!(arn = %event.arn, error = %e, "event failed normalization, skipping");
                    metrics::events_ingested().add(1, &[KeyValue::new("result", "error")]);
                    summary.skipped += 1;
                    continue;
                }
            };

            store.put_record(&record, retention).await?;
            metrics::events_ingested().add(1, &[KeyValue::new("result", "ok")]);
            summary.written += 1;
        }
    }

    info!(
        fetched = summary.fetched,
        written = summary.written,
        skipped = summary.skipped,
        "ingestion pass complete"
    );
    Ok(summary)
}

/// Normalize one provider event into the record schema.
pub fn normalize(event: &ApiEvent, description: String) -> Result<EventRecord> {
    Ok(EventRecord {
        id: EventId(event.arn.clone()),
        status: event.status_code.parse()?,
        service: event.service.clone(),
        region: event.region.clone(),
        event_type_code: event.event_type_code.clone(),
        event_type_category: event.event_type_category.clone(),
        scope: event.event_scope_code.clone(),
        description,
        start_time: event.start_time,
        last_updated_time: event.last_updated_time,
        end_time: event.end_time,
    })
}
