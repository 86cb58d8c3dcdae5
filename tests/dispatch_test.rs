//! Unit tests for the notification dispatcher, using a recording transport.

use std::sync::{Arc, Mutex};

use healthwatch::error::Error;
use healthwatch::model::EventId;
use healthwatch::notify::dispatch::{Delivery, Dispatcher, Transport};
use healthwatch::notify::{Message, Severity};
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

/// Transport that records every call and fails for listed URLs.
#[derive(Clone, Default)]
struct MockTransport {
    calls: Arc<Mutex<Vec<(String, Message)>>>,
    fail_urls: Arc<Vec<String>>,
}

impl MockTransport {
    fn failing_on(urls: &[&str]) -> Self {
        Self {
            calls: Arc::default(),
            fail_urls: Arc::new(urls.iter().map(|u| u.to_string()).collect()),
        }
    }

    fn calls(&self) -> Vec<(String, Message)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    async fn deliver(&self, url: &SecretString, message: &Message) -> healthwatch::error::Result<()> {
        let url = url.expose_secret().to_string();
        self.calls.lock().unwrap().push((url.clone(), message.clone()));
        if self.fail_urls.contains(&url) {
            Err(Error::Other("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

fn message() -> Message {
    Message {
        id: EventId("arn:aws:health:us-east-1::event/EC2/ISSUE/abc123".to_string()),
        title: "EC2 ISSUE WAS UPDATED (abc123)".to_string(),
        body: "status: open → closed\n".to_string(),
        severity: Severity::Change,
        fields: Vec::new(),
    }
}

fn secret(url: &str) -> SecretString {
    SecretString::from(url.to_string())
}

#[tokio::test]
async fn successful_primary_makes_exactly_one_call() {
    let transport = MockTransport::default();
    let dispatcher = Dispatcher::new(
        transport.clone(),
        secret("https://hooks.test/primary"),
        Some(secret("https://hooks.test/fail")),
    );

    let result = dispatcher.dispatch(&message(), Uuid::new_v4()).await.unwrap();
    assert_eq!(result, Delivery::Primary);

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "https://hooks.test/primary");
}

#[tokio::test]
async fn primary_failure_sends_failure_notice_to_secondary() {
    let transport = MockTransport::failing_on(&["https://hooks.test/primary"]);
    let dispatcher = Dispatcher::new(
        transport.clone(),
        secret("https://hooks.test/primary"),
        Some(secret("https://hooks.test/fail")),
    );

    let result = dispatcher.dispatch(&message(), Uuid::new_v4()).await.unwrap();
    let Delivery::FailureNotified { reason } = result else {
        panic!("expected FailureNotified");
    };
    assert!(reason.contains("connection refused"));

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].0, "https://hooks.test/fail");

    // Notice references the original identity and the failure reason.
    let notice = &calls[1].1;
    assert!(notice.title.starts_with("DELIVERY FAILED:"));
    assert!(notice.body.contains("abc123"));
    assert!(notice.body.contains("connection refused"));
}

#[tokio::test]
async fn primary_failure_without_secondary_is_an_error() {
    let transport = MockTransport::failing_on(&["https://hooks.test/primary"]);
    let dispatcher = Dispatcher::new(transport.clone(), secret("https://hooks.test/primary"), None);

    let result = dispatcher.dispatch(&message(), Uuid::new_v4()).await;
    assert!(result.is_err());

    // No secondary configured — exactly one attempt total.
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
async fn secondary_failure_is_terminal_not_retried() {
    let transport =
        MockTransport::failing_on(&["https://hooks.test/primary", "https://hooks.test/fail"]);
    let dispatcher = Dispatcher::new(
        transport.clone(),
        secret("https://hooks.test/primary"),
        Some(secret("https://hooks.test/fail")),
    );

    let result = dispatcher.dispatch(&message(), Uuid::new_v4()).await;
    assert!(matches!(result, Err(Error::Transport { .. })));

    // One primary attempt, one secondary attempt, nothing more.
    assert_eq!(transport.calls().len(), 2);
}

#[tokio::test]
async fn successful_primary_never_touches_secondary() {
    let transport = MockTransport::default();
    let dispatcher = Dispatcher::new(
        transport.clone(),
        secret("https://hooks.test/primary"),
        Some(secret("https://hooks.test/fail")),
    );

    dispatcher.dispatch(&message(), Uuid::new_v4()).await.unwrap();
    dispatcher.dispatch(&message(), Uuid::new_v4()).await.unwrap();

    assert!(
        transport
            .calls()
            .iter()
            .all(|(url, _)| url == "https://hooks.test/primary")
    );
}
