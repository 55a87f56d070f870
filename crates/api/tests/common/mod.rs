//! Common test utilities for integration tests.
//!
//! The router is driven in-process against the in-memory confirmation store,
//! so no database is required.

// Not every helper is used by every integration test binary.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{Body, BodyDataStream},
    http::{header, Method, Request},
    Router,
};
use chrono::{DateTime, Utc};
use domain::models::{AttendanceValue, ConfirmationRecord, InvitationKind, StoredConfirmation};
use domain::services::{ConfirmationStore, InMemoryConfirmationStore, StoreError};
use futures_util::StreamExt;
use rsvp_api::{
    app::create_app,
    config::{Config, LoggingConfig, SecurityConfig, ServerConfig, StoreBackend, StoreConfig},
};
use tokio::sync::watch;
use uuid::Uuid;

/// Test configuration using the in-memory store.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Use random port
            request_timeout_secs: 30,
        },
        store: StoreConfig {
            backend: StoreBackend::Memory,
            url: String::new(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            cors_origins: vec![],
        },
    }
}

/// Create a test application router over the given store.
pub fn create_test_app(store: Arc<InMemoryConfirmationStore>) -> Router {
    create_app(test_config(), store)
}

/// A fresh store and a router over it.
pub fn test_app() -> (Router, Arc<InMemoryConfirmationStore>) {
    let store = Arc::new(InMemoryConfirmationStore::new());
    (create_test_app(store.clone()), store)
}

/// Build a JSON request.
pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a GET request.
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Parse response body as JSON.
pub async fn parse_response_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}

/// A stored confirmation with the given attendance, submitted at `at`.
pub fn stored_confirmation(
    name: &str,
    kind: InvitationKind,
    attending: Option<AttendanceValue>,
    companion_attending: Option<AttendanceValue>,
    at: DateTime<Utc>,
) -> StoredConfirmation {
    StoredConfirmation {
        id: Uuid::new_v4(),
        created_at: at,
        record: ConfirmationRecord {
            name: name.to_string(),
            phone: "5512345678".to_string(),
            seafood_preference: "camarón".to_string(),
            attending,
            companion_attending,
            two_day_attendance: None,
            invitation_kind: kind,
            invitation_code: String::new(),
            submitted_at: at,
            timestamp: at.timestamp_millis(),
        },
    }
}

/// Reads server-sent events off a streaming response body.
pub struct EventReader {
    stream: BodyDataStream,
    buffer: String,
}

/// One parsed server-sent event.
#[derive(Debug)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

impl EventReader {
    pub fn new(response: axum::response::Response) -> Self {
        Self {
            stream: response.into_body().into_data_stream(),
            buffer: String::new(),
        }
    }

    /// Next event with a name, skipping keep-alive comments. Panics after 5s.
    pub async fn next_event(&mut self) -> SseEvent {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(end) = self.buffer.find("\n\n") {
                    let block: String = self.buffer.drain(..end + 2).collect();
                    if let Some(event) = parse_event(&block) {
                        return event;
                    }
                    continue;
                }
                let chunk = self
                    .stream
                    .next()
                    .await
                    .expect("event stream ended")
                    .expect("event stream failed");
                self.buffer.push_str(std::str::from_utf8(&chunk).unwrap());
            }
        })
        .await
        .expect("timed out waiting for an event")
    }
}

fn parse_event(block: &str) -> Option<SseEvent> {
    let mut event = None;
    let mut data = Vec::new();
    for line in block.lines() {
        if let Some(name) = line.strip_prefix("event:") {
            event = Some(name.trim().to_string());
        } else if let Some(value) = line.strip_prefix("data:") {
            data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
    }
    event.map(|event| SseEvent {
        event,
        data: data.join("\n"),
    })
}

/// Read-only store whose feed can be closed, or which refuses subscriptions.
pub struct ClosableStore {
    sender: Mutex<Option<watch::Sender<Vec<StoredConfirmation>>>>,
    receiver: watch::Receiver<Vec<StoredConfirmation>>,
    unavailable: bool,
}

impl ClosableStore {
    pub fn new(initial: Vec<StoredConfirmation>) -> Self {
        let (sender, receiver) = watch::channel(initial);
        Self {
            sender: Mutex::new(Some(sender)),
            receiver,
            unavailable: false,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new(Vec::new())
        }
    }

    /// Drops the sender, ending every subscription.
    pub fn close(&self) {
        self.sender.lock().unwrap().take();
    }
}

#[async_trait::async_trait]
impl ConfirmationStore for ClosableStore {
    async fn append(&self, _record: ConfirmationRecord) -> Result<StoredConfirmation, StoreError> {
        Err(StoreError::WriteFailed("read-only test store".to_string()))
    }

    async fn subscribe_all(
        &self,
    ) -> Result<watch::Receiver<Vec<StoredConfirmation>>, StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("test store refuses subscriptions".to_string()));
        }
        Ok(self.receiver.clone())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::ReadFailed("test store is down".to_string()));
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "test"
    }
}
