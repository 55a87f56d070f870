//! Persistence boundary for confirmations.
//!
//! The store is append-only: confirmations are never updated or deleted.
//! Readers subscribe to full snapshots of the collection.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;

use crate::models::confirmation::{ConfirmationRecord, StoredConfirmation};

/// Failures reported by a confirmation store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Subscription unavailable: {0}")]
    Unavailable(String),
}

/// Append-only collection of confirmations with a live snapshot feed.
#[async_trait::async_trait]
pub trait ConfirmationStore: Send + Sync {
    /// Persists a record and returns it with its generated identifier.
    async fn append(&self, record: ConfirmationRecord) -> Result<StoredConfirmation, StoreError>;

    /// Returns a receiver that always holds the full current collection and is
    /// notified on every change. The receiver errors once the feed stops.
    async fn subscribe_all(
        &self,
    ) -> Result<watch::Receiver<Vec<StoredConfirmation>>, StoreError>;

    /// Checks that the backing store is reachable.
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Short backend name for health reporting.
    fn backend(&self) -> &'static str;
}

/// Process-local store used for development and tests.
///
/// Keeps the collection inside the watch channel itself, so every append
/// publishes a fresh snapshot to all subscribers.
#[derive(Debug)]
pub struct InMemoryConfirmationStore {
    sender: watch::Sender<Vec<StoredConfirmation>>,
    /// Whether to simulate write failures for testing.
    simulate_failure: AtomicBool,
}

impl Default for InMemoryConfirmationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryConfirmationStore {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Vec::new());
        Self {
            sender,
            simulate_failure: AtomicBool::new(false),
        }
    }

    /// Create a store whose writes always fail.
    pub fn failing() -> Self {
        let store = Self::new();
        store.set_failing(true);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.simulate_failure.store(failing, Ordering::SeqCst);
    }

    /// Inserts an already-stored confirmation verbatim (seeding, tests).
    pub fn insert(&self, confirmation: StoredConfirmation) {
        self.sender.send_modify(|all| all.push(confirmation));
    }

    pub fn len(&self) -> usize {
        self.sender.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<StoredConfirmation> {
        self.sender.borrow().clone()
    }
}

#[async_trait::async_trait]
impl ConfirmationStore for InMemoryConfirmationStore {
    async fn append(&self, record: ConfirmationRecord) -> Result<StoredConfirmation, StoreError> {
        if self.simulate_failure.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailed("simulated write failure".to_string()));
        }

        let stored = StoredConfirmation {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            record,
        };
        self.insert(stored.clone());
        Ok(stored)
    }

    async fn subscribe_all(
        &self,
    ) -> Result<watch::Receiver<Vec<StoredConfirmation>>, StoreError> {
        Ok(self.sender.subscribe())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
