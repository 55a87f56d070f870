//! Live aggregation of confirmations for the dashboard.

use chrono::Utc;
use tokio::sync::watch;
use tracing::error;

use super::store::{ConfirmationStore, StoreError};
use crate::models::confirmation::{AttendanceAnswer, StoredConfirmation};
use crate::models::dashboard::DashboardSummary;
use crate::models::invitation::InvitationKind;

/// Builds the dashboard summary from a full snapshot of the collection.
///
/// Unresolved invitations are dropped before counting. Records whose
/// attendance answer is not recognised appear in the list but in neither count.
pub fn summarize(snapshot: &[StoredConfirmation]) -> DashboardSummary {
    let mut confirmations: Vec<StoredConfirmation> = snapshot
        .iter()
        .filter(|c| c.record.invitation_kind != InvitationKind::Undefined)
        .cloned()
        .collect();
    confirmations.sort_by(|a, b| b.record.timestamp.cmp(&a.record.timestamp));

    let count = |wanted: AttendanceAnswer| {
        confirmations
            .iter()
            .filter(|c| {
                c.record
                    .active_attendance()
                    .and_then(|value| value.answer())
                    == Some(wanted)
            })
            .count()
    };
    let attending_count = count(AttendanceAnswer::Yes);
    let not_attending_count = count(AttendanceAnswer::No);

    DashboardSummary {
        confirmations,
        attending_count,
        not_attending_count,
        generated_at: Utc::now(),
    }
}

/// A dashboard subscription: yields a fresh summary whenever the store changes.
#[derive(Debug)]
pub struct AggregationView {
    receiver: watch::Receiver<Vec<StoredConfirmation>>,
    stopped: bool,
}

impl AggregationView {
    pub fn new(receiver: watch::Receiver<Vec<StoredConfirmation>>) -> Self {
        Self {
            receiver,
            stopped: false,
        }
    }

    /// Subscribes to the store. A failure here is logged and returned; there is no retry.
    pub async fn subscribe(store: &dyn ConfirmationStore) -> Result<Self, StoreError> {
        match store.subscribe_all().await {
            Ok(receiver) => Ok(Self::new(receiver)),
            Err(e) => {
                error!(error = %e, backend = store.backend(), "Failed to subscribe to confirmations");
                Err(e)
            }
        }
    }

    /// Summary of the latest snapshot, marking it as seen.
    pub fn current(&mut self) -> DashboardSummary {
        summarize(&self.receiver.borrow_and_update())
    }

    /// Waits for the next change. Returns `None` once the feed has stopped.
    pub async fn next(&mut self) -> Option<DashboardSummary> {
        if self.stopped {
            return None;
        }
        match self.receiver.changed().await {
            Ok(()) => Some(self.current()),
            Err(_) => {
                error!("Confirmation feed closed; dashboard stopped loading");
                self.stopped = true;
                None
            }
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}
