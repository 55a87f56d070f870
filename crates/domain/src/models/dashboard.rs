//! Dashboard view models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::confirmation::StoredConfirmation;

/// Aggregated RSVP responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// Resolved confirmations, most recent first.
    pub confirmations: Vec<StoredConfirmation>,
    pub attending_count: usize,
    pub not_attending_count: usize,
    pub generated_at: DateTime<Utc>,
}

impl DashboardSummary {
    pub fn total(&self) -> usize {
        self.confirmations.len()
    }
}
