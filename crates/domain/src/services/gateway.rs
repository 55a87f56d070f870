//! Confirmation submission gateway.
//!
//! Last line of validation before a confirmation is persisted. Only the
//! identity fields are enforced here; attendance answers are stored as given.

use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use shared::validation::is_blank;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::store::ConfirmationStore;
use crate::models::confirmation::{ConfirmationPayload, ConfirmationRecord, RequiredField};

/// Fields a payload must carry, non-blank, to be persisted.
pub const REQUIRED_FIELDS: [RequiredField; 3] = [
    RequiredField::Name,
    RequiredField::Phone,
    RequiredField::SeafoodPreference,
];

/// Submission could not be saved.
///
/// Deliberately carries no detail: a missing field and a failed write look the
/// same to the caller, which can only offer a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Confirmation could not be saved")]
pub struct SubmissionFailed;

/// Returns the first required field that is absent or blank.
pub fn missing_required_field(payload: &ConfirmationPayload) -> Option<RequiredField> {
    REQUIRED_FIELDS
        .into_iter()
        .find(|field| payload.required_value(*field).map_or(true, is_blank))
}

/// Validates and persists confirmations.
#[derive(Clone)]
pub struct ConfirmationGateway {
    store: Arc<dyn ConfirmationStore>,
}

impl ConfirmationGateway {
    pub fn new(store: Arc<dyn ConfirmationStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ConfirmationStore> {
        &self.store
    }

    /// Persists a confirmation and returns its generated identifier.
    pub async fn submit(&self, payload: ConfirmationPayload) -> Result<Uuid, SubmissionFailed> {
        if let Some(field) = missing_required_field(&payload) {
            warn!(
                field = field.as_str(),
                invitation_code = %payload.invitation_code,
                "Rejected confirmation with missing required field"
            );
            counter!("confirmations_rejected_total", "reason" => "missing_field").increment(1);
            return Err(SubmissionFailed);
        }

        let submitted_at = Utc::now();
        let record = ConfirmationRecord {
            name: payload.name.unwrap_or_default(),
            phone: payload.phone.unwrap_or_default(),
            seafood_preference: payload.seafood_preference.unwrap_or_default(),
            attending: payload.attending,
            companion_attending: payload.companion_attending,
            two_day_attendance: payload.two_day_attendance,
            invitation_kind: payload.invitation_kind,
            invitation_code: payload.invitation_code,
            submitted_at,
            timestamp: submitted_at.timestamp_millis(),
        };
        let kind = record.invitation_kind;

        match self.store.append(record).await {
            Ok(stored) => {
                info!(
                    confirmation_id = %stored.id,
                    invitation_kind = %kind,
                    "Confirmation saved"
                );
                counter!("confirmations_submitted_total", "kind" => kind.as_str()).increment(1);
                Ok(stored.id)
            }
            Err(e) => {
                error!(error = %e, invitation_kind = %kind, "Failed to save confirmation");
                counter!("confirmations_rejected_total", "reason" => "store").increment(1);
                Err(SubmissionFailed)
            }
        }
    }
}
