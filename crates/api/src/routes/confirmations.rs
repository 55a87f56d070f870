//! Direct gateway submission.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::ConfirmationPayload;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfirmationCreated {
    pub id: Uuid,
}

/// Persist a confirmation without running the registration form.
///
/// Only the gateway's required fields are enforced.
///
/// POST /api/v1/confirmations
pub async fn create_confirmation(
    State(state): State<AppState>,
    Json(payload): Json<ConfirmationPayload>,
) -> Result<(StatusCode, Json<ConfirmationCreated>), ApiError> {
    let id = state.gateway.submit(payload).await?;
    Ok((StatusCode::CREATED, Json(ConfirmationCreated { id })))
}
