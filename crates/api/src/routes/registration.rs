//! Registration form endpoints.
//!
//! The form state lives only for the duration of one request: it is rebuilt
//! from the invitation code, fed the submitted values in the order a guest
//! would fill them in, and validated before anything reaches the gateway.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use domain::models::{AttendanceValue, FormField, FormView, RegistrationForm};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_form_rejected;

/// Message returned once a confirmation is stored.
pub const CONFIRMED_MESSAGE: &str = "¡Gracias! Tu confirmación quedó registrada.";

/// Query string of the form page; `codigo` selects the invitation.
#[derive(Debug, Default, Deserialize)]
pub struct InvitationQuery {
    pub codigo: Option<String>,
}

/// Values typed into the form.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    #[validate(length(max = 120, message = "Name must be at most 120 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 20, message = "Phone must be at most 20 characters"))]
    pub phone: Option<String>,

    #[validate(length(
        max = 80,
        message = "Seafood preference must be at most 80 characters"
    ))]
    pub seafood_preference: Option<String>,

    pub attending: Option<AttendanceValue>,

    pub companion_attending: Option<AttendanceValue>,

    #[validate(length(
        max = 40,
        message = "Two-day attendance must be at most 40 characters"
    ))]
    pub two_day_attendance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub id: Uuid,
    pub message: String,
}

/// Form description for the given invitation.
///
/// GET /
pub async fn get_form(Query(query): Query<InvitationQuery>) -> Json<FormView> {
    let mut form = RegistrationForm::new();
    form.apply_invitation(query.codigo.as_deref());
    Json(form.view())
}

/// Validate the form and hand it to the gateway.
///
/// POST /
pub async fn submit_registration(
    State(state): State<AppState>,
    Query(query): Query<InvitationQuery>,
    Json(request): Json<RegistrationRequest>,
) -> Result<(StatusCode, Json<RegistrationResponse>), ApiError> {
    request.validate()?;

    let mut form = fill_form(query.codigo.as_deref(), &request);
    let payload = match form.submit() {
        Ok(payload) => payload,
        Err(invalid) => {
            record_form_rejected();
            return Err(ApiError::InvalidForm(invalid, Box::new(form.view())));
        }
    };

    let kind = payload.invitation_kind;
    let id = state.gateway.submit(payload).await?;
    info!(confirmation_id = %id, invitation_kind = %kind, "Registration accepted");

    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse {
            id,
            message: CONFIRMED_MESSAGE.to_string(),
        }),
    ))
}

/// Builds the form for `code` and applies the request values. Attendance goes
/// before the two-day answer because changing attendance clears it.
fn fill_form(code: Option<&str>, request: &RegistrationRequest) -> RegistrationForm {
    let mut form = RegistrationForm::new();
    form.apply_invitation(code);

    let text_fields = [
        (FormField::Name, request.name.as_deref()),
        (FormField::Phone, request.phone.as_deref()),
        (FormField::SeafoodPreference, request.seafood_preference.as_deref()),
    ];
    for (field, value) in text_fields {
        if let Some(value) = value {
            form.set_value(field, value);
        }
    }

    let attendance_fields = [
        (FormField::Attending, request.attending.as_ref()),
        (FormField::CompanionAttending, request.companion_attending.as_ref()),
    ];
    for (field, value) in attendance_fields {
        if let Some(value) = value {
            form.set_value(field, value.as_text());
        }
    }

    if let Some(value) = request.two_day_attendance.as_deref() {
        form.set_value(FormField::TwoDayAttendance, value);
    }

    form
}
