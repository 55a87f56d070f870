use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::models::{FormField, FormInvalid, FormView};
use domain::services::{StoreError, SubmissionFailed};
use serde::Serialize;
use thiserror::Error;

/// Message shown when a confirmation could not be saved.
pub const RETRY_MESSAGE: &str = "No pudimos guardar tu confirmación. Intenta de nuevo.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Vec<ValidationDetail>,
    },

    /// The registration form rejected the submission locally.
    #[error("Invalid form: {0}")]
    InvalidForm(FormInvalid, Box<FormView>),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<ValidationDetail>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    form: Option<Box<FormView>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details, form) = match self {
            ApiError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                message,
                Some(details),
                None,
            ),
            ApiError::InvalidForm(invalid, form) => {
                let details = invalid
                    .invalid
                    .iter()
                    .map(|field| ValidationDetail {
                        field: field.to_string(),
                        message: invalid_field_message(*field, &form).to_string(),
                    })
                    .collect();
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "invalid_form",
                    invalid.to_string(),
                    Some(details),
                    Some(form),
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
                None,
            ),
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
            details,
            form,
        };

        (status, Json(body)).into_response()
    }
}

fn invalid_field_message(field: FormField, form: &FormView) -> &'static str {
    let filled = form
        .controls
        .get(&field)
        .is_some_and(|control| !control.value.trim().is_empty());
    match field {
        FormField::Phone if filled => "Phone number must be exactly 10 digits",
        _ => "This field is required",
    }
}

impl From<SubmissionFailed> for ApiError {
    fn from(_: SubmissionFailed) -> Self {
        ApiError::ServiceUnavailable(RETRY_MESSAGE.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(_) | StoreError::ReadFailed(_) => {
                ApiError::ServiceUnavailable("Confirmations are not available right now".into())
            }
            StoreError::WriteFailed(_) => ApiError::ServiceUnavailable(RETRY_MESSAGE.into()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| ValidationDetail {
                    field: field.to_string(),
                    message: e.message.clone().map(|m| m.to_string()).unwrap_or_default(),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        let message = if details.len() == 1 {
            details[0].message.clone()
        } else {
            format!("{} validation errors", details.len())
        };

        ApiError::Validation { message, details }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::RegistrationForm;

    #[test]
    fn test_api_error_validation() {
        let error = ApiError::Validation {
            message: "invalid input".to_string(),
            details: vec![],
        };
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_api_error_invalid_form() {
        let mut form = RegistrationForm::new();
        form.apply_invitation(Some("j8"));
        let invalid = form.submit().unwrap_err();
        let error = ApiError::InvalidForm(invalid, Box::new(form.view()));
        assert_eq!(
            error.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_invalid_field_message() {
        let mut form = RegistrationForm::new();
        form.set_value(FormField::Phone, "55-12");
        let view = form.view();
        assert_eq!(
            invalid_field_message(FormField::Phone, &view),
            "Phone number must be exactly 10 digits"
        );
        assert_eq!(
            invalid_field_message(FormField::Name, &view),
            "This field is required"
        );
    }

    #[test]
    fn test_submission_failed_maps_to_service_unavailable() {
        let error: ApiError = SubmissionFailed.into();
        match &error {
            ApiError::ServiceUnavailable(msg) => assert_eq!(msg, RETRY_MESSAGE),
            other => panic!("Expected ServiceUnavailable, got {:?}", other),
        }
        assert_eq!(
            error.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_from_store_error() {
        let error: ApiError = StoreError::Unavailable("listener gone".to_string()).into();
        assert!(matches!(error, ApiError::ServiceUnavailable(_)));

        let error: ApiError = StoreError::WriteFailed("disk full".to_string()).into();
        match error {
            ApiError::ServiceUnavailable(msg) => assert_eq!(msg, RETRY_MESSAGE),
            other => panic!("Expected ServiceUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            format!("{}", ApiError::ServiceUnavailable("test".to_string())),
            "Service unavailable: test"
        );
        let invalid = FormInvalid {
            invalid: vec![FormField::Name, FormField::Phone],
        };
        assert_eq!(
            format!(
                "{}",
                ApiError::InvalidForm(invalid, Box::new(RegistrationForm::new().view()))
            ),
            "Invalid form: 2 form field(s) failed validation"
        );
    }
}
