//! HTTP route handlers.

pub mod confirmations;
pub mod dashboard;
pub mod health;
pub mod registration;

use axum::response::Redirect;

/// Unknown paths send the guest back to the form.
pub async fn redirect_to_form() -> Redirect {
    Redirect::to("/")
}
