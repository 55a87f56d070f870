//! Integration tests for the registration form endpoints.

mod common;

use axum::http::{header, Method, StatusCode};
use common::{get_request, json_request, parse_response_body, test_app};
use domain::models::{AttendanceValue, InvitationKind};
use domain::services::ConfirmationStore;
use serde_json::json;
use tower::ServiceExt;

// ============================================================================
// Form view
// ============================================================================

#[tokio::test]
async fn test_form_for_couple_invitation() {
    let (app, _store) = test_app();

    let response = app.oneshot(get_request("/?codigo=k5")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["invitationKind"], "pareja");
    assert_eq!(body["invitationCode"], "k5");
    assert_eq!(body["validCode"], true);
    assert_eq!(body["title"], "Invitación para Pareja");
    assert_eq!(body["subtitle"], "Confirmación para 2 personas");
    assert_eq!(body["controls"]["companionAttending"]["required"], true);
    assert_eq!(body["controls"]["attending"]["required"], false);
    assert_eq!(body["controls"]["invitationCode"]["value"], "k5");
    assert_eq!(body["valid"], false);
}

#[tokio::test]
async fn test_form_for_individual_invitation() {
    let (app, _store) = test_app();

    let response = app.oneshot(get_request("/?codigo=x3")).await.unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["invitationKind"], "individual");
    assert_eq!(body["title"], "Invitación Individual");
    assert_eq!(body["controls"]["attending"]["required"], true);
    assert_eq!(body["controls"]["companionAttending"]["required"], false);
}

#[tokio::test]
async fn test_form_without_code_is_undefined() {
    let (app, _store) = test_app();

    let response = app.oneshot(get_request("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["invitationKind"], "indefinido");
    assert_eq!(body["validCode"], false);
    assert_eq!(body["invitationCode"], "");
    assert_eq!(body["title"], "Confirmar Asistencia");
    assert_eq!(body["controls"]["attending"]["required"], true);
}

#[tokio::test]
async fn test_form_with_unknown_code_is_undefined() {
    let (app, _store) = test_app();

    let response = app.oneshot(get_request("/?codigo=zz")).await.unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["invitationKind"], "indefinido");
    assert_eq!(body["validCode"], false);
    assert_eq!(body["invitationCode"], "");
}

// ============================================================================
// Submission
// ============================================================================

#[tokio::test]
async fn test_submit_couple_confirmation() {
    let (app, store) = test_app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/?codigo=k5",
            json!({
                "name": "Ana",
                "phone": "5512345678",
                "seafoodPreference": "camarón",
                "companionAttending": "sí",
                "twoDayAttendance": "ambos"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = parse_response_body(response).await;
    assert!(body["id"].is_string());
    assert!(body["message"].as_str().unwrap().contains("Gracias"));

    let saved = store.snapshot();
    assert_eq!(saved.len(), 1);
    let record = &saved[0].record;
    assert_eq!(body["id"], saved[0].id.to_string());
    assert_eq!(record.name, "Ana");
    assert_eq!(record.invitation_kind, InvitationKind::Couple);
    assert_eq!(record.invitation_code, "k5");
    assert_eq!(record.companion_attending, Some(AttendanceValue::from("sí")));
    assert_eq!(record.attending, None);
    assert_eq!(record.two_day_attendance.as_deref(), Some("ambos"));
    assert_eq!(record.timestamp, record.submitted_at.timestamp_millis());
}

#[tokio::test]
async fn test_submit_declined_without_two_day_answer() {
    let (app, store) = test_app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/?codigo=j8",
            json!({
                "name": "Luis",
                "phone": "5598765432",
                "seafoodPreference": "ninguno",
                "attending": "no"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let saved = store.snapshot();
    assert_eq!(saved[0].record.attending, Some(AttendanceValue::from("no")));
    assert_eq!(saved[0].record.two_day_attendance, None);
}

#[tokio::test]
async fn test_submit_attending_without_two_day_answer_is_rejected() {
    let (app, store) = test_app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/?codigo=j8",
            json!({
                "name": "Ana",
                "phone": "5512345678",
                "seafoodPreference": "camarón",
                "attending": "sí"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "invalid_form");
    assert_eq!(body["details"][0]["field"], "twoDayAttendance");
    assert_eq!(body["form"]["controls"]["twoDayAttendance"]["touched"], true);
    assert_eq!(body["form"]["controls"]["twoDayAttendance"]["required"], true);
    assert_eq!(body["form"]["controls"]["name"]["touched"], false);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_submit_empty_form_marks_all_invalid_touched() {
    let (app, store) = test_app();

    let response = app
        .oneshot(json_request(Method::POST, "/?codigo=k5", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = parse_response_body(response).await;
    let controls = &body["form"]["controls"];
    for field in ["name", "phone", "seafoodPreference", "companionAttending"] {
        assert_eq!(controls[field]["valid"], false, "{} should be invalid", field);
        assert_eq!(controls[field]["touched"], true, "{} should be touched", field);
    }
    assert_eq!(controls["attending"]["valid"], true);
    assert_eq!(controls["attending"]["touched"], false);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_submit_invalid_phone_is_rejected() {
    let (app, store) = test_app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/?codigo=j8",
            json!({
                "name": "Ana",
                "phone": "55-1234",
                "seafoodPreference": "camarón",
                "attending": "no"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = parse_response_body(response).await;
    assert_eq!(body["details"][0]["field"], "phone");
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_submit_inactive_attendance_field_is_ignored_for_rules() {
    let (app, store) = test_app();

    // Couple invitation: the individual field does not drive the two-day rule.
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/?codigo=m9",
            json!({
                "name": "Ana",
                "phone": "5512345678",
                "seafoodPreference": "camarón",
                "attending": "sí",
                "companionAttending": "no"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let record = &store.snapshot()[0].record;
    assert_eq!(record.attending, Some(AttendanceValue::from("sí")));
    assert_eq!(record.companion_attending, Some(AttendanceValue::from("no")));
    assert_eq!(record.two_day_attendance, None);
}

#[tokio::test]
async fn test_submit_without_code_is_stored_as_undefined() {
    let (app, store) = test_app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/",
            json!({
                "name": "Ana",
                "phone": "5512345678",
                "seafoodPreference": "camarón",
                "attending": "no"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let record = &store.snapshot()[0].record;
    assert_eq!(record.invitation_kind, InvitationKind::Undefined);
    assert_eq!(record.invitation_code, "");
}

#[tokio::test]
async fn test_submit_store_failure_returns_retry_message() {
    let (app, store) = test_app();
    store.set_failing(true);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/?codigo=j8",
            json!({
                "name": "Ana",
                "phone": "5512345678",
                "seafoodPreference": "camarón",
                "attending": "no"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "service_unavailable");
    assert!(body["message"].as_str().unwrap().contains("Intenta de nuevo"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_submit_overlong_name_is_bad_request() {
    let (app, store) = test_app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/?codigo=j8",
            json!({ "name": "x".repeat(200) }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "name");
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_submitted_confirmation_is_published() {
    let (app, store) = test_app();
    let mut receiver = store.subscribe_all().await.unwrap();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/?codigo=x3",
            json!({
                "name": "Ana",
                "phone": "5512345678",
                "seafoodPreference": "camarón",
                "attending": true,
                "twoDayAttendance": "sábado"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    assert!(receiver.has_changed().unwrap());
    let all = receiver.borrow_and_update().clone();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].record.attending, Some(AttendanceValue::from("sí")));
}

#[tokio::test]
async fn test_response_carries_request_id() {
    let (app, _store) = test_app();

    let request = axum::http::Request::builder()
        .uri("/?codigo=j8")
        .header("X-Request-ID", "rsvp-test-1")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "rsvp-test-1"
    );
    assert!(response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("application/json"));
}
