mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    routing::{get, patch, post, put},
    Router,
};
use chrono::{Duration, Utc};
use common::{submit_application, test_env, TestEnv};
use jobboard_backend::models::application::ApplicationStatus;
use jobboard_backend::routes;
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

fn router(env: &TestEnv) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/api/applications",
            post(routes::applications::create_application),
        )
        .route(
            "/api/applications/:id",
            get(routes::applications::get_application),
        )
        .route(
            "/api/applications/:id/history",
            get(routes::applications::get_application_history),
        )
        .route(
            "/api/applications/:id/status",
            patch(routes::applications::update_status),
        )
        .route(
            "/api/applications/:id/reschedule",
            post(routes::applications::propose_reschedule),
        )
        .route(
            "/api/applications/:id/reschedule-response",
            put(routes::applications::respond_reschedule),
        )
        .route(
            "/api/companies/:id/interviews",
            post(routes::interviews::schedule_interview),
        )
        .route(
            "/api/interviews/:id/result",
            post(routes::interviews::record_result),
        )
        .with_state(env.state.clone())
}

async fn call(app: Router, method: &str, uri: &str, body: Option<JsonValue>) -> (StatusCode, JsonValue) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn submit_then_shortlist_over_http() {
    let env = test_env();
    let job_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    let (status, body) = call(
        router(&env),
        "POST",
        "/api/applications",
        Some(json!({ "job_id": job_id, "user_id": user_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "applied");
    let id = body["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        router(&env),
        "PATCH",
        &format!("/api/applications/{}/status", id),
        Some(json!({ "status": "shortlisted" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "shortlisted");

    let (status, history) = call(
        router(&env),
        "GET",
        &format!("/api/applications/{}/history", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["status"], "applied");
    assert_eq!(entries[1]["status"], "shortlisted");
    assert!(entries[1]["changedAt"].is_string());
}

#[tokio::test]
async fn duplicate_submission_returns_conflict() {
    let env = test_env();
    let payload = json!({ "job_id": Uuid::new_v4(), "user_id": Uuid::new_v4() });

    let (status, _) = call(router(&env), "POST", "/api/applications", Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(router(&env), "POST", "/api/applications", Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "DuplicateApplication");
}

#[tokio::test]
async fn invalid_transition_reports_both_ends() {
    let env = test_env();
    let app = submit_application(&env).await;

    let (status, body) = call(
        router(&env),
        "PATCH",
        &format!("/api/applications/{}/status", app.id),
        Some(json!({ "status": "hired" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidTransition");
    assert_eq!(body["from"], "applied");
    assert_eq!(body["to"], "hired");
}

#[tokio::test]
async fn missing_reason_is_a_bad_request() {
    let env = test_env();
    let app = submit_application(&env).await;

    let (status, body) = call(
        router(&env),
        "PATCH",
        &format!("/api/applications/{}/status", app.id),
        Some(json!({ "status": "rejected" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ReasonRequired");
}

#[tokio::test]
async fn unknown_application_is_404() {
    let env = test_env();
    let (status, body) = call(
        router(&env),
        "PATCH",
        &format!("/api/applications/{}/status", Uuid::new_v4()),
        Some(json!({ "status": "shortlisted" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}

#[tokio::test]
async fn double_booking_returns_409() {
    let env = test_env();
    let company = Uuid::new_v4();
    let at = Utc::now() + Duration::days(4);

    let app1 = submit_application(&env).await;
    env.state
        .lifecycle
        .transition(app1.id, ApplicationStatus::Shortlisted, None)
        .await
        .unwrap();
    let app2 = submit_application(&env).await;
    env.state
        .lifecycle
        .transition(app2.id, ApplicationStatus::Shortlisted, None)
        .await
        .unwrap();

    let (status, body) = call(
        router(&env),
        "POST",
        &format!("/api/companies/{}/interviews", company),
        Some(json!({
            "user_id": app1.user_id,
            "application_id": app1.id,
            "scheduled_at": at,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["room_id"].as_str().unwrap().starts_with("room-"));

    let (status, body) = call(
        router(&env),
        "POST",
        &format!("/api/companies/{}/interviews", company),
        Some(json!({
            "user_id": app2.user_id,
            "application_id": app2.id,
            "scheduled_at": at,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "SchedulingConflict");
}

#[tokio::test]
async fn reschedule_flow_over_http() {
    let env = test_env();
    let company = Uuid::new_v4();
    let app = submit_application(&env).await;
    env.state
        .lifecycle
        .transition(app.id, ApplicationStatus::Shortlisted, None)
        .await
        .unwrap();
    env.state
        .scheduling
        .schedule(company, app.user_id, app.id, Utc::now() + Duration::days(3))
        .await
        .unwrap();

    // Two slots: malformed proposal.
    let (status, body) = call(
        router(&env),
        "POST",
        &format!("/api/applications/{}/reschedule", app.id),
        Some(json!({
            "reason": "Interviewer unavailable",
            "time_slots": [Utc::now() + Duration::days(7), Utc::now() + Duration::days(8)],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidProposal");

    let slots = vec![
        Utc::now() + Duration::days(7),
        Utc::now() + Duration::days(8),
        Utc::now() + Duration::days(9),
    ];
    let (status, body) = call(
        router(&env),
        "POST",
        &format!("/api/applications/{}/reschedule", app.id),
        Some(json!({ "reason": "Interviewer unavailable", "time_slots": slots })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "open");

    let (status, body) = call(
        router(&env),
        "PUT",
        &format!("/api/applications/{}/reschedule-response", app.id),
        Some(json!({
            "status": "accepted",
            "selected_slot": Utc::now() + Duration::days(30),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidSlotSelection");

    let (status, body) = call(
        router(&env),
        "PUT",
        &format!("/api/applications/{}/reschedule-response", app.id),
        Some(json!({
            "status": "accepted",
            "selected_slot": slots[0],
            "responder_email": "seeker@example.com",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "interview_reschedule_accepted");
}
