use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::application_dto::{
        CreateApplicationPayload, ProposeReschedulePayload, RescheduleResponsePayload,
        UpdateStatusPayload,
    },
    error::Result,
    models::application::NewApplication,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/applications",
    request_body = CreateApplicationPayload,
    responses(
        (status = 201, description = "Application submitted"),
        (status = 409, description = "User already applied to this job")
    )
)]
#[axum::debug_handler]
pub async fn create_application(
    State(state): State<AppState>,
    Json(payload): Json<CreateApplicationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let application = state
        .applications
        .create(NewApplication {
            job_id: payload.job_id,
            user_id: payload.user_id,
            resume_url: payload.resume_url,
            cover_letter: payload.cover_letter,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

#[axum::debug_handler]
pub async fn get_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let application = state.applications.find(id).await?;
    match application {
        Some(application) => Ok(Json(application)),
        None => Err(crate::error::Error::NotFound(format!(
            "Application {} not found",
            id
        ))),
    }
}

#[axum::debug_handler]
pub async fn get_application_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let application = state
        .applications
        .find(id)
        .await?
        .ok_or_else(|| crate::error::Error::NotFound(format!("Application {} not found", id)))?;
    Ok(Json(application.status_history))
}

#[utoipa::path(
    patch,
    path = "/api/applications/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Status changed"),
        (status = 400, description = "InvalidTransition or ReasonRequired"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse> {
    let application = state
        .lifecycle
        .transition(id, payload.status, payload.reason)
        .await?;
    Ok(Json(application))
}

#[utoipa::path(
    post,
    path = "/api/applications/{id}/reschedule",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = ProposeReschedulePayload,
    responses(
        (status = 201, description = "Reschedule proposal opened"),
        (status = 400, description = "InvalidProposal")
    )
)]
#[axum::debug_handler]
pub async fn propose_reschedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProposeReschedulePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let proposal = state
        .scheduling
        .propose_reschedule(id, payload.reason, payload.time_slots)
        .await?;
    Ok((StatusCode::CREATED, Json(proposal)))
}

#[utoipa::path(
    put,
    path = "/api/applications/{id}/reschedule-response",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = RescheduleResponsePayload,
    responses(
        (status = 200, description = "Proposal resolved"),
        (status = 400, description = "InvalidSlotSelection")
    )
)]
#[axum::debug_handler]
pub async fn respond_reschedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RescheduleResponsePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let application = state
        .scheduling
        .resolve_reschedule(
            id,
            payload.status,
            payload.selected_slot,
            payload.responder_email,
        )
        .await?;
    Ok(Json(application))
}
