use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::{
    dto::interview_dto::{RecordResultPayload, ScheduleInterviewPayload},
    error::Result,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/companies/{id}/interviews",
    params(
        ("id" = Uuid, Path, description = "Company ID")
    ),
    request_body = ScheduleInterviewPayload,
    responses(
        (status = 201, description = "Interview scheduled"),
        (status = 409, description = "SchedulingConflict")
    )
)]
#[axum::debug_handler]
pub async fn schedule_interview(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<ScheduleInterviewPayload>,
) -> Result<impl IntoResponse> {
    let interview = state
        .scheduling
        .schedule(
            company_id,
            payload.user_id,
            payload.application_id,
            payload.scheduled_at,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(interview)))
}

#[axum::debug_handler]
pub async fn record_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordResultPayload>,
) -> Result<impl IntoResponse> {
    let interview = state.scheduling.record_result(id, payload.result).await?;
    Ok(Json(interview))
}
