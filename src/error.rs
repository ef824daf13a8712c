use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::models::application::ApplicationStatus;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transition from {from} to {to} is not permitted")]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },

    #[error("A reason is required when moving to {0}")]
    ReasonRequired(ApplicationStatus),

    #[error("Company {company_id} already has an interview at {scheduled_at}")]
    SchedulingConflict {
        company_id: Uuid,
        scheduled_at: DateTime<Utc>,
    },

    #[error("Invalid reschedule proposal: {0}")]
    InvalidProposal(String),

    #[error("Selected slot is not one of the proposed times")]
    InvalidSlotSelection,

    #[error("User {user_id} has already applied to job {job_id}")]
    DuplicateApplication { job_id: Uuid, user_id: Uuid },

    #[error("Unknown application status: {0}")]
    UnknownStatus(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let code = self.code();
        let (status, body) = match self {
            Error::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": code, "message": msg }),
            ),
            Error::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "error": code, "message": msg }),
            ),
            Error::InvalidTransition { from, to } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": code, "from": from, "to": to }),
            ),
            Error::ReasonRequired(to) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": code, "to": to }),
            ),
            Error::SchedulingConflict {
                company_id,
                scheduled_at,
            } => (
                StatusCode::CONFLICT,
                json!({
                    "error": code,
                    "company_id": company_id,
                    "scheduled_at": scheduled_at,
                }),
            ),
            Error::InvalidProposal(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": code, "message": msg }),
            ),
            Error::InvalidSlotSelection => {
                (StatusCode::BAD_REQUEST, json!({ "error": code }))
            }
            Error::DuplicateApplication { job_id, user_id } => (
                StatusCode::CONFLICT,
                json!({
                    "error": code,
                    "job_id": job_id,
                    "user_id": user_id,
                }),
            ),
            Error::Validation(err) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": code, "message": err.to_string() }),
            ),
            Error::Json(err) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": code, "message": err.to_string() }),
            ),
            Error::UnknownStatus(s) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": code, "status": s }),
            ),
            Error::Database(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": code, "message": err.to_string() }),
            ),
            Error::Config(msg) | Error::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": code, "message": msg }),
            ),
            Error::Io(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": code, "message": err.to_string() }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}

impl Error {
    /// Stable machine-readable code, mirrors the `error` field of the HTTP body.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "Internal",
            Error::BadRequest(_) => "BadRequest",
            Error::NotFound(_) => "NotFound",
            Error::InvalidTransition { .. } => "InvalidTransition",
            Error::ReasonRequired(_) => "ReasonRequired",
            Error::SchedulingConflict { .. } => "SchedulingConflict",
            Error::InvalidProposal(_) => "InvalidProposal",
            Error::InvalidSlotSelection => "InvalidSlotSelection",
            Error::DuplicateApplication { .. } => "DuplicateApplication",
            Error::UnknownStatus(_) => "UnknownStatus",
            Error::Database(_) => "Database",
            Error::Validation(_) => "Validation",
            Error::Json(_) => "Json",
            Error::Internal(_) => "Internal",
            Error::Io(_) => "Internal",
        }
    }
}
