use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::application::ApplicationStatus;
use crate::services::scheduling_service::RescheduleResponse;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateApplicationPayload {
    pub job_id: Uuid,
    pub user_id: Uuid,
    #[validate(length(min = 1))]
    pub resume_url: Option<String>,
    pub cover_letter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusPayload {
    pub status: ApplicationStatus,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProposeReschedulePayload {
    #[validate(length(min = 1))]
    pub reason: String,
    pub time_slots: Vec<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RescheduleResponsePayload {
    pub status: RescheduleResponse,
    pub selected_slot: Option<DateTime<Utc>>,
    #[validate(email)]
    pub responder_email: Option<String>,
}
