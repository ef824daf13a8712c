use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::interview::InterviewResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInterviewPayload {
    pub user_id: Uuid,
    pub application_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordResultPayload {
    pub result: InterviewResult,
}
