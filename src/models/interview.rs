use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Interview {
    pub id: Uuid,
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub application_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub room_id: String,
    pub result: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewResult {
    Pass,
    Fail,
}

impl InterviewResult {
    pub fn as_str(self) -> &'static str {
        match self {
            InterviewResult::Pass => "pass",
            InterviewResult::Fail => "fail",
        }
    }
}

impl std::fmt::Display for InterviewResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct NewInterview {
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub application_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub room_id: String,
}

/// A company's offer of exactly three alternative interview times. At most
/// one proposal per application may be open at a time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RescheduleProposal {
    pub id: Uuid,
    pub application_id: Uuid,
    pub reason: String,
    pub slots: Json<Vec<DateTime<Utc>>>,
    pub status: String,
    pub responder_email: Option<String>,
    pub selected_slot: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Open,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProposalStatus::Open => "open",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewProposal {
    pub application_id: Uuid,
    pub reason: String,
    pub slots: Vec<DateTime<Utc>>,
}
