use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle state of an application. The enum is closed on purpose: every
/// status the system knows about is listed here and the transition table
/// below is an exhaustive match, so adding a variant without wiring it up is
/// a compile error rather than a silently-allowed status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Applied,
    Shortlisted,
    Rejected,
    Withdrawn,
    InterviewScheduled,
    InterviewCancelled,
    InterviewAcceptedByUser,
    InterviewRejectedByUser,
    InterviewRescheduleProposed,
    InterviewRescheduleAccepted,
    InterviewRescheduleRejected,
    InterviewCompleted,
    InterviewPassed,
    InterviewFailed,
    Offered,
    Hired,
    Selected,
}

impl ApplicationStatus {
    /// The set of statuses directly reachable from `self`. Terminal statuses
    /// return an empty slice. No status ever re-enters `applied`.
    pub fn allowed_transitions(self) -> &'static [ApplicationStatus] {
        use ApplicationStatus::*;
        match self {
            Applied => &[Shortlisted, Rejected, Withdrawn],
            Shortlisted => &[InterviewScheduled, Rejected, Withdrawn],
            InterviewScheduled => &[
                InterviewCancelled,
                InterviewAcceptedByUser,
                InterviewRejectedByUser,
                InterviewRescheduleProposed,
            ],
            InterviewAcceptedByUser => &[InterviewCompleted, InterviewRescheduleProposed],
            InterviewRescheduleProposed => {
                &[InterviewRescheduleAccepted, InterviewRescheduleRejected]
            }
            InterviewRescheduleAccepted => &[
                InterviewCompleted,
                InterviewRescheduleProposed,
                InterviewCancelled,
            ],
            InterviewCompleted => &[InterviewPassed, InterviewFailed],
            InterviewPassed => &[Offered],
            Offered => &[Hired, Withdrawn],
            InterviewRejectedByUser
            | InterviewCancelled
            | InterviewRescheduleRejected
            | InterviewFailed
            | Rejected
            | Withdrawn
            | Hired
            | Selected => &[],
        }
    }

    pub fn can_transition_to(self, to: ApplicationStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Transitions into these statuses must carry a non-empty reason.
    pub fn requires_reason(self) -> bool {
        use ApplicationStatus::*;
        matches!(
            self,
            Rejected | InterviewCancelled | InterviewRejectedByUser | Withdrawn
        )
    }

    /// Statuses during which `scheduled_at` stays on the application. Leaving
    /// this family clears the field.
    pub fn keeps_schedule(self) -> bool {
        use ApplicationStatus::*;
        matches!(
            self,
            InterviewScheduled
                | InterviewAcceptedByUser
                | InterviewRescheduleProposed
                | InterviewRescheduleAccepted
                | InterviewCompleted
        )
    }

    /// Statuses owned by the scheduling, reschedule and result flows. A bare
    /// status PATCH may not enter them; the flows carry the data (confirmed
    /// time, slot selection, interview outcome) those transitions depend on.
    pub fn set_by_scheduling_flow(self) -> bool {
        use ApplicationStatus::*;
        matches!(
            self,
            InterviewScheduled
                | InterviewRescheduleProposed
                | InterviewRescheduleAccepted
                | InterviewRescheduleRejected
                | InterviewPassed
                | InterviewFailed
        )
    }

    pub fn as_str(self) -> &'static str {
        use ApplicationStatus::*;
        match self {
            Applied => "applied",
            Shortlisted => "shortlisted",
            Rejected => "rejected",
            Withdrawn => "withdrawn",
            InterviewScheduled => "interview_scheduled",
            InterviewCancelled => "interview_cancelled",
            InterviewAcceptedByUser => "interview_accepted_by_user",
            InterviewRejectedByUser => "interview_rejected_by_user",
            InterviewRescheduleProposed => "interview_reschedule_proposed",
            InterviewRescheduleAccepted => "interview_reschedule_accepted",
            InterviewRescheduleRejected => "interview_reschedule_rejected",
            InterviewCompleted => "interview_completed",
            InterviewPassed => "interview_passed",
            InterviewFailed => "interview_failed",
            Offered => "offered",
            Hired => "hired",
            Selected => "selected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        use ApplicationStatus::*;
        Some(match s {
            "applied" => Applied,
            "shortlisted" => Shortlisted,
            "rejected" => Rejected,
            "withdrawn" => Withdrawn,
            "interview_scheduled" => InterviewScheduled,
            "interview_cancelled" => InterviewCancelled,
            "interview_accepted_by_user" => InterviewAcceptedByUser,
            "interview_rejected_by_user" => InterviewRejectedByUser,
            "interview_reschedule_proposed" => InterviewRescheduleProposed,
            "interview_reschedule_accepted" => InterviewRescheduleAccepted,
            "interview_reschedule_rejected" => InterviewRescheduleRejected,
            "interview_completed" => InterviewCompleted,
            "interview_passed" => InterviewPassed,
            "interview_failed" => InterviewFailed,
            "offered" => Offered,
            "hired" => Hired,
            "selected" => Selected,
            _ => return None,
        })
    }

    pub const ALL: [ApplicationStatus; 17] = {
        use ApplicationStatus::*;
        [
            Applied,
            Shortlisted,
            Rejected,
            Withdrawn,
            InterviewScheduled,
            InterviewCancelled,
            InterviewAcceptedByUser,
            InterviewRejectedByUser,
            InterviewRescheduleProposed,
            InterviewRescheduleAccepted,
            InterviewRescheduleRejected,
            InterviewCompleted,
            InterviewPassed,
            InterviewFailed,
            Offered,
            Hired,
            Selected,
        ]
    };
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ApplicationStatus {
    type Error = crate::error::Error;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        ApplicationStatus::parse(&value).ok_or(crate::error::Error::UnknownStatus(value))
    }
}

/// One append-only entry of the status history. Field names are part of the
/// persisted contract consumed by external reporting tools, hence camelCase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub status: ApplicationStatus,
    pub changed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub user_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: ApplicationStatus,
    pub status_history: Json<Vec<StatusHistoryEntry>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub resume_url: Option<String>,
    pub cover_letter: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Application {
    pub fn last_history_entry(&self) -> Option<&StatusHistoryEntry> {
        self.status_history.0.last()
    }
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub resume_url: Option<String>,
    pub cover_letter: Option<String>,
}
