use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::interview::{
    Interview, InterviewResult, NewInterview, NewProposal, ProposalStatus, RescheduleProposal,
};

/// Persistence boundary for interviews and reschedule proposals. Uniqueness
/// of `(company_id, scheduled_at)` and of the open proposal per application
/// is enforced by the store, not by callers; the find helpers are fast-path
/// probes only.
#[async_trait]
pub trait InterviewStore: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<Interview>>;

    async fn find_at(&self, company_id: Uuid, at: DateTime<Utc>) -> Result<Option<Interview>>;

    async fn find_by_application(&self, application_id: Uuid) -> Result<Option<Interview>>;

    /// Fails with `SchedulingConflict` when the company already has an
    /// interview at that time.
    async fn insert(&self, new: NewInterview) -> Result<Interview>;

    /// Moves an existing interview to a new time, under the same conflict
    /// rule as `insert`.
    async fn reschedule(&self, id: Uuid, at: DateTime<Utc>) -> Result<Interview>;

    /// Records the outcome once. Returns `None` when a result is already
    /// stored, so a late caller can never overwrite the first one.
    async fn set_result(&self, id: Uuid, result: InterviewResult) -> Result<Option<Interview>>;

    /// Compensation for a booking whose status transition did not commit.
    /// Finished interviews are never removed.
    async fn remove(&self, id: Uuid) -> Result<()>;

    /// Fails with `InvalidProposal` when the application already has an open
    /// proposal.
    async fn insert_proposal(&self, new: NewProposal) -> Result<RescheduleProposal>;

    async fn open_proposal(&self, application_id: Uuid) -> Result<Option<RescheduleProposal>>;

    async fn resolve_proposal(
        &self,
        id: Uuid,
        status: ProposalStatus,
        responder_email: Option<String>,
        selected_slot: Option<DateTime<Utc>>,
    ) -> Result<RescheduleProposal>;
}

const INTERVIEW_COLUMNS: &str =
    "id, company_id, user_id, application_id, scheduled_at, room_id, result, created_at, updated_at";

const PROPOSAL_COLUMNS: &str =
    "id, application_id, reason, slots, status, responder_email, selected_slot, created_at, resolved_at";

#[derive(Clone)]
pub struct PgInterviewService {
    pool: PgPool,
}

impl PgInterviewService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InterviewStore for PgInterviewService {
    async fn find(&self, id: Uuid) -> Result<Option<Interview>> {
        let interview = sqlx::query_as::<_, Interview>(&format!(
            "SELECT {} FROM interviews WHERE id = $1",
            INTERVIEW_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(interview)
    }

    async fn find_at(&self, company_id: Uuid, at: DateTime<Utc>) -> Result<Option<Interview>> {
        let interview = sqlx::query_as::<_, Interview>(&format!(
            "SELECT {} FROM interviews WHERE company_id = $1 AND scheduled_at = $2",
            INTERVIEW_COLUMNS
        ))
        .bind(company_id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(interview)
    }

    async fn find_by_application(&self, application_id: Uuid) -> Result<Option<Interview>> {
        let interview = sqlx::query_as::<_, Interview>(&format!(
            "SELECT {} FROM interviews WHERE application_id = $1 ORDER BY created_at DESC LIMIT 1",
            INTERVIEW_COLUMNS
        ))
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(interview)
    }

    async fn insert(&self, new: NewInterview) -> Result<Interview> {
        let result = sqlx::query_as::<_, Interview>(&format!(
            r#"
            INSERT INTO interviews (company_id, user_id, application_id, scheduled_at, room_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            INTERVIEW_COLUMNS
        ))
        .bind(new.company_id)
        .bind(new.user_id)
        .bind(new.application_id)
        .bind(new.scheduled_at)
        .bind(new.room_id)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(interview) => Ok(interview),
            Err(sqlx::Error::Database(ref db)) if db.is_unique_violation() => {
                Err(Error::SchedulingConflict {
                    company_id: new.company_id,
                    scheduled_at: new.scheduled_at,
                })
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn reschedule(&self, id: Uuid, at: DateTime<Utc>) -> Result<Interview> {
        let result = sqlx::query_as::<_, Interview>(&format!(
            "UPDATE interviews SET scheduled_at = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            INTERVIEW_COLUMNS
        ))
        .bind(id)
        .bind(at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(interview) => Ok(interview),
            Err(sqlx::Error::Database(ref db)) if db.is_unique_violation() => {
                let existing = self.find(id).await?;
                Err(Error::SchedulingConflict {
                    company_id: existing.map(|i| i.company_id).unwrap_or_default(),
                    scheduled_at: at,
                })
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn set_result(&self, id: Uuid, result: InterviewResult) -> Result<Option<Interview>> {
        let interview = sqlx::query_as::<_, Interview>(&format!(
            "UPDATE interviews SET result = $2, updated_at = NOW() WHERE id = $1 AND result IS NULL RETURNING {}",
            INTERVIEW_COLUMNS
        ))
        .bind(id)
        .bind(result.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(interview)
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM interviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_proposal(&self, new: NewProposal) -> Result<RescheduleProposal> {
        let result = sqlx::query_as::<_, RescheduleProposal>(&format!(
            r#"
            INSERT INTO reschedule_proposals (application_id, reason, slots, status)
            VALUES ($1, $2, $3, 'open')
            RETURNING {}
            "#,
            PROPOSAL_COLUMNS
        ))
        .bind(new.application_id)
        .bind(&new.reason)
        .bind(json!(new.slots))
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(proposal) => Ok(proposal),
            Err(sqlx::Error::Database(ref db)) if db.is_unique_violation() => {
                Err(Error::InvalidProposal(
                    "an open reschedule proposal already exists for this application".to_string(),
                ))
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn open_proposal(&self, application_id: Uuid) -> Result<Option<RescheduleProposal>> {
        let proposal = sqlx::query_as::<_, RescheduleProposal>(&format!(
            "SELECT {} FROM reschedule_proposals WHERE application_id = $1 AND status = 'open'",
            PROPOSAL_COLUMNS
        ))
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(proposal)
    }

    async fn resolve_proposal(
        &self,
        id: Uuid,
        status: ProposalStatus,
        responder_email: Option<String>,
        selected_slot: Option<DateTime<Utc>>,
    ) -> Result<RescheduleProposal> {
        let proposal = sqlx::query_as::<_, RescheduleProposal>(&format!(
            r#"
            UPDATE reschedule_proposals
            SET status = $2, responder_email = $3, selected_slot = $4, resolved_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PROPOSAL_COLUMNS
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(responder_email)
        .bind(selected_slot)
        .fetch_one(&self.pool)
        .await?;
        Ok(proposal)
    }
}
