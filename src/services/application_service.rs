use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::application::{
    Application, ApplicationStatus, NewApplication, StatusHistoryEntry,
};

/// What happens to `scheduled_at` alongside a status change. The change rides
/// in the same conditional UPDATE as the status itself, so readers never see
/// a status without its matching schedule field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScheduledAtChange {
    Keep,
    Set(DateTime<Utc>),
    Clear,
}

impl ScheduledAtChange {
    pub(crate) fn parts(self) -> (bool, Option<DateTime<Utc>>) {
        match self {
            ScheduledAtChange::Keep => (false, None),
            ScheduledAtChange::Set(at) => (true, Some(at)),
            ScheduledAtChange::Clear => (true, None),
        }
    }
}

/// Persistence boundary for the application aggregate.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<Application>>;

    /// Creates the aggregate in `applied` with a single history entry.
    /// A duplicate `(job_id, user_id)` pair fails with `DuplicateApplication`.
    async fn create(&self, new: NewApplication) -> Result<Application>;

    /// Conditionally appends one history entry and sets the status, in one
    /// atomic write. Returns `None` when the row no longer carries `expected`
    /// (or does not exist); the caller re-reads to tell the two apart.
    async fn append_status(
        &self,
        id: Uuid,
        expected: ApplicationStatus,
        next: ApplicationStatus,
        reason: Option<String>,
        sched: ScheduledAtChange,
    ) -> Result<Option<Application>>;
}

#[derive(Clone)]
pub struct PgApplicationService {
    pool: PgPool,
}

impl PgApplicationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicationStore for PgApplicationService {
    async fn find(&self, id: Uuid) -> Result<Option<Application>> {
        let application = sqlx::query_as::<_, Application>(
            r#"
            SELECT id, job_id, user_id, status, status_history, scheduled_at,
                   resume_url, cover_letter, notes, created_at, updated_at
            FROM applications
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(application)
    }

    async fn create(&self, new: NewApplication) -> Result<Application> {
        let initial = StatusHistoryEntry {
            status: ApplicationStatus::Applied,
            changed_at: Utc::now(),
            reason: None,
        };

        let result = sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (job_id, user_id, status, status_history, resume_url, cover_letter)
            VALUES ($1, $2, 'applied', $3, $4, $5)
            RETURNING id, job_id, user_id, status, status_history, scheduled_at,
                      resume_url, cover_letter, notes, created_at, updated_at
            "#,
        )
        .bind(new.job_id)
        .bind(new.user_id)
        .bind(json!([initial]))
        .bind(new.resume_url)
        .bind(new.cover_letter)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(application) => Ok(application),
            Err(sqlx::Error::Database(ref db)) if db.is_unique_violation() => {
                Err(Error::DuplicateApplication {
                    job_id: new.job_id,
                    user_id: new.user_id,
                })
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn append_status(
        &self,
        id: Uuid,
        expected: ApplicationStatus,
        next: ApplicationStatus,
        reason: Option<String>,
        sched: ScheduledAtChange,
    ) -> Result<Option<Application>> {
        let entry = StatusHistoryEntry {
            status: next,
            changed_at: Utc::now(),
            reason,
        };
        let (apply_sched, new_sched) = sched.parts();

        let application = sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications
            SET status = $3,
                status_history = status_history || $4::jsonb,
                scheduled_at = CASE WHEN $5 THEN $6 ELSE scheduled_at END,
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING id, job_id, user_id, status, status_history, scheduled_at,
                      resume_url, cover_letter, notes, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(expected.as_str())
        .bind(next.as_str())
        .bind(json!([entry]))
        .bind(apply_sched)
        .bind(new_sched)
        .fetch_optional(&self.pool)
        .await?;
        Ok(application)
    }
}
