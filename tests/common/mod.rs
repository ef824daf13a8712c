#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use jobboard_backend::error::{Error, Result};
use jobboard_backend::models::application::{
    Application, ApplicationStatus, NewApplication, StatusHistoryEntry,
};
use jobboard_backend::models::interview::{
    Interview, InterviewResult, NewInterview, NewProposal, ProposalStatus, RescheduleProposal,
};
use jobboard_backend::models::notification::{Notification, NotificationCategory};
use jobboard_backend::services::application_service::{ApplicationStore, ScheduledAtChange};
use jobboard_backend::services::interview_service::InterviewStore;
use jobboard_backend::services::notification_service::Notifier;
use jobboard_backend::AppState;

/// In-memory application store honoring the same semantics as the Postgres
/// one: unique `(job_id, user_id)` and a conditional status append.
#[derive(Default)]
pub struct InMemoryApplications {
    rows: Mutex<HashMap<Uuid, Application>>,
    lose_append: AtomicBool,
}

impl InMemoryApplications {
    pub fn history_len(&self, id: Uuid) -> usize {
        self.rows
            .lock()
            .unwrap()
            .get(&id)
            .map(|a| a.status_history.0.len())
            .unwrap_or(0)
    }

    /// Overwrites the stored status without touching history, simulating a
    /// concurrent writer that slipped in between validate and append.
    pub fn force_status(&self, id: Uuid, status: ApplicationStatus) {
        let mut rows = self.rows.lock().unwrap();
        if let Some(app) = rows.get_mut(&id) {
            app.status = status;
        }
    }

    /// Makes the next conditional append report a stale status, as if a
    /// concurrent writer had just won the row.
    pub fn lose_next_append(&self) {
        self.lose_append.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ApplicationStore for InMemoryApplications {
    async fn find(&self, id: Uuid) -> Result<Option<Application>> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn create(&self, new: NewApplication) -> Result<Application> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .values()
            .any(|a| a.job_id == new.job_id && a.user_id == new.user_id)
        {
            return Err(Error::DuplicateApplication {
                job_id: new.job_id,
                user_id: new.user_id,
            });
        }
        let now = Utc::now();
        let application = Application {
            id: Uuid::new_v4(),
            job_id: new.job_id,
            user_id: new.user_id,
            status: ApplicationStatus::Applied,
            status_history: Json(vec![StatusHistoryEntry {
                status: ApplicationStatus::Applied,
                changed_at: now,
                reason: None,
            }]),
            scheduled_at: None,
            resume_url: new.resume_url,
            cover_letter: new.cover_letter,
            notes: None,
            created_at: Some(now),
            updated_at: Some(now),
        };
        rows.insert(application.id, application.clone());
        Ok(application)
    }

    async fn append_status(
        &self,
        id: Uuid,
        expected: ApplicationStatus,
        next: ApplicationStatus,
        reason: Option<String>,
        sched: ScheduledAtChange,
    ) -> Result<Option<Application>> {
        if self.lose_append.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        let mut rows = self.rows.lock().unwrap();
        let Some(application) = rows.get_mut(&id) else {
            return Ok(None);
        };
        if application.status != expected {
            return Ok(None);
        }
        let now = Utc::now();
        application.status = next;
        application.status_history.0.push(StatusHistoryEntry {
            status: next,
            changed_at: now,
            reason,
        });
        match sched {
            ScheduledAtChange::Keep => {}
            ScheduledAtChange::Set(at) => application.scheduled_at = Some(at),
            ScheduledAtChange::Clear => application.scheduled_at = None,
        }
        application.updated_at = Some(now);
        Ok(Some(application.clone()))
    }
}

#[derive(Default)]
pub struct InMemoryInterviews {
    interviews: Mutex<HashMap<Uuid, Interview>>,
    proposals: Mutex<HashMap<Uuid, RescheduleProposal>>,
}

impl InMemoryInterviews {
    pub fn interview_count(&self) -> usize {
        self.interviews.lock().unwrap().len()
    }
}

#[async_trait]
impl InterviewStore for InMemoryInterviews {
    async fn find(&self, id: Uuid) -> Result<Option<Interview>> {
        Ok(self.interviews.lock().unwrap().get(&id).cloned())
    }

    async fn find_at(&self, company_id: Uuid, at: DateTime<Utc>) -> Result<Option<Interview>> {
        Ok(self
            .interviews
            .lock()
            .unwrap()
            .values()
            .find(|i| i.company_id == company_id && i.scheduled_at == at)
            .cloned())
    }

    async fn find_by_application(&self, application_id: Uuid) -> Result<Option<Interview>> {
        Ok(self
            .interviews
            .lock()
            .unwrap()
            .values()
            .find(|i| i.application_id == application_id)
            .cloned())
    }

    async fn insert(&self, new: NewInterview) -> Result<Interview> {
        let mut interviews = self.interviews.lock().unwrap();
        if interviews
            .values()
            .any(|i| i.company_id == new.company_id && i.scheduled_at == new.scheduled_at)
        {
            return Err(Error::SchedulingConflict {
                company_id: new.company_id,
                scheduled_at: new.scheduled_at,
            });
        }
        let now = Utc::now();
        let interview = Interview {
            id: Uuid::new_v4(),
            company_id: new.company_id,
            user_id: new.user_id,
            application_id: new.application_id,
            scheduled_at: new.scheduled_at,
            room_id: new.room_id,
            result: None,
            created_at: Some(now),
            updated_at: Some(now),
        };
        interviews.insert(interview.id, interview.clone());
        Ok(interview)
    }

    async fn reschedule(&self, id: Uuid, at: DateTime<Utc>) -> Result<Interview> {
        let mut interviews = self.interviews.lock().unwrap();
        let company_id = interviews
            .get(&id)
            .map(|i| i.company_id)
            .ok_or_else(|| Error::NotFound(format!("Interview {} not found", id)))?;
        if interviews
            .values()
            .any(|i| i.id != id && i.company_id == company_id && i.scheduled_at == at)
        {
            return Err(Error::SchedulingConflict {
                company_id,
                scheduled_at: at,
            });
        }
        let interview = interviews.get_mut(&id).unwrap();
        interview.scheduled_at = at;
        interview.updated_at = Some(Utc::now());
        Ok(interview.clone())
    }

    async fn set_result(&self, id: Uuid, result: InterviewResult) -> Result<Option<Interview>> {
        let mut interviews = self.interviews.lock().unwrap();
        let interview = interviews
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Interview {} not found", id)))?;
        if interview.result.is_some() {
            return Ok(None);
        }
        interview.result = Some(result.as_str().to_string());
        interview.updated_at = Some(Utc::now());
        Ok(Some(interview.clone()))
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        self.interviews.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn insert_proposal(&self, new: NewProposal) -> Result<RescheduleProposal> {
        let mut proposals = self.proposals.lock().unwrap();
        if proposals
            .values()
            .any(|p| p.application_id == new.application_id && p.status == "open")
        {
            return Err(Error::InvalidProposal(
                "an open reschedule proposal already exists for this application".to_string(),
            ));
        }
        let proposal = RescheduleProposal {
            id: Uuid::new_v4(),
            application_id: new.application_id,
            reason: new.reason,
            slots: Json(new.slots),
            status: "open".to_string(),
            responder_email: None,
            selected_slot: None,
            created_at: Some(Utc::now()),
            resolved_at: None,
        };
        proposals.insert(proposal.id, proposal.clone());
        Ok(proposal)
    }

    async fn open_proposal(&self, application_id: Uuid) -> Result<Option<RescheduleProposal>> {
        Ok(self
            .proposals
            .lock()
            .unwrap()
            .values()
            .find(|p| p.application_id == application_id && p.status == "open")
            .cloned())
    }

    async fn resolve_proposal(
        &self,
        id: Uuid,
        status: ProposalStatus,
        responder_email: Option<String>,
        selected_slot: Option<DateTime<Utc>>,
    ) -> Result<RescheduleProposal> {
        let mut proposals = self.proposals.lock().unwrap();
        let proposal = proposals
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Proposal {} not found", id)))?;
        proposal.status = status.as_str().to_string();
        proposal.responder_email = responder_email;
        proposal.selected_slot = selected_slot;
        proposal.resolved_at = Some(Utc::now());
        Ok(proposal.clone())
    }
}

/// Records every dispatched notification; can be switched into a failing mode
/// to verify dispatch failures never surface to callers.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
    pub fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        user_id: Uuid,
        content: &str,
        category: NotificationCategory,
        related_id: Option<Uuid>,
    ) -> Result<Notification> {
        if self.fail.swap(false, Ordering::SeqCst) {
            return Err(Error::Internal("notification channel down".to_string()));
        }
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id,
            content: content.to_string(),
            category: category.as_str().to_string(),
            related_id,
            is_read: false,
            created_at: Some(Utc::now()),
        };
        self.sent.lock().unwrap().push(notification.clone());
        Ok(notification)
    }
}

pub struct TestEnv {
    pub state: AppState,
    pub applications: Arc<InMemoryApplications>,
    pub interviews: Arc<InMemoryInterviews>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn test_env() -> TestEnv {
    let applications = Arc::new(InMemoryApplications::default());
    let interviews = Arc::new(InMemoryInterviews::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState::from_parts(
        applications.clone(),
        interviews.clone(),
        notifier.clone(),
    );
    TestEnv {
        state,
        applications,
        interviews,
        notifier,
    }
}

pub async fn submit_application(env: &TestEnv) -> Application {
    env.applications
        .create(NewApplication {
            job_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            resume_url: Some("uploads/resume.pdf".to_string()),
            cover_letter: None,
        })
        .await
        .expect("create application")
}
