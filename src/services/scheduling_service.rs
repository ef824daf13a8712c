use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationStatus};
use crate::models::interview::{
    Interview, InterviewResult, NewInterview, NewProposal, ProposalStatus, RescheduleProposal,
};
use crate::models::notification::NotificationCategory;
use crate::services::application_service::{ApplicationStore, ScheduledAtChange};
use crate::services::interview_service::InterviewStore;
use crate::services::lifecycle_service::LifecycleService;
use crate::services::notification_service::Notifier;
use crate::utils::token::generate_room_token;

/// The seeker's answer to a reschedule proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RescheduleResponse {
    Accepted,
    Rejected,
}

/// Creates interviews, guards against double-booking and runs the
/// proposer/responder reschedule protocol. Every application status change
/// still goes through the lifecycle engine; this service owns the statuses a
/// bare status PATCH may not enter.
#[derive(Clone)]
pub struct SchedulingService {
    interviews: Arc<dyn InterviewStore>,
    applications: Arc<dyn ApplicationStore>,
    notifier: Arc<dyn Notifier>,
    lifecycle: LifecycleService,
}

impl SchedulingService {
    pub fn new(
        interviews: Arc<dyn InterviewStore>,
        applications: Arc<dyn ApplicationStore>,
        notifier: Arc<dyn Notifier>,
        lifecycle: LifecycleService,
    ) -> Self {
        Self {
            interviews,
            applications,
            notifier,
            lifecycle,
        }
    }

    /// Books an interview slot for a company. The `find_at` probe is only a
    /// fast path; the unique index on `(company_id, scheduled_at)` is what
    /// actually closes the find-then-insert race.
    pub async fn schedule(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        application_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Interview> {
        if self.interviews.find_at(company_id, at).await?.is_some() {
            return Err(Error::SchedulingConflict {
                company_id,
                scheduled_at: at,
            });
        }

        // Validate the application can enter interview_scheduled before any
        // interview row exists, so an illegal request leaves nothing behind.
        let application = self
            .applications
            .find(application_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Application {} not found", application_id)))?;
        if !application
            .status
            .can_transition_to(ApplicationStatus::InterviewScheduled)
        {
            return Err(Error::InvalidTransition {
                from: application.status,
                to: ApplicationStatus::InterviewScheduled,
            });
        }

        let interview = self
            .interviews
            .insert(NewInterview {
                company_id,
                user_id,
                application_id,
                scheduled_at: at,
                room_id: generate_room_token(),
            })
            .await?;

        match self
            .lifecycle
            .apply(
                application_id,
                ApplicationStatus::InterviewScheduled,
                None,
                ScheduledAtChange::Set(at),
            )
            .await
        {
            Ok(_) => Ok(interview),
            Err(err) => {
                // Lost the transition race: remove the booking so the slot is
                // not blocked by an interview that never took effect.
                if let Err(cleanup) = self.interviews.remove(interview.id).await {
                    tracing::error!(
                        interview_id = %interview.id,
                        error = ?cleanup,
                        "failed to remove orphaned interview booking"
                    );
                }
                Err(err)
            }
        }
    }

    /// Opens a reschedule proposal: exactly three candidate slots and a
    /// non-blank reason.
    pub async fn propose_reschedule(
        &self,
        application_id: Uuid,
        reason: String,
        slots: Vec<DateTime<Utc>>,
    ) -> Result<RescheduleProposal> {
        if slots.len() != 3 {
            return Err(Error::InvalidProposal(format!(
                "exactly 3 candidate slots are required, got {}",
                slots.len()
            )));
        }
        if reason.trim().is_empty() {
            return Err(Error::InvalidProposal("reason must not be blank".to_string()));
        }

        let application = self
            .applications
            .find(application_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Application {} not found", application_id)))?;
        if !application
            .status
            .can_transition_to(ApplicationStatus::InterviewRescheduleProposed)
        {
            return Err(Error::InvalidTransition {
                from: application.status,
                to: ApplicationStatus::InterviewRescheduleProposed,
            });
        }

        let proposal = self
            .interviews
            .insert_proposal(NewProposal {
                application_id,
                reason: reason.clone(),
                slots,
            })
            .await?;

        match self
            .lifecycle
            .apply(
                application_id,
                ApplicationStatus::InterviewRescheduleProposed,
                Some(reason),
                ScheduledAtChange::Keep,
            )
            .await
        {
            Ok(_) => Ok(proposal),
            Err(err) => {
                // Lost the transition race: close the proposal we just opened
                // so the application is not left with a dangling open offer.
                if let Err(cleanup) = self
                    .interviews
                    .resolve_proposal(proposal.id, ProposalStatus::Rejected, None, None)
                    .await
                {
                    tracing::error!(
                        proposal_id = %proposal.id,
                        error = ?cleanup,
                        "failed to close orphaned reschedule proposal"
                    );
                }
                Err(err)
            }
        }
    }

    /// Resolves an open proposal. Acceptance must name one of the three
    /// proposed slots; rejection is terminal for the application.
    pub async fn resolve_reschedule(
        &self,
        application_id: Uuid,
        response: RescheduleResponse,
        selected_slot: Option<DateTime<Utc>>,
        responder_email: Option<String>,
    ) -> Result<Application> {
        let proposal = self
            .interviews
            .open_proposal(application_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "No open reschedule proposal for application {}",
                    application_id
                ))
            })?;

        match response {
            RescheduleResponse::Accepted => {
                let slot = selected_slot.ok_or(Error::InvalidSlotSelection)?;
                if !proposal.slots.0.contains(&slot) {
                    return Err(Error::InvalidSlotSelection);
                }

                let interview = self
                    .interviews
                    .find_by_application(application_id)
                    .await?
                    .ok_or_else(|| {
                        Error::NotFound(format!(
                            "No interview found for application {}",
                            application_id
                        ))
                    })?;
                self.interviews.reschedule(interview.id, slot).await?;

                let application = self
                    .lifecycle
                    .apply(
                        application_id,
                        ApplicationStatus::InterviewRescheduleAccepted,
                        None,
                        ScheduledAtChange::Set(slot),
                    )
                    .await?;

                self.interviews
                    .resolve_proposal(
                        proposal.id,
                        ProposalStatus::Accepted,
                        responder_email,
                        Some(slot),
                    )
                    .await?;

                self.notify_company(
                    interview.company_id,
                    &format!("The candidate accepted the rescheduled interview time {}.", slot.to_rfc3339()),
                    interview.id,
                )
                .await;

                Ok(application)
            }
            RescheduleResponse::Rejected => {
                let application = self
                    .lifecycle
                    .apply(
                        application_id,
                        ApplicationStatus::InterviewRescheduleRejected,
                        None,
                        ScheduledAtChange::Keep,
                    )
                    .await?;

                self.interviews
                    .resolve_proposal(proposal.id, ProposalStatus::Rejected, responder_email, None)
                    .await?;

                if let Some(interview) =
                    self.interviews.find_by_application(application_id).await?
                {
                    self.notify_company(
                        interview.company_id,
                        "The candidate rejected all proposed interview times.",
                        interview.id,
                    )
                    .await;
                }

                Ok(application)
            }
        }
    }

    /// Records the interview outcome. Only legal once the linked application
    /// has reached interview_completed; the outcome drives the application to
    /// interview_passed or interview_failed.
    pub async fn record_result(
        &self,
        interview_id: Uuid,
        result: InterviewResult,
    ) -> Result<Interview> {
        let interview = self
            .interviews
            .find(interview_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Interview {} not found", interview_id)))?;

        let to = match result {
            InterviewResult::Pass => ApplicationStatus::InterviewPassed,
            InterviewResult::Fail => ApplicationStatus::InterviewFailed,
        };

        let application = self
            .applications
            .find(interview.application_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "Application {} not found",
                    interview.application_id
                ))
            })?;
        if application.status != ApplicationStatus::InterviewCompleted {
            return Err(Error::InvalidTransition {
                from: application.status,
                to,
            });
        }

        // The conditional write claims the interview: of two racing callers
        // only the first stores an outcome, and only that caller goes on to
        // move the application.
        let interview = self
            .interviews
            .set_result(interview_id, result)
            .await?
            .ok_or(Error::InvalidTransition {
                from: application.status,
                to,
            })?;

        self.lifecycle
            .apply(application.id, to, None, ScheduledAtChange::Keep)
            .await?;

        Ok(interview)
    }

    async fn notify_company(&self, company_id: Uuid, content: &str, interview_id: Uuid) {
        if let Err(err) = self
            .notifier
            .send(
                company_id,
                content,
                NotificationCategory::Interview,
                Some(interview_id),
            )
            .await
        {
            tracing::warn!(
                company_id = %company_id,
                error = ?err,
                "company notification dispatch failed"
            );
        }
    }
}
