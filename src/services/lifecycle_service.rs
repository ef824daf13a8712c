use std::sync::Arc;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationStatus};
use crate::models::notification::NotificationCategory;
use crate::services::application_service::{ApplicationStore, ScheduledAtChange};
use crate::services::notification_service::Notifier;

/// The single place where a status change is authorized, persisted and
/// announced. Concurrency safety comes from the store's conditional append:
/// the update only lands if the row still carries the status that was
/// validated, so two mutually exclusive requests cannot both succeed.
#[derive(Clone)]
pub struct LifecycleService {
    applications: Arc<dyn ApplicationStore>,
    notifier: Arc<dyn Notifier>,
}

impl LifecycleService {
    pub fn new(applications: Arc<dyn ApplicationStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            applications,
            notifier,
        }
    }

    /// Transition path for a bare status change request. Statuses owned by
    /// the scheduling, reschedule and result flows are refused here; they
    /// carry data this call does not have.
    pub async fn transition(
        &self,
        id: Uuid,
        to: ApplicationStatus,
        reason: Option<String>,
    ) -> Result<Application> {
        if to.set_by_scheduling_flow() {
            return Err(Error::BadRequest(format!(
                "status {} is set by the interview scheduling flow",
                to
            )));
        }
        self.apply(id, to, reason, ScheduledAtChange::Keep).await
    }

    /// Shared transition engine: load, check the table, enforce the reason
    /// rule, append conditionally, notify once.
    pub(crate) async fn apply(
        &self,
        id: Uuid,
        to: ApplicationStatus,
        reason: Option<String>,
        sched: ScheduledAtChange,
    ) -> Result<Application> {
        let application = self
            .applications
            .find(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Application {} not found", id)))?;
        let from = application.status;

        if !from.can_transition_to(to) {
            return Err(Error::InvalidTransition { from, to });
        }

        if to.requires_reason()
            && reason.as_deref().map(str::trim).map_or(true, str::is_empty)
        {
            return Err(Error::ReasonRequired(to));
        }

        // Leaving the interview family drops the confirmed time.
        let sched = match sched {
            ScheduledAtChange::Keep if !to.keeps_schedule() => ScheduledAtChange::Clear,
            other => other,
        };

        match self
            .applications
            .append_status(id, from, to, reason.clone(), sched)
            .await?
        {
            Some(updated) => {
                tracing::info!(
                    application_id = %id,
                    from = %from,
                    to = %to,
                    "application status changed"
                );
                self.notify_seeker(&updated, reason.as_deref()).await;
                Ok(updated)
            }
            None => {
                // A concurrent writer got there first (or the row vanished).
                // Report against the fresh state so the caller can re-read
                // and retry.
                match self.applications.find(id).await? {
                    Some(current) => Err(Error::InvalidTransition {
                        from: current.status,
                        to,
                    }),
                    None => Err(Error::NotFound(format!("Application {} not found", id))),
                }
            }
        }
    }

    /// One notification per committed transition. Dispatch failures must
    /// never make an already-persisted change look failed, so they are
    /// logged and swallowed.
    async fn notify_seeker(&self, application: &Application, reason: Option<&str>) {
        let (content, category) = status_message(application, reason);
        if let Err(err) = self
            .notifier
            .send(application.user_id, &content, category, Some(application.id))
            .await
        {
            tracing::warn!(
                application_id = %application.id,
                user_id = %application.user_id,
                error = ?err,
                "notification dispatch failed"
            );
        }
    }
}

fn status_message(
    application: &Application,
    reason: Option<&str>,
) -> (String, NotificationCategory) {
    use ApplicationStatus::*;
    use NotificationCategory::{Application as App, Interview};

    let when = application
        .scheduled_at
        .map(|at| at.to_rfc3339())
        .unwrap_or_default();

    let (body, category): (String, NotificationCategory) = match application.status {
        Applied => ("Your application has been received.".to_string(), App),
        Shortlisted => ("Your application has been shortlisted.".to_string(), App),
        Rejected => ("Your application has been rejected.".to_string(), App),
        Withdrawn => ("Your application has been withdrawn.".to_string(), App),
        Selected => ("Your application has been selected.".to_string(), App),
        Offered => ("You have received an offer for this position.".to_string(), App),
        Hired => ("Congratulations, you have been hired.".to_string(), App),
        InterviewScheduled => (
            format!("An interview has been scheduled for {}.", when),
            Interview,
        ),
        InterviewCancelled => ("Your interview has been cancelled.".to_string(), Interview),
        InterviewAcceptedByUser => (
            "Your interview confirmation has been recorded.".to_string(),
            Interview,
        ),
        InterviewRejectedByUser => (
            "Your interview refusal has been recorded.".to_string(),
            Interview,
        ),
        InterviewRescheduleProposed => (
            "The company has proposed new interview times. Please pick one.".to_string(),
            Interview,
        ),
        InterviewRescheduleAccepted => (
            format!("Your interview has been moved to {}.", when),
            Interview,
        ),
        InterviewRescheduleRejected => (
            "Your rejection of the proposed interview times has been recorded.".to_string(),
            Interview,
        ),
        InterviewCompleted => (
            "Your interview has been marked as completed.".to_string(),
            Interview,
        ),
        InterviewPassed => (
            "Congratulations, you passed the interview.".to_string(),
            Interview,
        ),
        InterviewFailed => (
            "Unfortunately you did not pass the interview.".to_string(),
            Interview,
        ),
    };

    let content = match reason {
        Some(reason) if !reason.trim().is_empty() => format!("{} Reason: {}", body, reason),
        _ => body,
    };
    (content, category)
}
