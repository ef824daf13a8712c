pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use sqlx::PgPool;

use crate::services::application_service::{ApplicationStore, PgApplicationService};
use crate::services::interview_service::{InterviewStore, PgInterviewService};
use crate::services::lifecycle_service::LifecycleService;
use crate::services::notification_service::{BroadcastPush, Notifier, PgNotificationService};
use crate::services::scheduling_service::SchedulingService;

#[derive(Clone)]
pub struct AppState {
    pub applications: Arc<dyn ApplicationStore>,
    pub interviews: Arc<dyn InterviewStore>,
    pub notifier: Arc<dyn Notifier>,
    pub lifecycle: LifecycleService,
    pub scheduling: SchedulingService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let push = Arc::new(BroadcastPush::new(256));
        let applications: Arc<dyn ApplicationStore> =
            Arc::new(PgApplicationService::new(pool.clone()));
        let interviews: Arc<dyn InterviewStore> = Arc::new(PgInterviewService::new(pool.clone()));
        let notifier: Arc<dyn Notifier> =
            Arc::new(PgNotificationService::new(pool).with_push(push));
        Self::from_parts(applications, interviews, notifier)
    }

    /// Wires the services over any store/notifier implementations. `new` is
    /// the Postgres wiring; alternative backends plug in here.
    pub fn from_parts(
        applications: Arc<dyn ApplicationStore>,
        interviews: Arc<dyn InterviewStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let lifecycle = LifecycleService::new(applications.clone(), notifier.clone());
        let scheduling = SchedulingService::new(
            interviews.clone(),
            applications.clone(),
            notifier.clone(),
            lifecycle.clone(),
        );
        Self {
            applications,
            interviews,
            notifier,
            lifecycle,
            scheduling,
        }
    }
}
