use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::Result;
use crate::models::notification::{Notification, NotificationCategory};

/// The one call the lifecycle core needs from a notification dispatcher.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        user_id: Uuid,
        content: &str,
        category: NotificationCategory,
        related_id: Option<Uuid>,
    ) -> Result<Notification>;
}

/// Optional realtime side channel. Delivery is best effort; a recipient that
/// is not connected is simply skipped.
pub trait RealtimePush: Send + Sync {
    fn push(&self, user_id: Uuid, notification: &Notification);
}

pub struct NoopPush;

impl RealtimePush for NoopPush {
    fn push(&self, _user_id: Uuid, _notification: &Notification) {}
}

/// Fan-out over a tokio broadcast channel; a hosting layer (websocket hub,
/// SSE endpoint) subscribes via [`BroadcastPush::subscribe`].
pub struct BroadcastPush {
    tx: broadcast::Sender<(Uuid, Notification)>,
}

impl BroadcastPush {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<(Uuid, Notification)> {
        self.tx.subscribe()
    }
}

impl RealtimePush for BroadcastPush {
    fn push(&self, user_id: Uuid, notification: &Notification) {
        // Err here only means nobody is subscribed right now.
        let _ = self.tx.send((user_id, notification.clone()));
    }
}

#[derive(Clone)]
pub struct PgNotificationService {
    pool: PgPool,
    push: Arc<dyn RealtimePush>,
}

impl PgNotificationService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            push: Arc::new(NoopPush),
        }
    }

    pub fn with_push(mut self, push: Arc<dyn RealtimePush>) -> Self {
        self.push = push;
        self
    }
}

#[async_trait]
impl Notifier for PgNotificationService {
    async fn send(
        &self,
        user_id: Uuid,
        content: &str,
        category: NotificationCategory,
        related_id: Option<Uuid>,
    ) -> Result<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, content, category, related_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, content, category, related_id, is_read, created_at
            "#,
        )
        .bind(user_id)
        .bind(content)
        .bind(category.as_str())
        .bind(related_id)
        .fetch_one(&self.pool)
        .await?;

        self.push.push(user_id, &notification);

        Ok(notification)
    }
}
