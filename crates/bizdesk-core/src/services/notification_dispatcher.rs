// ============================================================================
// BizDesk Core - Notification Dispatcher
// File: crates/bizdesk-core/src/services/notification_dispatcher.rs
// Description: In-process delay queue delivering pending notifications
// ============================================================================

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::{Channel, Notification};
use crate::error::DomainError;
use crate::gateways::Mailer;
use crate::repositories::{NotificationRepository, StaffRepository};

/// Sending side of the delay queue. Cheap to clone.
#[derive(Clone)]
pub struct DispatchHandle {
    tx: mpsc::UnboundedSender<Notification>,
}

impl DispatchHandle {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn enqueue(&self, notification: Notification) {
        let id = notification.id;
        if let Err(e) = self.tx.send(notification) {
            warn!(notification_id = %id, "Dispatcher is not running, notification stays pending: {}", e);
        }
    }
}

pub struct NotificationDispatcher {
    notifications: Arc<dyn NotificationRepository>,
    staff: Arc<dyn StaffRepository>,
    /// `None` when outbound mail is disabled.
    mailer: Option<Arc<dyn Mailer>>,
}

impl NotificationDispatcher {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        staff: Arc<dyn StaffRepository>,
        mailer: Option<Arc<dyn Mailer>>,
    ) -> Self {
        Self {
            notifications,
            staff,
            mailer,
        }
    }

    /// Consumes the queue until every handle is dropped. Each notification
    /// waits for its `scheduled_at` on its own task.
    pub fn spawn(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<Notification>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Notification dispatcher started");
            while let Some(notification) = rx.recv().await {
                let dispatcher = Arc::clone(&self);
                tokio::spawn(async move {
                    dispatcher.deliver_when_due(notification).await;
                });
            }
            info!("Notification dispatcher stopped");
        })
    }

    /// Puts every stored pending notification back on the queue.
    pub async fn requeue_pending(&self, handle: &DispatchHandle) -> Result<usize, DomainError> {
        let pending = self.notifications.list_pending().await?;
        let count = pending.len();
        for notification in pending {
            handle.enqueue(notification);
        }
        if count > 0 {
            info!(count, "Re-enqueued pending notifications");
        }
        Ok(count)
    }

    pub async fn deliver_when_due(&self, notification: Notification) {
        let wait = (notification.scheduled_at - Utc::now()).to_std().unwrap_or_default();
        if !wait.is_zero() {
            debug!(notification_id = %notification.id, wait_secs = wait.as_secs(), "Notification scheduled");
            tokio::time::sleep(wait).await;
        }
        self.deliver(notification).await;
    }

    /// Delivers now and stores the outcome.
    pub async fn deliver(&self, mut notification: Notification) -> Notification {
        match notification.channel {
            Channel::InApp => notification.mark_sent(),
            Channel::Email => match self.send_email(&notification).await {
                Ok(()) => notification.mark_sent(),
                Err(e) => {
                    warn!(notification_id = %notification.id, "E-mail delivery failed: {}", e);
                    notification.mark_failed(e.to_string());
                }
            },
        }

        if let Err(e) = self.notifications.update(&notification).await {
            error!(notification_id = %notification.id, "Failed to store delivery outcome: {}", e);
        }
        notification
    }

    async fn send_email(&self, notification: &Notification) -> Result<(), DomainError> {
        let mailer = self
            .mailer
            .as_ref()
            .ok_or_else(|| DomainError::external("mail", "outbound mail is disabled"))?;
        let recipient = self
            .staff
            .find_by_id(&notification.tenant_id, &notification.recipient_staff_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Staff"))?;
        mailer
            .send(&recipient.email, &notification.subject, &notification.body)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NotificationStatus, Role, Staff};
    use crate::gateways::MockMailer;
    use crate::repositories::{MockNotificationRepository, MockStaffRepository};
    use uuid::Uuid;

    fn notification(channel: Channel, delay_minutes: i32) -> Notification {
        Notification::pending(
            Uuid::new_v4(),
            Uuid::new_v4(),
            None,
            "task.assigned",
            channel,
            "Nueva tarea".into(),
            "Te asignaron: Inventario".into(),
            delay_minutes,
        )
    }

    #[tokio::test]
    async fn test_in_app_marked_sent() {
        let mut repo = MockNotificationRepository::new();
        repo.expect_update()
            .withf(|n| n.status == NotificationStatus::Sent && n.sent_at.is_some())
            .times(1)
            .returning(|n| Ok(n.clone()));

        let dispatcher = NotificationDispatcher::new(Arc::new(repo), Arc::new(MockStaffRepository::new()), None);
        let out = dispatcher.deliver(notification(Channel::InApp, 0)).await;
        assert_eq!(out.status, NotificationStatus::Sent);
    }

    #[tokio::test]
    async fn test_email_goes_to_staff_address() {
        let n = notification(Channel::Email, 0);
        let role = Role::new(n.tenant_id, "employee".into(), None, vec![]).unwrap();
        let member = Staff::new(n.tenant_id, "luis@pansur.cl".into(), "Luis".into(), &role);

        let mut staff = MockStaffRepository::new();
        staff.expect_find_by_id().returning(move |_, _| Ok(Some(member.clone())));
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|to, subject, _| to == "luis@pansur.cl" && subject == "Nueva tarea")
            .times(1)
            .returning(|_, _, _| Ok(()));
        let mut repo = MockNotificationRepository::new();
        repo.expect_update().returning(|n| Ok(n.clone()));

        let dispatcher = NotificationDispatcher::new(Arc::new(repo), Arc::new(staff), Some(Arc::new(mailer)));
        assert_eq!(dispatcher.deliver(n).await.status, NotificationStatus::Sent);
    }

    #[tokio::test]
    async fn test_email_without_mailer_fails() {
        let mut repo = MockNotificationRepository::new();
        repo.expect_update()
            .withf(|n| n.status == NotificationStatus::Failed && n.error.is_some())
            .times(1)
            .returning(|n| Ok(n.clone()));

        let dispatcher = NotificationDispatcher::new(Arc::new(repo), Arc::new(MockStaffRepository::new()), None);
        let out = dispatcher.deliver(notification(Channel::Email, 0)).await;
        assert_eq!(out.status, NotificationStatus::Failed);
    }

    #[tokio::test]
    async fn test_queue_delivers_due_notifications() {
        let (tx, mut seen) = mpsc::unbounded_channel::<Uuid>();
        let mut repo = MockNotificationRepository::new();
        repo.expect_update().returning(move |n| {
            let _ = tx.send(n.id);
            Ok(n.clone())
        });

        let dispatcher = Arc::new(NotificationDispatcher::new(
            Arc::new(repo),
            Arc::new(MockStaffRepository::new()),
            None,
        ));
        let (handle, rx) = DispatchHandle::channel();
        let worker = dispatcher.spawn(rx);

        let n = notification(Channel::InApp, 0);
        let id = n.id;
        handle.enqueue(n);

        let delivered = tokio::time::timeout(std::time::Duration::from_secs(5), seen.recv())
            .await
            .unwrap();
        assert_eq!(delivered, Some(id));

        drop(handle);
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn test_requeue_pending() {
        let mut repo = MockNotificationRepository::new();
        repo.expect_list_pending()
            .returning(|| Ok(vec![notification(Channel::InApp, 60), notification(Channel::Email, 5)]));
        let dispatcher = NotificationDispatcher::new(Arc::new(repo), Arc::new(MockStaffRepository::new()), None);

        let (handle, mut rx) = DispatchHandle::channel();
        assert_eq!(dispatcher.requeue_pending(&handle).await.unwrap(), 2);
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_some());
    }
}
