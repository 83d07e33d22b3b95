//! Notification repository traits (ports)

use async_trait::async_trait;
use bizdesk_shared::{Page, Pagination};
use uuid::Uuid;

use crate::domain::{Notification, NotificationRule, NotificationTemplate};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait NotificationTemplateRepository: Send + Sync {
    async fn list(&self, tenant_id: &Uuid) -> Result<Vec<NotificationTemplate>, DomainError>;
    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<NotificationTemplate>, DomainError>;
    async fn create(&self, template: &NotificationTemplate) -> Result<NotificationTemplate, DomainError>;
    async fn update(&self, template: &NotificationTemplate) -> Result<NotificationTemplate, DomainError>;
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait NotificationRuleRepository: Send + Sync {
    async fn list(&self, tenant_id: &Uuid) -> Result<Vec<NotificationRule>, DomainError>;
    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<NotificationRule>, DomainError>;
    async fn find_active_by_event(
        &self,
        tenant_id: &Uuid,
        event_type: &str,
    ) -> Result<Vec<NotificationRule>, DomainError>;
    async fn create(&self, rule: &NotificationRule) -> Result<NotificationRule, DomainError>;
    async fn update(&self, rule: &NotificationRule) -> Result<NotificationRule, DomainError>;
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &Notification) -> Result<Notification, DomainError>;
    async fn update(&self, notification: &Notification) -> Result<Notification, DomainError>;
    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<Notification>, DomainError>;
    /// In-app notifications already delivered to the staff member, newest first.
    async fn list_for_staff(
        &self,
        tenant_id: &Uuid,
        staff_id: &Uuid,
        unread_only: bool,
        pagination: Pagination,
    ) -> Result<Page<Notification>, DomainError>;
    /// Returns false when the notification is not the staff member's.
    async fn mark_read(&self, tenant_id: &Uuid, staff_id: &Uuid, id: &Uuid) -> Result<bool, DomainError>;
    /// Returns the number of notifications marked.
    async fn mark_all_read(&self, tenant_id: &Uuid, staff_id: &Uuid) -> Result<u64, DomainError>;
    /// Pending notifications across all tenants, oldest schedule first.
    async fn list_pending(&self) -> Result<Vec<Notification>, DomainError>;
}
