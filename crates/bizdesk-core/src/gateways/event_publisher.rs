//! Business event port. Services publish; the notification service listens.

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainEvent {
    pub tenant_id: Uuid,
    pub event_type: String,
    /// The staff member the event is about, for `subject` recipients.
    pub subject_staff_id: Option<Uuid>,
    /// Template variables.
    pub vars: serde_json::Value,
}

impl DomainEvent {
    pub fn new(tenant_id: Uuid, event_type: &str, subject_staff_id: Option<Uuid>, vars: serde_json::Value) -> Self {
        Self {
            tenant_id,
            event_type: event_type.to_string(),
            subject_staff_id,
            vars,
        }
    }
}

/// Publishing never fails the caller; implementations log their own errors.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: DomainEvent);
}
