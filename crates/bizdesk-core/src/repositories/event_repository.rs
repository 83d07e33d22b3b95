//! Calendar event repository trait (port)

use async_trait::async_trait;
use bizdesk_shared::{Page, Pagination};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::Event;
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Events overlapping the window; an open bound is unbounded.
    async fn list(
        &self,
        tenant_id: &Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        pagination: Pagination,
    ) -> Result<Page<Event>, DomainError>;
    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<Event>, DomainError>;
    async fn create(&self, event: &Event) -> Result<Event, DomainError>;
    async fn update(&self, event: &Event) -> Result<Event, DomainError>;
}
