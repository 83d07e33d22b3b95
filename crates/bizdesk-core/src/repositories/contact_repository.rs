//! Contact repository trait (port)

use async_trait::async_trait;
use bizdesk_shared::{Page, Pagination};
use uuid::Uuid;

use crate::domain::{Contact, ContactKind};
use crate::error::DomainError;

#[derive(Debug, Clone, Default)]
pub struct ContactFilter {
    /// Matches name, company or e-mail, case-insensitive.
    pub search: Option<String>,
    pub kind: Option<ContactKind>,
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn list(
        &self,
        tenant_id: &Uuid,
        filter: &ContactFilter,
        pagination: Pagination,
    ) -> Result<Page<Contact>, DomainError>;
    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<Contact>, DomainError>;
    async fn create(&self, contact: &Contact) -> Result<Contact, DomainError>;
    async fn update(&self, contact: &Contact) -> Result<Contact, DomainError>;
}
