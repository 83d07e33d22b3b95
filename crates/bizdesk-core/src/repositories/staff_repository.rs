//! Staff and role repository traits (ports)

use async_trait::async_trait;
use bizdesk_shared::{Page, Pagination};
use uuid::Uuid;

use crate::domain::{Role, Staff};
use crate::error::DomainError;

#[derive(Debug, Clone, Default)]
pub struct StaffFilter {
    /// Matches name or e-mail, case-insensitive.
    pub search: Option<String>,
    pub active: Option<bool>,
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait StaffRepository: Send + Sync {
    async fn list(
        &self,
        tenant_id: &Uuid,
        filter: &StaffFilter,
        pagination: Pagination,
    ) -> Result<Page<Staff>, DomainError>;
    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<Staff>, DomainError>;
    async fn find_by_email(&self, tenant_id: &Uuid, email: &str) -> Result<Option<Staff>, DomainError>;
    /// Active, non-deleted staff holding the named role.
    async fn find_active_by_role(&self, tenant_id: &Uuid, role: &str) -> Result<Vec<Staff>, DomainError>;
    async fn list_active(&self, tenant_id: &Uuid) -> Result<Vec<Staff>, DomainError>;
    async fn create(&self, staff: &Staff) -> Result<Staff, DomainError>;
    async fn update(&self, staff: &Staff) -> Result<Staff, DomainError>;
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn list(&self, tenant_id: &Uuid) -> Result<Vec<Role>, DomainError>;
    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<Role>, DomainError>;
    async fn find_by_name(&self, tenant_id: &Uuid, name: &str) -> Result<Option<Role>, DomainError>;
    async fn create(&self, role: &Role) -> Result<Role, DomainError>;
    async fn update(&self, role: &Role) -> Result<Role, DomainError>;
    /// Non-deleted staff still pointing at the role.
    async fn count_staff_with_role(&self, tenant_id: &Uuid, role_id: &Uuid) -> Result<i64, DomainError>;
}
