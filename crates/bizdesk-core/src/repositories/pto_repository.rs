//! PTO repository trait (port)

use async_trait::async_trait;
use bizdesk_shared::{Page, Pagination};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{PtoKind, PtoRequest, PtoStatus};
use crate::error::DomainError;

#[derive(Debug, Clone, Default)]
pub struct PtoFilter {
    pub staff_id: Option<Uuid>,
    pub status: Option<PtoStatus>,
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait PtoRepository: Send + Sync {
    async fn list(
        &self,
        tenant_id: &Uuid,
        filter: &PtoFilter,
        pagination: Pagination,
    ) -> Result<Page<PtoRequest>, DomainError>;
    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<PtoRequest>, DomainError>;
    /// Pending or approved requests of the staff member touching `[start, end]`.
    async fn find_live_overlapping(
        &self,
        tenant_id: &Uuid,
        staff_id: &Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PtoRequest>, DomainError>;
    /// Approved requests of the given kind touching `[start, end]`, all staff.
    async fn find_approved_in_period(
        &self,
        tenant_id: &Uuid,
        kind: PtoKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PtoRequest>, DomainError>;
    async fn create(&self, request: &PtoRequest) -> Result<PtoRequest, DomainError>;
    /// Saves the request and adds `balance_delta` to the staff member's
    /// PTO balance in one transaction. Only applies while the stored status
    /// is still `expected`; otherwise fails with `InvalidState`.
    async fn save_with_balance(
        &self,
        request: &PtoRequest,
        expected: PtoStatus,
        balance_delta: f32,
    ) -> Result<PtoRequest, DomainError>;
}
