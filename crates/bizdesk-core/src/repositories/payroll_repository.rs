//! Payroll repository trait (port)

use async_trait::async_trait;
use bizdesk_shared::{Page, Pagination};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{PayrollRun, PayrollStatus};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait PayrollRepository: Send + Sync {
    /// Runs without their lines, newest period first.
    async fn list(&self, tenant_id: &Uuid, pagination: Pagination) -> Result<Page<PayrollRun>, DomainError>;
    /// The run with its lines.
    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<PayrollRun>, DomainError>;
    /// True when a non-deleted run covers any day of `[start, end]`.
    async fn has_overlapping(
        &self,
        tenant_id: &Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<bool, DomainError>;
    /// Inserts the run and its lines in one transaction.
    async fn create(&self, run: &PayrollRun) -> Result<PayrollRun, DomainError>;
    /// Updates status, approval and delete fields of the run while its
    /// stored status is still `expected`; otherwise fails with `InvalidState`.
    async fn update(&self, run: &PayrollRun, expected: PayrollStatus) -> Result<PayrollRun, DomainError>;
}
