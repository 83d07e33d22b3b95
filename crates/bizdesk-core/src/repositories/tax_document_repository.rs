//! Tax document repository trait (port)

use async_trait::async_trait;
use bizdesk_shared::{Page, Pagination};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{Direction, TaxDocument, UpsertOutcome};
use crate::error::DomainError;

#[derive(Debug, Clone, Default)]
pub struct TaxDocumentFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub document_type: Option<i32>,
    pub direction: Option<Direction>,
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait TaxDocumentRepository: Send + Sync {
    /// Documents without items, newest issue date first.
    async fn list(
        &self,
        tenant_id: &Uuid,
        filter: &TaxDocumentFilter,
        pagination: Pagination,
    ) -> Result<Page<TaxDocument>, DomainError>;
    /// The document with its items.
    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<TaxDocument>, DomainError>;
    /// Inserts or updates by `(tenant_id, emitter_rut, folio)`, replacing
    /// the items, in one transaction.
    async fn upsert(&self, document: &TaxDocument) -> Result<UpsertOutcome, DomainError>;
}
