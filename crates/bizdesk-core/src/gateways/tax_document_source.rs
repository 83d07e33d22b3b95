//! E-invoicing aggregator port.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::Direction;
use crate::error::DomainError;

/// One row of the aggregator's document list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDocumentSummary {
    pub document_type: i32,
    pub folio: i64,
    pub emitter_rut: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocumentPage {
    pub current_page: u32,
    pub last_page: u32,
    pub documents: Vec<RemoteDocumentSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocumentItem {
    pub line_number: i32,
    pub name: String,
    pub description: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
    pub amount: i64,
}

/// A document detail mapped out of the aggregator's JSON. RUTs are as
/// the aggregator sent them.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    pub document_type: i32,
    pub folio: i64,
    pub emitter_rut: String,
    pub emitter_name: String,
    pub receiver_rut: Option<String>,
    pub issue_date: NaiveDate,
    pub net_amount: i64,
    pub exempt_amount: i64,
    pub tax_amount: i64,
    pub total_amount: i64,
    pub items: Vec<RemoteDocumentItem>,
    pub raw: serde_json::Value,
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait TaxDocumentSource: Send + Sync {
    /// One page (1-based) of documents issued between `from` and `to` inclusive.
    async fn list_documents(
        &self,
        direction: Direction,
        from: NaiveDate,
        to: NaiveDate,
        page: u32,
    ) -> Result<RemoteDocumentPage, DomainError>;

    async fn fetch_document(
        &self,
        direction: Direction,
        summary: &RemoteDocumentSummary,
    ) -> Result<RemoteDocument, DomainError>;
}
