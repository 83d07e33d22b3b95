// ============================================================================
// BizDesk Core - Tax Documents (DTE)
// File: crates/bizdesk-core/src/domain/tax_document.rs
// Description: Electronic tax documents pulled from the e-invoicing aggregator
// ============================================================================

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Documents other companies issued to the tenant (purchases).
    #[default]
    Received,
    /// Documents the tenant issued (sales).
    Issued,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Received => "received",
            Direction::Issued => "issued",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "received" => Some(Direction::Received),
            "issued" => Some(Direction::Issued),
            _ => None,
        }
    }
}

/// Human label for an SII document type code.
pub fn document_type_label(code: i32) -> &'static str {
    match code {
        33 => "Factura electrónica",
        34 => "Factura exenta electrónica",
        39 => "Boleta electrónica",
        41 => "Boleta exenta electrónica",
        46 => "Factura de compra electrónica",
        52 => "Guía de despacho electrónica",
        56 => "Nota de débito electrónica",
        61 => "Nota de crédito electrónica",
        110 => "Factura de exportación electrónica",
        _ => "Documento tributario",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxDocumentItem {
    pub id: Uuid,
    pub tax_document_id: Uuid,
    pub line_number: i32,
    pub name: String,
    pub description: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxDocument {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub direction: Direction,
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
    /// Detail payload as returned by the aggregator.
    pub raw: serde_json::Value,
    pub synced_at: DateTime<Utc>,
    /// Empty when loaded in a list.
    pub items: Vec<TaxDocumentItem>,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TaxDocument {
    pub fn document_type_label(&self) -> &'static str {
        document_type_label(self.document_type)
    }
}

/// Result of storing one synced document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Splits `[from, to]` into consecutive inclusive windows of at most
/// `chunk_days` days.
pub fn date_chunks(from: NaiveDate, to: NaiveDate, chunk_days: u32) -> Vec<(NaiveDate, NaiveDate)> {
    let mut chunks = Vec::new();
    if to < from || chunk_days == 0 {
        return chunks;
    }
    let step = Duration::days(i64::from(chunk_days));
    let mut start = from;
    while start <= to {
        let end = (start + step - Duration::days(1)).min(to);
        chunks.push((start, end));
        start = end + Duration::days(1);
    }
    chunks
}
