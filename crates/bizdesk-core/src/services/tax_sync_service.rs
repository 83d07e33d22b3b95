// ============================================================================
// BizDesk Core - Tax Document Service
// File: crates/bizdesk-core/src/services/tax_sync_service.rs
// ============================================================================
//! Local tax documents and their pull from the e-invoicing aggregator.

use std::sync::Arc;
use std::time::Duration;

use bizdesk_shared::constants::{MAX_SYNC_PAGES_PER_CHUNK, MAX_SYNC_SPAN_DAYS};
use bizdesk_shared::{Page, Pagination};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::TenantContext;
use crate::domain::notification::EVENT_TAX_DOCUMENTS_SYNCED;
use crate::domain::tax_document::date_chunks;
use crate::domain::{Direction, Rut, TaxDocument, TaxDocumentItem, UpsertOutcome};
use crate::error::DomainError;
use crate::gateways::{DomainEvent, EventPublisher, RemoteDocument, RemoteDocumentSummary, TaxDocumentSource};
use crate::repositories::{TaxDocumentFilter, TaxDocumentRepository};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub chunks: usize,
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
}

pub struct TaxDocumentService {
    documents: Arc<dyn TaxDocumentRepository>,
    source: Arc<dyn TaxDocumentSource>,
    events: Arc<dyn EventPublisher>,
    chunk_days: u32,
    request_delay: Duration,
}

impl TaxDocumentService {
    pub fn new(
        documents: Arc<dyn TaxDocumentRepository>,
        source: Arc<dyn TaxDocumentSource>,
        events: Arc<dyn EventPublisher>,
        chunk_days: u32,
        request_delay: Duration,
    ) -> Self {
        Self {
            documents,
            source,
            events,
            chunk_days: chunk_days.max(1),
            request_delay,
        }
    }

    pub async fn list(
        &self,
        ctx: &TenantContext,
        filter: &TaxDocumentFilter,
        pagination: Pagination,
    ) -> Result<Page<TaxDocument>, DomainError> {
        if let (Some(from), Some(to)) = (filter.from, filter.to) {
            if to < from {
                return Err(DomainError::Validation("'to' must not be before 'from'".to_string()));
            }
        }
        self.documents.list(&ctx.tenant_id, filter, pagination).await
    }

    pub async fn get(&self, ctx: &TenantContext, id: &Uuid) -> Result<TaxDocument, DomainError> {
        self.documents
            .find_by_id(&ctx.tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Tax document"))
    }

    /// Pulls every document issued in `[from, to]`. A record that cannot be
    /// fetched, mapped or stored is counted in `failed` and skipped.
    pub async fn sync(
        &self,
        ctx: &TenantContext,
        from: NaiveDate,
        to: NaiveDate,
        direction: Direction,
    ) -> Result<SyncSummary, DomainError> {
        ctx.require_admin()?;
        if to < from {
            return Err(DomainError::Validation("'to' must not be before 'from'".to_string()));
        }
        let span = (to - from).num_days() + 1;
        if span > MAX_SYNC_SPAN_DAYS {
            return Err(DomainError::Validation(format!(
                "sync range is {} days, at most {} allowed",
                span, MAX_SYNC_SPAN_DAYS
            )));
        }

        let chunks = date_chunks(from, to, self.chunk_days);
        let mut summary = SyncSummary {
            chunks: chunks.len(),
            ..Default::default()
        };
        info!(
            tenant_id = %ctx.tenant_id,
            direction = direction.as_str(),
            %from,
            %to,
            chunks = chunks.len(),
            "Tax document sync started"
        );

        for (chunk_from, chunk_to) in chunks {
            // Paging follows the local counter; the echoed page number is not trusted.
            let mut page: u32 = 1;
            loop {
                let listing = self
                    .source
                    .list_documents(direction, chunk_from, chunk_to, page)
                    .await?;
                debug!(
                    %chunk_from,
                    %chunk_to,
                    page,
                    reported_page = listing.current_page,
                    last_page = listing.last_page,
                    records = listing.documents.len(),
                    "Document page received"
                );

                for summary_row in &listing.documents {
                    self.sync_one(ctx, direction, summary_row, &mut summary).await;
                }

                if listing.documents.is_empty() || page >= listing.last_page {
                    break;
                }
                if page >= MAX_SYNC_PAGES_PER_CHUNK {
                    warn!(%chunk_from, %chunk_to, last_page = listing.last_page, "Page limit reached, chunk truncated");
                    break;
                }
                page += 1;
            }
        }

        info!(
            tenant_id = %ctx.tenant_id,
            fetched = summary.fetched,
            created = summary.created,
            updated = summary.updated,
            failed = summary.failed,
            "Tax document sync finished"
        );

        self.events
            .publish(DomainEvent::new(
                ctx.tenant_id,
                EVENT_TAX_DOCUMENTS_SYNCED,
                ctx.staff_id(),
                json!({
                    "direction": direction.as_str(),
                    "from": from.to_string(),
                    "to": to.to_string(),
                    "fetched": summary.fetched,
                    "created": summary.created,
                    "updated": summary.updated,
                    "failed": summary.failed,
                }),
            ))
            .await;

        Ok(summary)
    }

    async fn sync_one(
        &self,
        ctx: &TenantContext,
        direction: Direction,
        row: &RemoteDocumentSummary,
        summary: &mut SyncSummary,
    ) {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        let remote = match self.source.fetch_document(direction, row).await {
            Ok(doc) => doc,
            Err(e) => {
                warn!(folio = row.folio, emitter_rut = %row.emitter_rut, "Document detail fetch failed: {}", e);
                summary.failed += 1;
                return;
            }
        };
        summary.fetched += 1;

        let document = match to_local(ctx.tenant_id, direction, remote) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(folio = row.folio, "Document could not be mapped: {}", e);
                summary.failed += 1;
                return;
            }
        };

        match self.documents.upsert(&document).await {
            Ok(UpsertOutcome::Created) => summary.created += 1,
            Ok(UpsertOutcome::Updated) => summary.updated += 1,
            Err(e) => {
                warn!(folio = document.folio, emitter_rut = %document.emitter_rut, "Document upsert failed: {}", e);
                summary.failed += 1;
            }
        }
    }
}

/// Maps an aggregator document into the local shape. The emitter RUT is part
/// of the natural key and must be valid; a bad receiver RUT is kept as sent.
fn to_local(tenant_id: Uuid, direction: Direction, remote: RemoteDocument) -> Result<TaxDocument, DomainError> {
    let emitter_rut = Rut::parse(&remote.emitter_rut)?.as_str().to_string();
    let receiver_rut = remote.receiver_rut.map(|raw| match Rut::parse(&raw) {
        Ok(rut) => rut.as_str().to_string(),
        Err(_) => raw.trim().to_string(),
    });

    let id = Uuid::new_v4();
    let now = Utc::now();
    let items = remote
        .items
        .into_iter()
        .map(|item| TaxDocumentItem {
            id: Uuid::new_v4(),
            tax_document_id: id,
            line_number: item.line_number,
            name: item.name,
            description: item.description,
            quantity: item.quantity,
            unit_price: item.unit_price,
            amount: item.amount,
        })
        .collect();

    Ok(TaxDocument {
        id,
        tenant_id,
        direction,
        document_type: remote.document_type,
        folio: remote.folio,
        emitter_rut,
        emitter_name: remote.emitter_name,
        receiver_rut,
        issue_date: remote.issue_date,
        net_amount: remote.net_amount,
        exempt_amount: remote.exempt_amount,
        tax_amount: remote.tax_amount,
        total_amount: remote.total_amount,
        raw: remote.raw,
        synced_at: now,
        items,
        created_at: now,
        updated_at: now,
        is_deleted: false,
        deleted_at: None,
    })
}
