use axum::extract::State;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use bizdesk_core::domain::{Direction, TaxDocument};
use bizdesk_core::repositories::TaxDocumentFilter;
use bizdesk_core::services::SyncSummary;
use bizdesk_shared::{Page, Pagination};

use super::{ok, ApiResult};
use crate::extractors::{ApiJson, ApiPath, ApiQuery, CurrentTenant};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TaxDocumentQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub document_type: Option<i32>,
    pub direction: Option<Direction>,
}

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(default)]
    pub direction: Direction,
}

/// GET /api/tax-documents
pub async fn list_documents(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiQuery(query): ApiQuery<TaxDocumentQuery>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<TaxDocument>> {
    let filter = TaxDocumentFilter {
        from: query.from,
        to: query.to,
        document_type: query.document_type,
        direction: query.direction,
    };
    ok(state.tax_documents.list(&ctx, &filter, pagination.normalized()).await?)
}

/// GET /api/tax-documents/{id}
pub async fn get_document(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<TaxDocument> {
    ok(state.tax_documents.get(&ctx, &id).await?)
}

/// POST /api/tax-documents/sync
pub async fn sync_documents(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiJson(payload): ApiJson<SyncRequest>,
) -> ApiResult<SyncSummary> {
    ok(state
        .tax_documents
        .sync(&ctx, payload.from, payload.to, payload.direction)
        .await?)
}
