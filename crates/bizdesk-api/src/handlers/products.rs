// ============================================================================
// BizDesk API - Product Handlers
// File: crates/bizdesk-api/src/handlers/products.rs
// ============================================================================
//! Catalog, variants, image uploads and enrichment

use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use bizdesk_core::domain::{EnrichmentMethod, EnrichmentResult, Product, ProductVariant};
use bizdesk_core::error::DomainError;
use bizdesk_core::repositories::ProductFilter;
use bizdesk_core::services::{ApprovedEnrichment, ProductInput, VariantInput};
use bizdesk_shared::{Page, Pagination};

use super::{created, ok, ApiResult, Created};
use crate::error::ApiError;
use crate::extractors::{ApiJson, ApiPath, ApiQuery, CurrentTenant};
use crate::response::Deleted;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EnrichRequest {
    #[serde(default)]
    pub methods: Vec<EnrichmentMethod>,
}

/// GET /api/products
pub async fn list_products(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiQuery(query): ApiQuery<ProductQuery>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Product>> {
    let filter = ProductFilter {
        search: query.search,
        category: query.category,
    };
    ok(state.products.list(&ctx, &filter, pagination.normalized()).await?)
}

/// GET /api/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Product> {
    ok(state.products.get(&ctx, &id).await?)
}

/// POST /api/products
pub async fn create_product(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiJson(payload): ApiJson<ProductInput>,
) -> Created<Product> {
    created(state.products.create(&ctx, payload).await?)
}

/// PUT /api/products/{id}
pub async fn update_product(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ProductInput>,
) -> ApiResult<Product> {
    ok(state.products.update(&ctx, &id, payload).await?)
}

/// DELETE /api/products/{id}
pub async fn delete_product(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.products.delete(&ctx, &id).await?;
    Ok(axum::Json(Deleted::ok()))
}

/// POST /api/products/{id}/images
///
/// Multipart upload; the image is read from the `file` field.
pub async fn upload_image(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Product> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
        let bytes = field.bytes().await.map_err(|e| ApiError::BadRequest(e.body_text()))?;
        debug!(product_id = %id, size = bytes.len(), %content_type, "Image received");

        let product = state
            .products
            .upload_image(&ctx, &id, &file_name, &content_type, bytes.to_vec())
            .await?;
        return ok(product);
    }

    Err(DomainError::Validation("multipart field 'file' is required".to_string()).into())
}

/// POST /api/products/{id}/enrich
///
/// Body is optional: `{"methods": ["ai", "web"]}`. Without it every method runs.
pub async fn enrich_product(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
    body: Bytes,
) -> ApiResult<EnrichmentResult> {
    let request: EnrichRequest = if body.iter().all(u8::is_ascii_whitespace) {
        EnrichRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| DomainError::Validation(e.to_string()))?
    };
    ok(state.enrichment.enrich(&ctx, &id, &request.methods).await?)
}

/// POST /api/products/{id}/enrich/apply
pub async fn apply_enrichment(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ApprovedEnrichment>,
) -> ApiResult<Product> {
    ok(state.products.apply_enrichment(&ctx, &id, payload).await?)
}

/// GET /api/products/{id}/variants
pub async fn list_variants(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Vec<ProductVariant>> {
    ok(state.products.list_variants(&ctx, &id).await?)
}

/// POST /api/products/{id}/variants
pub async fn create_variant(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<VariantInput>,
) -> Created<ProductVariant> {
    created(state.products.create_variant(&ctx, &id, payload).await?)
}

/// PUT /api/variants/{id}
pub async fn update_variant(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<VariantInput>,
) -> ApiResult<ProductVariant> {
    ok(state.products.update_variant(&ctx, &id, payload).await?)
}

/// DELETE /api/variants/{id}
pub async fn delete_variant(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.products.delete_variant(&ctx, &id).await?;
    Ok(axum::Json(Deleted::ok()))
}
