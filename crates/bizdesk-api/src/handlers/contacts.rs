use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use bizdesk_core::domain::{Contact, ContactKind};
use bizdesk_core::repositories::ContactFilter;
use bizdesk_core::services::ContactInput;
use bizdesk_shared::{Page, Pagination};

use super::{created, ok, ApiResult, Created};
use crate::extractors::{ApiJson, ApiPath, ApiQuery, CurrentTenant};
use crate::response::Deleted;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ContactQuery {
    pub search: Option<String>,
    pub kind: Option<ContactKind>,
}

/// GET /api/contacts
pub async fn list_contacts(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiQuery(query): ApiQuery<ContactQuery>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Contact>> {
    let filter = ContactFilter {
        search: query.search,
        kind: query.kind,
    };
    ok(state.contacts.list(&ctx, &filter, pagination.normalized()).await?)
}

/// GET /api/contacts/{id}
pub async fn get_contact(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Contact> {
    ok(state.contacts.get(&ctx, &id).await?)
}

/// POST /api/contacts
pub async fn create_contact(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiJson(payload): ApiJson<ContactInput>,
) -> Created<Contact> {
    created(state.contacts.create(&ctx, payload).await?)
}

/// PUT /api/contacts/{id}
pub async fn update_contact(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ContactInput>,
) -> ApiResult<Contact> {
    ok(state.contacts.update(&ctx, &id, payload).await?)
}

/// DELETE /api/contacts/{id}
pub async fn delete_contact(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.contacts.delete(&ctx, &id).await?;
    Ok(axum::Json(Deleted::ok()))
}
