// ============================================================================
// BizDesk API - Router
// File: crates/bizdesk-api/src/routes.rs
// ============================================================================

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::warn;

use bizdesk_shared::constants::{HEADER_API_KEY, HEADER_REQUEST_ID, HEADER_TENANT_ID, MAX_REQUEST_BODY_BYTES};

use crate::handlers::{
    auth, calendar, contacts, health, notifications, payroll, products, projects, pto, staff, tax_documents,
};
use crate::state::AppState;

/// Every route of the service. Tenant-scoped handlers authenticate through
/// the `CurrentTenant` extractor, so public and scoped routes share one tree.
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/api/auth/login", post(auth::login))
        .route("/api/tenants", post(auth::register_tenant));

    let tenant_routes = Router::new()
        .route("/api/tenants/current", get(auth::current_tenant))
        // Staff & roles
        .route("/api/staff", get(staff::list_staff).post(staff::create_staff))
        .route(
            "/api/staff/{id}",
            get(staff::get_staff).put(staff::update_staff).delete(staff::delete_staff),
        )
        .route("/api/roles", get(staff::list_roles).post(staff::create_role))
        .route("/api/roles/{id}", axum::routing::delete(staff::delete_role))
        // Catalog
        .route("/api/products", get(products::list_products).post(products::create_product))
        .route(
            "/api/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/api/products/{id}/images", post(products::upload_image))
        .route("/api/products/{id}/enrich", post(products::enrich_product))
        .route("/api/products/{id}/enrich/apply", post(products::apply_enrichment))
        .route(
            "/api/products/{id}/variants",
            get(products::list_variants).post(products::create_variant),
        )
        .route(
            "/api/variants/{id}",
            put(products::update_variant).delete(products::delete_variant),
        )
        // Tax documents
        .route("/api/tax-documents", get(tax_documents::list_documents))
        .route("/api/tax-documents/sync", post(tax_documents::sync_documents))
        .route("/api/tax-documents/{id}", get(tax_documents::get_document))
        // Payroll
        .route("/api/payroll", get(payroll::list_runs).post(payroll::create_run))
        .route("/api/payroll/{id}", get(payroll::get_run).delete(payroll::delete_run))
        .route("/api/payroll/{id}/approve", post(payroll::approve_run))
        .route("/api/payroll/{id}/pay", post(payroll::pay_run))
        // PTO
        .route("/api/pto", get(pto::list_requests).post(pto::create_request))
        .route(
            "/api/pto/{id}",
            get(pto::get_request).patch(pto::review_request).delete(pto::cancel_request),
        )
        // Calendar
        .route("/api/events", get(calendar::list_events).post(calendar::create_event))
        .route(
            "/api/events/{id}",
            get(calendar::get_event)
                .put(calendar::update_event)
                .delete(calendar::delete_event),
        )
        // Contacts
        .route("/api/contacts", get(contacts::list_contacts).post(contacts::create_contact))
        .route(
            "/api/contacts/{id}",
            get(contacts::get_contact)
                .put(contacts::update_contact)
                .delete(contacts::delete_contact),
        )
        // Projects & tasks
        .route("/api/projects", get(projects::list_projects).post(projects::create_project))
        .route(
            "/api/projects/{id}",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/api/tasks", get(projects::list_tasks).post(projects::create_task))
        .route(
            "/api/tasks/{id}",
            get(projects::get_task).put(projects::update_task).delete(projects::delete_task),
        )
        .route("/api/tasks/{id}/status", patch(projects::set_task_status))
        // Notifications
        .route(
            "/api/notification-templates",
            get(notifications::list_templates).post(notifications::create_template),
        )
        .route(
            "/api/notification-templates/{id}",
            put(notifications::update_template).delete(notifications::delete_template),
        )
        .route(
            "/api/notification-rules",
            get(notifications::list_rules).post(notifications::create_rule),
        )
        .route(
            "/api/notification-rules/{id}",
            put(notifications::update_rule).delete(notifications::delete_rule),
        )
        .route("/api/notifications", get(notifications::list_mine))
        .route("/api/notifications/read-all", post(notifications::mark_all_read))
        .route("/api/notifications/{id}/read", patch(notifications::mark_read));

    let request_id = HeaderName::from_static(HEADER_REQUEST_ID);

    Router::new()
        .merge(public_routes)
        .merge(tenant_routes)
        .with_state(state)
        .layer(cors_layer(cors_origins))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default().include_headers(false)))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
}

/// Permissive when no origin (or `*`) is configured.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let headers = [
        header::CONTENT_TYPE,
        header::AUTHORIZATION,
        HeaderName::from_static(HEADER_TENANT_ID),
        HeaderName::from_static(HEADER_API_KEY),
    ];
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(headers)
            .max_age(Duration::from_secs(3600));
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(methods)
        .allow_headers(headers)
        .max_age(Duration::from_secs(3600))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_skips_invalid_origins() {
        let _ = cors_layer(&["https://app.example.cl".to_string(), "bad\norigin".to_string()]);
        let _ = cors_layer(&[]);
    }
}
