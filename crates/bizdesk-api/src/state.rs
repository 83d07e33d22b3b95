use std::sync::Arc;

use sqlx::PgPool;

use bizdesk_core::services::{
    AuthService, CalendarService, ContactService, EnrichmentService, NotificationService, PayrollService,
    ProductService, ProjectService, PtoService, StaffService, TaxDocumentService,
};
use bizdesk_security::JwtService;

/// Shared by every handler. Cloning copies `Arc`s only.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt: Arc<JwtService>,
    /// Key accepted in `x-api-key` for service calls; empty disables them.
    pub service_api_key: Arc<str>,
    pub auth: Arc<AuthService>,
    pub staff: Arc<StaffService>,
    pub products: Arc<ProductService>,
    pub enrichment: Arc<EnrichmentService>,
    pub tax_documents: Arc<TaxDocumentService>,
    pub payroll: Arc<PayrollService>,
    pub pto: Arc<PtoService>,
    pub calendar: Arc<CalendarService>,
    pub contacts: Arc<ContactService>,
    pub projects: Arc<ProjectService>,
    pub notifications: Arc<NotificationService>,
}
