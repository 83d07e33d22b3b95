//! Domain services

pub mod auth_service;
pub mod calendar_service;
pub mod contact_service;
pub mod enrichment_service;
pub mod notification_dispatcher;
pub mod notification_service;
pub mod payroll_service;
pub mod product_service;
pub mod project_service;
pub mod pto_service;
pub mod staff_service;
pub mod tax_sync_service;

pub use auth_service::{AuthResult, AuthService, RegisterTenant};
pub use calendar_service::{CalendarService, EventInput};
pub use contact_service::{ContactInput, ContactService};
pub use enrichment_service::{EnrichmentLimiter, EnrichmentService};
pub use notification_dispatcher::{DispatchHandle, NotificationDispatcher};
pub use notification_service::{NotificationService, RuleInput, TemplateInput};
pub use payroll_service::{NewPayrollRun, PayrollService};
pub use product_service::{ApprovedEnrichment, ProductInput, ProductService, VariantInput};
pub use project_service::{ProjectInput, ProjectService, TaskInput};
pub use pto_service::{NewPtoRequest, PtoService};
pub use staff_service::{NewStaff, StaffService, StaffUpdate};
pub use tax_sync_service::{SyncSummary, TaxDocumentService};
