//! # BizDesk Core - Domain Module
//!
//! Domain entities for the back office. Every entity except `Tenant` is
//! scoped by `tenant_id` and carries soft-delete audit fields.

pub mod contact;
pub mod enrichment;
pub mod event;
pub mod notification;
pub mod payroll;
pub mod product;
pub mod project;
pub mod pto;
pub mod rut;
pub mod staff;
pub mod tax_document;
pub mod tenant;

// Re-export all entities and enums
pub use contact::{Contact, ContactKind};
pub use enrichment::{
    Confidence, EnrichmentMethod, EnrichmentResult, FieldSuggestion, MethodFailure, MethodResult,
    ProductDraft,
};
pub use event::Event;
pub use notification::{
    Channel, Notification, NotificationRule, NotificationStatus, NotificationTemplate, Recipient,
};
pub use payroll::{PayrollLine, PayrollRates, PayrollRun, PayrollStatus};
pub use product::{Product, ProductVariant};
pub use project::{Project, ProjectStatus, Task, TaskPriority, TaskStatus};
pub use pto::{PtoKind, PtoRequest, PtoStatus, ReviewAction};
pub use rut::Rut;
pub use staff::{Role, Staff};
pub use tax_document::{Direction, TaxDocument, TaxDocumentItem, UpsertOutcome};
pub use tenant::Tenant;
