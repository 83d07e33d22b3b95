//! Repository traits (ports)
//!
//! Every method takes the tenant id explicitly; implementations must never
//! return or touch rows of another tenant, nor soft-deleted rows.

pub mod contact_repository;
pub mod event_repository;
pub mod notification_repository;
pub mod payroll_repository;
pub mod product_repository;
pub mod project_repository;
pub mod pto_repository;
pub mod staff_repository;
pub mod tax_document_repository;
pub mod tenant_repository;

pub use contact_repository::{ContactFilter, ContactRepository};
pub use event_repository::EventRepository;
pub use notification_repository::{
    NotificationRepository, NotificationRuleRepository, NotificationTemplateRepository,
};
pub use payroll_repository::PayrollRepository;
pub use product_repository::{ProductFilter, ProductRepository};
pub use project_repository::{ProjectRepository, TaskFilter, TaskRepository};
pub use pto_repository::{PtoFilter, PtoRepository};
pub use staff_repository::{RoleRepository, StaffFilter, StaffRepository};
pub use tax_document_repository::{TaxDocumentFilter, TaxDocumentRepository};
pub use tenant_repository::TenantRepository;

#[cfg(any(test, feature = "mock"))]
pub use contact_repository::MockContactRepository;
#[cfg(any(test, feature = "mock"))]
pub use event_repository::MockEventRepository;
#[cfg(any(test, feature = "mock"))]
pub use notification_repository::{
    MockNotificationRepository, MockNotificationRuleRepository, MockNotificationTemplateRepository,
};
#[cfg(any(test, feature = "mock"))]
pub use payroll_repository::MockPayrollRepository;
#[cfg(any(test, feature = "mock"))]
pub use product_repository::MockProductRepository;
#[cfg(any(test, feature = "mock"))]
pub use project_repository::{MockProjectRepository, MockTaskRepository};
#[cfg(any(test, feature = "mock"))]
pub use pto_repository::MockPtoRepository;
#[cfg(any(test, feature = "mock"))]
pub use staff_repository::{MockRoleRepository, MockStaffRepository};
#[cfg(any(test, feature = "mock"))]
pub use tax_document_repository::MockTaxDocumentRepository;
#[cfg(any(test, feature = "mock"))]
pub use tenant_repository::MockTenantRepository;
