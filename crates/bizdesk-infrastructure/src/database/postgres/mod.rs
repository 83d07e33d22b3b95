// PostgreSQL repository implementations
mod contact_repo_impl;
mod event_repo_impl;
mod notification_repo_impl;
mod payroll_repo_impl;
mod product_repo_impl;
mod project_repo_impl;
mod pto_repo_impl;
mod staff_repo_impl;
mod tax_document_repo_impl;
mod tenant_repo_impl;

pub use contact_repo_impl::PgContactRepository;
pub use event_repo_impl::PgEventRepository;
pub use notification_repo_impl::{
    PgNotificationRepository, PgNotificationRuleRepository, PgNotificationTemplateRepository,
};
pub use payroll_repo_impl::PgPayrollRepository;
pub use product_repo_impl::PgProductRepository;
pub use project_repo_impl::{PgProjectRepository, PgTaskRepository};
pub use pto_repo_impl::PgPtoRepository;
pub use staff_repo_impl::{PgRoleRepository, PgStaffRepository};
pub use tax_document_repo_impl::PgTaxDocumentRepository;
pub use tenant_repo_impl::PgTenantRepository;
