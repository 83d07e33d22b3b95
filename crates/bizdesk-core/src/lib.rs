//! # BizDesk Core
//! 
//! Domain entities, services, repository traits and outbound gateway
//! traits for the BizDesk back office.

pub mod context;
pub mod domain;
pub mod error;
pub mod gateways;
pub mod repositories;
pub mod services;

// Re-export domain entities
pub use context::{Actor, TenantContext};
pub use domain::*;
pub use error::DomainError;
