//! Domain errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Tenant not active")]
    TenantNotActive,

    #[error("External service error ({service}): {message}")]
    ExternalService { service: &'static str, message: String },

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str) -> Self {
        DomainError::NotFound { entity }
    }

    pub fn external(service: &'static str, message: impl Into<String>) -> Self {
        DomainError::ExternalService {
            service,
            message: message.into(),
        }
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        DomainError::Validation(errors.to_string())
    }
}
