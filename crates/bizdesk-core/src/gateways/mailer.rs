//! Outbound e-mail port.

use async_trait::async_trait;

use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DomainError>;
}
