//! Image hosting port.

use async_trait::async_trait;

use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Uploads the bytes and returns the public URL.
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, DomainError>;
}
