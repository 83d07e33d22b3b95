//! Text generation port, implemented by the LLM provider clients.

use async_trait::async_trait;

use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Sends one system + user prompt pair and returns the model's text reply.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, DomainError>;
}
