//! Outbound HTTP/SMTP adapters for the core gateway ports

mod gemini;
mod imgbb;
mod openai;
mod openfactura;
mod smtp;
mod web_search;

pub use gemini::GeminiGenerator;
pub use imgbb::ImgbbImageHost;
pub use openai::OpenAiGenerator;
pub use openfactura::OpenFacturaSource;
pub use smtp::SmtpMailer;
pub use web_search::GoogleWebResearcher;

use bizdesk_core::error::DomainError;
use reqwest::{Client, Response};
use std::time::Duration;

pub(crate) fn http_client(service: &'static str, timeout_seconds: u64) -> Result<Client, DomainError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds.max(1)))
        .user_agent(concat!("bizdesk/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| DomainError::InternalError(format!("{} HTTP client could not be built: {}", service, e)))
}

/// Passes a successful response through; otherwise turns status and body
/// into an `ExternalService` error.
pub(crate) async fn ensure_success(service: &'static str, response: Response) -> Result<Response, DomainError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let text: String = text.chars().take(300).collect();
    Err(DomainError::external(service, format!("HTTP {}: {}", status, text)))
}

pub(crate) fn network_error(service: &'static str, e: reqwest::Error) -> DomainError {
    DomainError::external(service, format!("request failed: {}", e))
}
