// ============================================================================
// BizDesk Infrastructure - imgbb Image Host
// File: crates/bizdesk-infrastructure/src/gateways/imgbb.rs
// ============================================================================

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use bizdesk_core::error::DomainError;
use bizdesk_core::gateways::ImageHost;
use bizdesk_shared::config::ImageHostSettings;

use super::{ensure_success, http_client, network_error};

const SERVICE: &str = "image_host";

pub struct ImgbbImageHost {
    client: Client,
    upload_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    data: UploadData,
}

#[derive(Deserialize)]
struct UploadData {
    url: String,
}

impl ImgbbImageHost {
    pub fn new(settings: &ImageHostSettings) -> Result<Self, DomainError> {
        Ok(Self {
            client: http_client("imgbb", settings.timeout_seconds)?,
            upload_url: settings.upload_url.clone(),
            api_key: settings.api_key.clone(),
        })
    }
}

#[async_trait]
impl ImageHost for ImgbbImageHost {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, DomainError> {
        if self.api_key.is_empty() {
            return Err(DomainError::external(SERVICE, "API key not configured"));
        }

        let size = bytes.len();
        let encoded = STANDARD.encode(bytes);
        let name = file_name.rsplit_once('.').map_or(file_name, |(stem, _)| stem);

        let response = self
            .client
            .post(&self.upload_url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[("image", encoded.as_str()), ("name", name)])
            .send()
            .await
            .map_err(|e| network_error(SERVICE, e))?;
        let response = ensure_success(SERVICE, response).await?;

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| DomainError::external(SERVICE, format!("unreadable response: {}", e)))?;

        info!(file_name, size, url = %body.data.url, "Image uploaded");
        Ok(body.data.url)
    }
}
