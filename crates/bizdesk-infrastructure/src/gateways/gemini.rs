// ============================================================================
// BizDesk Infrastructure - Gemini Content Generator
// File: crates/bizdesk-infrastructure/src/gateways/gemini.rs
// ============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use bizdesk_core::error::DomainError;
use bizdesk_core::gateways::ContentGenerator;
use bizdesk_shared::config::LlmSettings;

use super::{ensure_success, http_client, network_error};

const SERVICE: &str = "gemini";

/// Google Gemini `generateContent` client.
pub struct GeminiGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: GeminiContent<'a>,
    contents: Vec<GeminiContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiGenerator {
    pub fn new(settings: &LlmSettings) -> Result<Self, DomainError> {
        Ok(Self {
            client: http_client("gemini", settings.timeout_seconds)?,
            base_url: settings.gemini_base_url.trim_end_matches('/').to_string(),
            api_key: settings.gemini_api_key.clone(),
            model: settings.gemini_model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }
}

#[async_trait]
impl ContentGenerator for GeminiGenerator {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, DomainError> {
        if self.api_key.is_empty() {
            return Err(DomainError::external(SERVICE, "API key not configured"));
        }

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = GenerateRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: system }],
            },
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| network_error(SERVICE, e))?;
        let response = ensure_success(SERVICE, response).await?;

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| DomainError::external(SERVICE, format!("unreadable response: {}", e)))?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(DomainError::external(SERVICE, "empty completion"));
        }
        debug!(model = %self.model, chars = text.len(), "Gemini completion received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: &str) -> LlmSettings {
        LlmSettings {
            timeout_seconds: 5,
            gemini_base_url: base_url.to_string(),
            gemini_api_key: "g-key".to_string(),
            gemini_model: "gemini-test".to_string(),
            openai_base_url: String::new(),
            openai_api_key: String::new(),
            openai_model: String::new(),
            premium_model: String::new(),
            temperature: 0.2,
            max_tokens: 100,
        }
    }

    #[tokio::test]
    async fn test_complete_joins_candidate_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-test:generateContent"))
            .and(header("x-goog-api-key", "g-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": "{\"name\":" }, { "text": "\"Mug\"}" }] } }]
            })))
            .mount(&server)
            .await;

        let generator = GeminiGenerator::new(&settings(&server.uri())).unwrap();
        let text = generator.complete("system", "prompt").await.unwrap();
        assert_eq!(text, "{\"name\":\"Mug\"}");
    }

    #[tokio::test]
    async fn test_http_error_becomes_external() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
            .mount(&server)
            .await;

        let generator = GeminiGenerator::new(&settings(&server.uri())).unwrap();
        let err = generator.complete("s", "p").await.unwrap_err();
        match err {
            DomainError::ExternalService { service, message } => {
                assert_eq!(service, "gemini");
                assert!(message.contains("429"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let mut cfg = settings("http://127.0.0.1:9");
        cfg.gemini_api_key.clear();
        let err = GeminiGenerator::new(&cfg).unwrap().complete("s", "p").await.unwrap_err();
        assert!(matches!(err, DomainError::ExternalService { .. }));
    }
}
