// ============================================================================
// BizDesk Infrastructure - OpenAI Content Generator
// File: crates/bizdesk-infrastructure/src/gateways/openai.rs
// ============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use bizdesk_core::error::DomainError;
use bizdesk_core::gateways::ContentGenerator;
use bizdesk_shared::config::LlmSettings;

use super::{ensure_success, http_client, network_error};

const SERVICE: &str = "openai";

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiGenerator {
    /// The standard model.
    pub fn new(settings: &LlmSettings) -> Result<Self, DomainError> {
        Self::with_model(settings, &settings.openai_model)
    }

    /// The premium model, same endpoint and key.
    pub fn premium(settings: &LlmSettings) -> Result<Self, DomainError> {
        Self::with_model(settings, &settings.premium_model)
    }

    fn with_model(settings: &LlmSettings, model: &str) -> Result<Self, DomainError> {
        Ok(Self {
            client: http_client("openai", settings.timeout_seconds)?,
            base_url: settings.openai_base_url.trim_end_matches('/').to_string(),
            api_key: settings.openai_api_key.clone(),
            model: model.to_string(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }
}

#[async_trait]
impl ContentGenerator for OpenAiGenerator {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, DomainError> {
        if self.api_key.is_empty() {
            return Err(DomainError::external(SERVICE, "API key not configured"));
        }

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| network_error(SERVICE, e))?;
        let response = ensure_success(SERVICE, response).await?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| DomainError::external(SERVICE, format!("unreadable response: {}", e)))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(DomainError::external(SERVICE, "empty completion"));
        }
        debug!(model = %self.model, chars = text.len(), "OpenAI completion received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: &str) -> LlmSettings {
        LlmSettings {
            timeout_seconds: 5,
            gemini_base_url: String::new(),
            gemini_api_key: String::new(),
            gemini_model: String::new(),
            openai_base_url: format!("{}/v1/", base_url),
            openai_api_key: "sk-test".to_string(),
            openai_model: "small".to_string(),
            premium_model: "large".to_string(),
            temperature: 0.2,
            max_tokens: 100,
        }
    }

    fn reply(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        }))
    }

    #[tokio::test]
    async fn test_complete_sends_bearer_and_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({ "model": "small" })))
            .respond_with(reply("hello"))
            .expect(1)
            .mount(&server)
            .await;

        let text = OpenAiGenerator::new(&settings(&server.uri()))
            .unwrap()
            .complete("s", "p")
            .await
            .unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn test_premium_uses_premium_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({ "model": "large" })))
            .respond_with(reply("premium"))
            .expect(1)
            .mount(&server)
            .await;

        let text = OpenAiGenerator::premium(&settings(&server.uri()))
            .unwrap()
            .complete("s", "p")
            .await
            .unwrap();
        assert_eq!(text, "premium");
    }

    #[tokio::test]
    async fn test_empty_choice_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = OpenAiGenerator::new(&settings(&server.uri()))
            .unwrap()
            .complete("s", "p")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ExternalService { service: "openai", .. }));
    }
}
