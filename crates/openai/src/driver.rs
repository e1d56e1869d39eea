// OpenAI Chat Driver
//
// Production implementation for OpenAI's chat completions API and compatible
// gateways.

use async_trait::async_trait;
use reqwest::Client;

use sayr_core::config::ApiKey;
use sayr_core::error::{BenchError, Result};
use sayr_core::llm_driver_registry::{
    BoxedChatDriver, ChatCallConfig, ChatDriver, ChatMessage, ChatResponse, DriverRegistry,
    ProviderType,
};

use crate::types::{OpenAiChatRequest, OpenAiChatResponse};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI Chat Driver
///
/// # Example
///
/// ```ignore
/// use sayr_openai::OpenAILlmDriver;
///
/// let driver = OpenAILlmDriver::new(api_key);
/// // or with custom endpoint
/// let driver = OpenAILlmDriver::with_base_url(api_key, "https://api.example.com/v1/chat/completions");
/// ```
#[derive(Clone)]
pub struct OpenAILlmDriver {
    client: Client,
    api_key: ApiKey,
    api_url: String,
}

impl OpenAILlmDriver {
    /// Create a new driver with the given API key
    pub fn new(api_key: ApiKey) -> Self {
        Self::with_base_url(api_key, OPENAI_API_URL)
    }

    /// Create a new driver with a custom API URL
    pub fn with_base_url(api_key: ApiKey, api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_url: api_url.into(),
        }
    }

    /// Get the API URL
    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl ChatDriver for OpenAILlmDriver {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        config: &ChatCallConfig,
    ) -> Result<ChatResponse> {
        let request = OpenAiChatRequest::new(&messages, config);

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(self.api_key.expose())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| BenchError::transient(format!("Failed to send OpenAI request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BenchError::provider_status(
                "openai",
                status.as_u16(),
                &error_text,
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BenchError::transient(format!("Failed to read OpenAI response: {e}")))?;
        let parsed: OpenAiChatResponse = serde_json::from_str(&body)
            .map_err(|e| BenchError::contract(format!("Unexpected OpenAI response: {e}")))?;

        let response = parsed.into_chat_response(&config.model)?;
        tracing::trace!(
            model = ?response.metadata.model,
            finish_reason = ?response.metadata.finish_reason,
            "OpenAI chat completed"
        );
        Ok(response)
    }

    fn provider(&self) -> ProviderType {
        ProviderType::OpenAI
    }
}

impl std::fmt::Debug for OpenAILlmDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAILlmDriver")
            .field("api_url", &self.api_url())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Driver Registration
// ============================================================================

/// Register the OpenAI driver with the driver registry
///
/// Should be called at application startup to enable OpenAI model support.
pub fn register_driver(registry: &mut DriverRegistry) {
    registry.register(ProviderType::OpenAI, |api_key, base_url| {
        let driver = match base_url {
            Some(url) => OpenAILlmDriver::with_base_url(api_key.clone(), checked_endpoint(url)?),
            None => OpenAILlmDriver::new(api_key.clone()),
        };
        Ok(Box::new(driver) as BoxedChatDriver)
    });
}

/// Endpoint overrides must be absolute http(s) URLs
fn checked_endpoint(url: &str) -> Result<&str> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| BenchError::config(format!("Invalid OpenAI endpoint '{url}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(BenchError::config(format!(
            "Invalid OpenAI endpoint '{url}': scheme must be http or https"
        )));
    }
    Ok(url)
}
