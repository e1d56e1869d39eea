// Cohere Chat Driver
//
// Implementation of ChatDriver for Cohere's v2 chat API.
// One request per call, no streaming.

use async_trait::async_trait;
use reqwest::Client;

use sayr_core::config::ApiKey;
use sayr_core::error::{BenchError, Result};
use sayr_core::llm_driver_registry::{
    BoxedChatDriver, ChatCallConfig, ChatDriver, ChatMessage, ChatResponse, DriverRegistry,
    ProviderType,
};

use crate::types::{CohereChatRequest, CohereChatResponse};

const DEFAULT_API_URL: &str = "https://api.cohere.ai/v2/chat";

/// Cohere Chat Driver
///
/// # Example
///
/// ```ignore
/// use sayr_cohere::CohereLlmDriver;
///
/// let driver = CohereLlmDriver::new(api_key);
/// // or with custom endpoint
/// let driver = CohereLlmDriver::with_base_url(api_key, "http://localhost:8080/v2/chat");
/// ```
#[derive(Clone)]
pub struct CohereLlmDriver {
    client: Client,
    api_key: ApiKey,
    api_url: String,
}

impl CohereLlmDriver {
    /// Create a new driver with the given API key
    pub fn new(api_key: ApiKey) -> Self {
        Self::with_base_url(api_key, DEFAULT_API_URL)
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
impl ChatDriver for CohereLlmDriver {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        config: &ChatCallConfig,
    ) -> Result<ChatResponse> {
        let request = CohereChatRequest::new(&messages, config);

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(self.api_key.expose())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| BenchError::transient(format!("Failed to send Cohere request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BenchError::provider_status(
                "cohere",
                status.as_u16(),
                &error_text,
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BenchError::transient(format!("Failed to read Cohere response: {e}")))?;
        let parsed: CohereChatResponse = serde_json::from_str(&body)
            .map_err(|e| BenchError::contract(format!("Unexpected Cohere response: {e}")))?;

        let response = parsed.into_chat_response(&config.model)?;
        tracing::trace!(
            model = %config.model,
            prompt_tokens = ?response.metadata.prompt_tokens,
            completion_tokens = ?response.metadata.completion_tokens,
            "Cohere chat completed"
        );
        Ok(response)
    }

    fn provider(&self) -> ProviderType {
        ProviderType::Cohere
    }
}

impl std::fmt::Debug for CohereLlmDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CohereLlmDriver")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Driver Registration
// ============================================================================

/// Register the Cohere driver with the driver registry
///
/// ```ignore
/// use sayr_core::DriverRegistry;
/// use sayr_cohere::register_driver;
///
/// let mut registry = DriverRegistry::new();
/// register_driver(&mut registry);
/// ```
pub fn register_driver(registry: &mut DriverRegistry) {
    registry.register(ProviderType::Cohere, |api_key, base_url| {
        let driver = match base_url {
            Some(url) => CohereLlmDriver::with_base_url(api_key.clone(), checked_endpoint(url)?),
            None => CohereLlmDriver::new(api_key.clone()),
        };
        Ok(Box::new(driver) as BoxedChatDriver)
    });
}

/// Endpoint overrides must be absolute http(s) URLs
fn checked_endpoint(url: &str) -> Result<&str> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| BenchError::config(format!("Invalid Cohere endpoint '{url}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(BenchError::config(format!(
            "Invalid Cohere endpoint '{url}': scheme must be http or https"
        )));
    }
    Ok(url)
}
