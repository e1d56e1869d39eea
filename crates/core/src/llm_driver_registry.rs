// Chat Driver Abstractions
//
// This module encapsulates everything the runners need to talk to a chat provider:
// - ChatDriver trait and message types for provider-agnostic chat turns
// - ProviderType / ProviderConfig describing which provider and credential to use
// - DriverRegistry for driver registration at startup
//
// Design: Dependency inversion - provider crates (sayr-cohere, sayr-openai)
// depend on core and register their drivers at startup. Core has no knowledge of
// specific provider implementations.
//
// The registry does NOT read environment variables. Keys are resolved by the
// caller (see config::load_credential) and passed in via ProviderConfig.

use crate::config::ApiKey;
use crate::error::{BenchError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// ChatDriver Trait
// ============================================================================

/// Trait for chat drivers
///
/// Implementations send one non-streaming chat turn and extract the reply text.
/// A response without extractable text is a contract error, not an empty reply.
#[async_trait]
pub trait ChatDriver: Send + Sync {
    /// Send one chat turn and wait for the full response
    async fn chat(&self, messages: Vec<ChatMessage>, config: &ChatCallConfig)
        -> Result<ChatResponse>;

    /// Provider this driver talks to
    fn provider(&self) -> ProviderType;
}

/// Implement ChatDriver for Box<dyn ChatDriver> to allow dynamic dispatch
#[async_trait]
impl ChatDriver for Box<dyn ChatDriver> {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        config: &ChatCallConfig,
    ) -> Result<ChatResponse> {
        (**self).chat(messages, config).await
    }

    fn provider(&self) -> ProviderType {
        (**self).provider()
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// Message role for chat calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
}

impl ChatRole {
    /// Wire name shared by the supported providers
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
        }
    }
}

/// One message of a chat turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Configuration for a chat call
#[derive(Debug, Clone)]
pub struct ChatCallConfig {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatCallConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Metadata about a completion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompletionMetadata {
    /// Input tokens
    pub prompt_tokens: Option<u32>,
    /// Output tokens
    pub completion_tokens: Option<u32>,
    /// Model reported by the provider
    pub model: Option<String>,
    /// Finish reason
    pub finish_reason: Option<String>,
}

/// Response from a chat call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    pub text: String,
    pub metadata: CompletionMetadata,
}

impl ChatResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: CompletionMetadata::default(),
        }
    }
}

// ============================================================================
// Provider Types
// ============================================================================

/// Supported chat providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Cohere,
    OpenAI,
}

impl ProviderType {
    /// Environment variable holding this provider's API key
    pub fn credential_var(&self) -> &'static str {
        match self {
            ProviderType::Cohere => "COHERE_API_KEY",
            ProviderType::OpenAI => "OPENAI_API_KEY",
        }
    }

    /// Model used when none is given
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderType::Cohere => "command-a-03-2025",
            ProviderType::OpenAI => "gpt-4o",
        }
    }
}

impl std::str::FromStr for ProviderType {
    type Err = BenchError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cohere" => Ok(ProviderType::Cohere),
            "openai" => Ok(ProviderType::OpenAI),
            _ => Err(BenchError::config(format!("Unknown provider type: {s}"))),
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderType::Cohere => write!(f, "cohere"),
            ProviderType::OpenAI => write!(f, "openai"),
        }
    }
}

/// Configuration for creating a chat driver
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Type of provider
    pub provider_type: ProviderType,
    /// API key for authentication
    pub api_key: Option<ApiKey>,
    /// Endpoint override (optional)
    pub base_url: Option<String>,
}

impl ProviderConfig {
    /// Create a new provider config
    pub fn new(provider_type: ProviderType) -> Self {
        Self {
            provider_type,
            api_key: None,
            base_url: None,
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: ApiKey) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Set the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Boxed chat driver for dynamic dispatch
pub type BoxedChatDriver = Box<dyn ChatDriver>;

// ============================================================================
// Driver Registry
// ============================================================================

/// Factory function type for creating chat drivers
///
/// Takes the api key and optional base url, returns a boxed driver.
/// Fails when the driver cannot be built from them (e.g. a malformed url).
pub type DriverFactory =
    Arc<dyn Fn(&ApiKey, Option<&str>) -> Result<BoxedChatDriver> + Send + Sync>;

/// Registry for chat drivers
///
/// # Example
///
/// ```ignore
/// use sayr_core::llm_driver_registry::DriverRegistry;
///
/// let mut registry = DriverRegistry::new();
/// sayr_cohere::register_driver(&mut registry);
/// sayr_openai::register_driver(&mut registry);
///
/// let driver = registry.create_driver(&config)?;
/// ```
#[derive(Clone, Default)]
pub struct DriverRegistry {
    factories: HashMap<ProviderType, DriverFactory>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a driver factory for a provider type
    pub fn register<F>(&mut self, provider_type: ProviderType, factory: F)
    where
        F: Fn(&ApiKey, Option<&str>) -> Result<BoxedChatDriver> + Send + Sync + 'static,
    {
        self.factories.insert(provider_type, Arc::new(factory));
    }

    /// Create a chat driver based on configuration
    ///
    /// Returns `DriverNotRegistered` if no factory exists for the provider,
    /// `MissingCredential` if the config carries no key, and the factory's
    /// error if it rejects the key or endpoint.
    pub fn create_driver(&self, config: &ProviderConfig) -> Result<BoxedChatDriver> {
        let factory = self.factories.get(&config.provider_type).ok_or_else(|| {
            BenchError::driver_not_registered(config.provider_type.to_string())
        })?;

        let api_key = config
            .api_key
            .as_ref()
            .ok_or_else(|| BenchError::missing_credential(config.provider_type.credential_var()))?;

        factory(api_key, config.base_url.as_deref())
    }

    /// Check if a driver is registered for a provider type
    pub fn has_driver(&self, provider_type: &ProviderType) -> bool {
        self.factories.contains_key(provider_type)
    }
}

// ============================================================================
// Tests
// ============================================================================
