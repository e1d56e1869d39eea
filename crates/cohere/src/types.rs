// Cohere v2 chat wire types

use serde::{Deserialize, Serialize};

use sayr_core::error::{BenchError, Result};
use sayr_core::llm_driver_registry::{
    ChatCallConfig, ChatMessage, ChatResponse, CompletionMetadata,
};

#[derive(Debug, Clone, Serialize)]
pub struct CohereChatRequest {
    pub model: String,
    pub messages: Vec<CohereMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

impl CohereChatRequest {
    pub fn new(messages: &[ChatMessage], config: &ChatCallConfig) -> Self {
        Self {
            model: config.model.clone(),
            messages: messages
                .iter()
                .map(|m| CohereMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            stream: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohereMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CohereChatResponse {
    #[serde(default)]
    pub finish_reason: Option<String>,
    pub message: CohereResponseMessage,
    #[serde(default)]
    pub usage: Option<CohereUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CohereResponseMessage {
    #[serde(default)]
    pub content: Vec<CohereContentItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CohereContentItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CohereUsage {
    #[serde(default)]
    pub tokens: Option<CohereTokens>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CohereTokens {
    #[serde(default)]
    pub input_tokens: Option<f64>,
    #[serde(default)]
    pub output_tokens: Option<f64>,
}

impl CohereChatResponse {
    /// Extract the first text item. A reply without one is a contract violation.
    pub fn into_chat_response(self, model: &str) -> Result<ChatResponse> {
        let text = self
            .message
            .content
            .into_iter()
            .find(|item| item.kind == "text")
            .and_then(|item| item.text)
            .ok_or_else(|| BenchError::contract("Cohere response has no text content"))?;

        let tokens = self.usage.and_then(|u| u.tokens);
        let metadata = CompletionMetadata {
            prompt_tokens: tokens
                .as_ref()
                .and_then(|t| t.input_tokens)
                .map(|n| n as u32),
            completion_tokens: tokens
                .as_ref()
                .and_then(|t| t.output_tokens)
                .map(|n| n as u32),
            model: Some(model.to_string()),
            finish_reason: self.finish_reason,
        };

        Ok(ChatResponse { text, metadata })
    }
}
