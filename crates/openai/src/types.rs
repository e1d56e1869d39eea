// OpenAI chat completion wire types

use serde::{Deserialize, Serialize};

use sayr_core::error::{BenchError, Result};
use sayr_core::llm_driver_registry::{
    ChatCallConfig, ChatMessage, ChatResponse, CompletionMetadata,
};

/// Request body for chat completions (non-streaming)
#[derive(Debug, Clone, Serialize)]
pub struct OpenAiChatRequest {
    pub model: String,
    pub messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

impl OpenAiChatRequest {
    pub fn new(messages: &[ChatMessage], config: &ChatCallConfig) -> Self {
        Self {
            model: config.model.clone(),
            messages: messages
                .iter()
                .map(|m| OpenAiMessage {
                    role: m.role.as_str().to_string(),
                    content: Some(m.content.clone()),
                })
                .collect(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            stream: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiChatResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<OpenAiChoice>,
    #[serde(default)]
    pub usage: Option<OpenAiUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiChoice {
    pub message: OpenAiMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiUsage {
    #[serde(default)]
    pub prompt_tokens: Option<u32>,
    #[serde(default)]
    pub completion_tokens: Option<u32>,
}

impl OpenAiChatResponse {
    /// Take `choices[0].message.content`; absent or null content is a contract violation.
    pub fn into_chat_response(self, requested_model: &str) -> Result<ChatResponse> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BenchError::contract("OpenAI response has no choices"))?;
        let text = choice
            .message
            .content
            .ok_or_else(|| BenchError::contract("OpenAI response has no message content"))?;

        let metadata = CompletionMetadata {
            prompt_tokens: self.usage.as_ref().and_then(|u| u.prompt_tokens),
            completion_tokens: self.usage.as_ref().and_then(|u| u.completion_tokens),
            model: Some(self.model.unwrap_or_else(|| requested_model.to_string())),
            finish_reason: choice.finish_reason,
        };

        Ok(ChatResponse { text, metadata })
    }
}
