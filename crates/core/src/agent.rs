// Agent
//
// Couples a chat driver to descriptive metadata. Each `run` is one
// independent exchange (system prompt + user instruction); the agent keeps no
// transcript, so it can be shared read-only across benchmark iterations.

use std::sync::Arc;

use crate::error::{BenchError, Result};
use crate::llm_driver_registry::{ChatCallConfig, ChatDriver, ChatMessage};

const MARKDOWN_INSTRUCTION: &str = "Use markdown to format your answers.";

/// Configuration for an agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Model identifier (e.g., "command-a-03-2025", "gpt-4o")
    pub model: String,

    /// Description that becomes the system prompt
    pub description: Option<String>,

    /// Ask the model to format replies as markdown
    pub markdown: bool,

    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl AgentConfig {
    /// Create a new agent configuration
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            description: None,
            markdown: false,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_markdown(mut self, markdown: bool) -> Self {
        self.markdown = markdown;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// System prompt derived from description and markdown flag
    pub fn system_prompt(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(description) = self.description.as_deref().filter(|d| !d.trim().is_empty()) {
            parts.push(description.to_string());
        }
        if self.markdown {
            parts.push(MARKDOWN_INSTRUCTION.to_string());
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }
}

/// A chat driver wrapped with agent metadata
pub struct Agent {
    driver: Arc<dyn ChatDriver>,
    config: AgentConfig,
    call_config: ChatCallConfig,
    system_prompt: Option<String>,
}

impl Agent {
    /// Construct an agent. Fails if the model identifier is empty.
    pub fn new(driver: Arc<dyn ChatDriver>, config: AgentConfig) -> Result<Self> {
        if config.model.trim().is_empty() {
            return Err(BenchError::config("agent model identifier must not be empty"));
        }

        let mut call_config = ChatCallConfig::new(config.model.clone());
        call_config.temperature = config.temperature;
        call_config.max_tokens = config.max_tokens;
        let system_prompt = config.system_prompt();

        Ok(Self {
            driver,
            config,
            call_config,
            system_prompt,
        })
    }

    /// Messages sent for one instruction
    pub fn messages_for(&self, instruction: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(prompt) = &self.system_prompt {
            messages.push(ChatMessage::system(prompt.clone()));
        }
        messages.push(ChatMessage::user(instruction));
        messages
    }

    /// Run one natural-language instruction and return the reply text
    pub async fn run(&self, instruction: &str) -> Result<String> {
        let response = self
            .driver
            .chat(self.messages_for(instruction), &self.call_config)
            .await?;
        tracing::debug!(
            model = %self.config.model,
            completion_tokens = ?response.metadata.completion_tokens,
            "Agent run completed"
        );
        Ok(response.text)
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("provider", &self.driver.provider())
            .field("config", &self.config)
            .finish()
    }
}
