// OpenAI Driver Implementation
//
// This crate provides an OpenAI-compatible chat driver. It implements the
// ChatDriver trait from sayr-core and registers itself with the DriverRegistry.

mod driver;
mod types;


pub use driver::{register_driver, OpenAILlmDriver};
pub use types::{OpenAiChatRequest, OpenAiChatResponse, OpenAiMessage};

// Re-export core types for convenience
pub use sayr_core::llm_driver_registry::{ChatDriver, DriverRegistry};
