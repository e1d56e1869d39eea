// Cohere Driver Implementation
//
// This crate provides the Cohere chat driver. It implements the ChatDriver
// trait from sayr-core and registers itself with the DriverRegistry.

mod driver;
mod types;


pub use driver::{register_driver, CohereLlmDriver};
pub use types::{CohereChatRequest, CohereChatResponse, CohereMessage};

// Re-export core types for convenience
pub use sayr_core::llm_driver_registry::{ChatDriver, DriverRegistry};
