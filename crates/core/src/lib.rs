// Benchmark and verification core
//
// This crate holds everything that does not touch the network: the chat
// driver seam, the agent, the timed trial loop and the CPU workloads.
//
// Key design decisions:
// - Providers implement ChatDriver in their own crates and register a factory
//   in DriverRegistry at startup
// - Every trial returns an explicit Result; ErrorPolicy decides skip vs abort
// - Runners report progress through EventSink and never print
// - Credentials come through CredentialSource so tests never read the process env

pub mod agent;
pub mod bench;
pub mod config;
pub mod error;
pub mod events;
pub mod llm_driver_registry;
pub mod processor;
pub mod verify;

// In-memory implementations for examples and testing
pub mod memory;

// Re-exports for convenience
pub use agent::{Agent, AgentConfig};
pub use bench::{
    BenchmarkSummary, Comparison, CpuBenchmark, LatencyBenchmark, Sample, SampleSet, AGENT_PATH,
    DIRECT_PATH,
};
pub use config::{
    load_credential, ApiKey, CpuConfig, CredentialSource, EnvCredentials, ErrorPolicy,
    LatencyConfig, TrialSettings,
};
pub use error::{BenchError, FailureKind, Result};
pub use events::{BenchEvent, EventSink, NoopSink};
pub use llm_driver_registry::{
    BoxedChatDriver, ChatCallConfig, ChatDriver, ChatMessage, ChatResponse, ChatRole,
    CompletionMetadata, DriverFactory, DriverRegistry, ProviderConfig, ProviderType,
};
pub use processor::{NativeProcessor, ReferenceProcessor, TextProcessor};
pub use verify::{run_verification, VerifyFailure, VerifyOptions, VerifyReport, VerifyStage};
