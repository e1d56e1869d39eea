// Verification gate
//
// A linear smoke test: provider driver present, credential present, driver
// handle built for the requested endpoint, agent built, one live call
// answered. The first failing stage stops the run.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::agent::{Agent, AgentConfig};
use crate::bench::trial::timed;
use crate::config::{load_credential, CredentialSource, DEFAULT_TIMEOUT, DEFAULT_VERIFY_PROMPT};
use crate::error::BenchError;
use crate::events::{BenchEvent, EventSink};
use crate::llm_driver_registry::{ChatDriver, DriverRegistry, ProviderConfig, ProviderType};

/// Stages of the verification gate, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyStage {
    Import,
    Credential,
    Model,
    Agent,
    Call,
}

impl VerifyStage {
    /// Diagnostic prefix printed when this stage fails
    pub fn prefix(&self) -> &'static str {
        match self {
            VerifyStage::Import => "IMPORT ERROR",
            VerifyStage::Credential => "CREDENTIAL ERROR",
            VerifyStage::Model => "MODEL ERROR",
            VerifyStage::Agent => "AGENT ERROR",
            VerifyStage::Call => "CALL ERROR",
        }
    }
}

impl std::fmt::Display for VerifyStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VerifyStage::Import => "import",
            VerifyStage::Credential => "credential",
            VerifyStage::Model => "model",
            VerifyStage::Agent => "agent",
            VerifyStage::Call => "call",
        };
        f.write_str(name)
    }
}

/// The stage that stopped verification and why
#[derive(Debug, Error)]
#[error("{}: {error}", .stage.prefix())]
pub struct VerifyFailure {
    pub stage: VerifyStage,
    #[source]
    pub error: BenchError,
}

impl VerifyFailure {
    fn at(stage: VerifyStage) -> impl FnOnce(BenchError) -> Self {
        move |error| VerifyFailure { stage, error }
    }
}

/// Options for one verification run
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    pub provider: ProviderType,
    pub model: String,
    pub base_url: Option<String>,
    pub prompt: String,
    pub description: String,
    pub timeout: Duration,
}

impl VerifyOptions {
    pub fn new(provider: ProviderType) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            base_url: None,
            prompt: DEFAULT_VERIFY_PROMPT.to_string(),
            description: "Test agent".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Successful verification
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub provider: ProviderType,
    pub model: String,
    pub masked_key: String,
    pub response: String,
    pub elapsed_secs: f64,
}

/// Run the gate. Returns the live response or the first failing stage.
pub async fn run_verification(
    registry: &DriverRegistry,
    credentials: &dyn CredentialSource,
    options: &VerifyOptions,
    sink: &dyn EventSink,
) -> Result<VerifyReport, VerifyFailure> {
    let provider = options.provider;
    let passed = |stage: VerifyStage, detail: String| {
        tracing::info!(%stage, %detail, "Verification stage passed");
        sink.emit(BenchEvent::StagePassed { stage, detail });
    };

    if !registry.has_driver(&provider) {
        return Err(VerifyFailure {
            stage: VerifyStage::Import,
            error: BenchError::driver_not_registered(provider.to_string()),
        });
    }
    passed(
        VerifyStage::Import,
        format!("Driver registered for provider '{provider}'"),
    );

    let api_key = load_credential(credentials, provider.credential_var())
        .map_err(VerifyFailure::at(VerifyStage::Credential))?;
    passed(
        VerifyStage::Credential,
        format!("Found {}: {}", provider.credential_var(), api_key.masked()),
    );
    let masked_key = api_key.masked();

    let mut provider_config = ProviderConfig::new(provider).with_api_key(api_key);
    if let Some(url) = &options.base_url {
        provider_config = provider_config.with_base_url(url.clone());
    }
    let driver: Arc<dyn ChatDriver> = registry
        .create_driver(&provider_config)
        .map(Arc::from)
        .map_err(VerifyFailure::at(VerifyStage::Model))?;
    passed(
        VerifyStage::Model,
        format!("Chat model handle created ({provider}, {})", options.model),
    );

    let agent = Agent::new(
        driver,
        AgentConfig::new(options.model.clone()).with_description(options.description.clone()),
    )
    .map_err(VerifyFailure::at(VerifyStage::Agent))?;
    passed(VerifyStage::Agent, "Agent created successfully".to_string());

    let (outcome, elapsed) = timed(Some(options.timeout), agent.run(&options.prompt)).await;
    let response = outcome.map_err(VerifyFailure::at(VerifyStage::Call))?;
    passed(
        VerifyStage::Call,
        format!("Agent responded in {:.2}s", elapsed.as_secs_f64()),
    );

    Ok(VerifyReport {
        provider,
        model: options.model.clone(),
        masked_key,
        response,
        elapsed_secs: elapsed.as_secs_f64(),
    })
}
