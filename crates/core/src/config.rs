// Run configuration and credential loading
//
// All configuration is resolved once at the program boundary and passed into
// constructors. Nothing below the CLI reads the process environment except
// through a CredentialSource handed to it.

use std::time::Duration;

use serde::Serialize;

use crate::error::{BenchError, FailureKind, Result};

/// Prompt sent on every latency trial
pub const DEFAULT_PROMPT: &str = "Say hello in one word.";

/// Prompt sent by the verification gate
pub const DEFAULT_VERIFY_PROMPT: &str = "Hello! Please confirm which model you are.";

/// Trials per code path
pub const DEFAULT_ITERATIONS: usize = 10;

/// Per-call deadline for network trials
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Fibonacci input for the CPU comparison
pub const DEFAULT_FIBONACCI_INPUT: u32 = 30;

/// Word repeated to build the token-count corpus
pub const DEFAULT_TOKEN_WORD: &str = "word";

/// Repetitions of the token word (10 MB with the default word)
pub const DEFAULT_TOKEN_WORDS: usize = 2_000_000;

// ============================================================================
// Credentials
// ============================================================================

/// An API key. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Raw key, for drivers building auth headers
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First few characters followed by an ellipsis, for diagnostics
    pub fn masked(&self) -> String {
        let prefix: String = self.0.chars().take(4).collect();
        format!("{prefix}...")
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// Where named secrets come from
pub trait CredentialSource: Send + Sync {
    /// Look up a secret by name
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads secrets from the process environment.
///
/// The CLI populates the environment from `.env` before constructing this.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Resolve a required secret. Absent and empty values are both missing.
pub fn load_credential(source: &dyn CredentialSource, name: &str) -> Result<ApiKey> {
    match source.get(name) {
        Some(value) if !value.trim().is_empty() => Ok(ApiKey::new(value)),
        _ => Err(BenchError::missing_credential(name)),
    }
}

// ============================================================================
// Error policy
// ============================================================================

/// What a run does when a trial fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Drop the failed sample and continue
    #[default]
    Tolerant,
    /// Abort the whole run on the first failure
    FailFast,
}

/// Outcome of applying a policy to one failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Skip,
    Abort,
}

impl ErrorPolicy {
    /// Decide what to do with a failure of the given kind.
    ///
    /// Configuration and contract failures abort regardless of policy.
    pub fn disposition(&self, kind: FailureKind) -> Disposition {
        match (self, kind) {
            (_, FailureKind::Configuration | FailureKind::Contract) => Disposition::Abort,
            (ErrorPolicy::FailFast, _) => Disposition::Abort,
            (ErrorPolicy::Tolerant, FailureKind::Transient | FailureKind::Timeout) => {
                Disposition::Skip
            }
        }
    }
}

impl std::str::FromStr for ErrorPolicy {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "tolerant" => Ok(ErrorPolicy::Tolerant),
            "fail-fast" | "fail_fast" | "failfast" => Ok(ErrorPolicy::FailFast),
            _ => Err(BenchError::config(format!("Unknown error policy: {s}"))),
        }
    }
}

impl std::fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorPolicy::Tolerant => write!(f, "tolerant"),
            ErrorPolicy::FailFast => write!(f, "fail-fast"),
        }
    }
}

// ============================================================================
// Run settings
// ============================================================================

/// Settings shared by every timed loop
#[derive(Debug, Clone)]
pub struct TrialSettings {
    pub iterations: usize,
    pub policy: ErrorPolicy,
    /// Per-call deadline; `None` runs calls unbounded
    pub timeout: Option<Duration>,
}

impl TrialSettings {
    pub fn new(iterations: usize) -> Self {
        Self {
            iterations,
            policy: ErrorPolicy::default(),
            timeout: None,
        }
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for TrialSettings {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            policy: ErrorPolicy::default(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

/// Configuration for the latency runner
#[derive(Debug, Clone)]
pub struct LatencyConfig {
    /// Model identifier sent with each request
    pub model: String,
    /// Prompt sent on every trial
    pub prompt: String,
    /// Description given to the agent on the agent path
    pub agent_description: String,
    /// Sampling temperature sent on both paths (provider default if unset)
    pub temperature: Option<f32>,
    /// Reply length cap sent on both paths (provider default if unset)
    pub max_tokens: Option<u32>,
    pub trials: TrialSettings,
}

impl LatencyConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: DEFAULT_PROMPT.to_string(),
            agent_description: "Bench agent".to_string(),
            temperature: None,
            max_tokens: None,
            trials: TrialSettings::default(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_trials(mut self, trials: TrialSettings) -> Self {
        self.trials = trials;
        self
    }
}

/// Configuration for the CPU runner
#[derive(Debug, Clone)]
pub struct CpuConfig {
    pub fibonacci_input: u32,
    pub token_word: String,
    pub token_words: usize,
    pub trials: TrialSettings,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            fibonacci_input: DEFAULT_FIBONACCI_INPUT,
            token_word: DEFAULT_TOKEN_WORD.to_string(),
            token_words: DEFAULT_TOKEN_WORDS,
            // CPU work cannot be interrupted, so there is no deadline
            trials: TrialSettings::new(DEFAULT_ITERATIONS),
        }
    }
}
