// Error types for benchmark and verification runs
//
// Every failure carries a FailureKind so the trial engine can decide what to
// do with it (skip or abort) without inspecting messages.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, BenchError>;

/// Errors that can occur while benchmarking or verifying a provider
#[derive(Debug, Error)]
pub enum BenchError {
    /// Required secret is absent or empty
    #[error("{0} not found in environment")]
    MissingCredential(String),

    /// Invalid option or construction parameter
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No driver registered for the requested provider
    #[error("No driver registered for provider '{0}'")]
    DriverNotRegistered(String),

    /// Network or provider failure that may succeed on another attempt
    #[error("{0}")]
    Transient(String),

    /// Per-call deadline expired
    #[error("Call timed out after {0:?}")]
    Timeout(Duration),

    /// Collaborator returned something that violates its contract
    #[error("Contract violation: {0}")]
    Contract(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Failure category used by error policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Configuration,
    Transient,
    Timeout,
    Contract,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Configuration => write!(f, "configuration"),
            FailureKind::Transient => write!(f, "transient"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Contract => write!(f, "contract"),
        }
    }
}

impl BenchError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        BenchError::Configuration(msg.into())
    }

    /// Create a transient error
    pub fn transient(msg: impl Into<String>) -> Self {
        BenchError::Transient(msg.into())
    }

    /// Create a contract error
    pub fn contract(msg: impl Into<String>) -> Self {
        BenchError::Contract(msg.into())
    }

    /// Create a missing credential error
    pub fn missing_credential(name: impl Into<String>) -> Self {
        BenchError::MissingCredential(name.into())
    }

    /// Create a driver not registered error
    pub fn driver_not_registered(provider: impl Into<String>) -> Self {
        BenchError::DriverNotRegistered(provider.into())
    }

    /// Build the error for a non-success HTTP status returned by a provider
    ///
    /// Auth rejections are configuration errors: no retry fixes a bad key.
    pub fn provider_status(provider: &str, status: u16, body: &str) -> Self {
        match status {
            401 | 403 => BenchError::Configuration(format!(
                "{provider} rejected the API key with {status}: {body}"
            )),
            429 => BenchError::Transient(format!("{provider} rate limit exceeded: {body}")),
            _ => BenchError::Transient(format!("{provider} request failed with {status}: {body}")),
        }
    }

    /// Failure category of this error
    pub fn kind(&self) -> FailureKind {
        match self {
            BenchError::MissingCredential(_)
            | BenchError::Configuration(_)
            | BenchError::DriverNotRegistered(_) => FailureKind::Configuration,
            BenchError::Transient(_) => FailureKind::Transient,
            BenchError::Timeout(_) => FailureKind::Timeout,
            BenchError::Contract(_) | BenchError::Internal(_) => FailureKind::Contract,
        }
    }
}
