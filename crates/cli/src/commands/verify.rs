// Verify command - staged smoke test of the provider binding

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use serde_json::json;

use crate::output::{ConsoleSink, OutputFormat};
use sayr_core::config::{CredentialSource, DEFAULT_TIMEOUT, DEFAULT_VERIFY_PROMPT};
use sayr_core::llm_driver_registry::{DriverRegistry, ProviderType};
use sayr_core::verify::{run_verification, VerifyOptions};

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Chat provider
    #[arg(long, default_value = "cohere")]
    pub provider: ProviderType,

    /// Model identifier (provider default if omitted)
    #[arg(long)]
    pub model: Option<String>,

    /// Full endpoint URL override
    #[arg(long)]
    pub base_url: Option<String>,

    /// Prompt for the live call
    #[arg(long, default_value = DEFAULT_VERIFY_PROMPT)]
    pub prompt: String,

    /// Live call timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout: u64,
}

impl VerifyArgs {
    fn options(self) -> VerifyOptions {
        let mut options = VerifyOptions::new(self.provider)
            .with_prompt(self.prompt)
            .with_timeout(Duration::from_secs(self.timeout));
        if let Some(model) = self.model {
            options = options.with_model(model);
        }
        if let Some(url) = self.base_url {
            options = options.with_base_url(url);
        }
        options
    }
}

pub async fn run(
    args: VerifyArgs,
    registry: &DriverRegistry,
    credentials: &dyn CredentialSource,
    output: OutputFormat,
    quiet: bool,
) -> Result<ExitCode> {
    let options = args.options();
    let sink = ConsoleSink::new(output, quiet);

    match run_verification(registry, credentials, &options, &sink).await {
        Ok(report) => {
            if output.is_text() {
                println!("MATCH: Agent Response: {}", report.response);
                println!("Verification finished.");
            } else {
                output.print_value(&json!({ "status": "passed", "report": report }))?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            tracing::error!(stage = %failure.stage, error = %failure.error, "Verification failed");
            if output.is_text() {
                println!("{failure}");
            } else {
                output.print_value(&json!({
                    "status": "failed",
                    "stage": failure.stage,
                    "error": failure.error.to_string(),
                }))?;
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
