// Sayr benchmark CLI
//
// Design Decision: Use clap derive for ergonomic argument parsing.
// Design Decision: Support text/json/yaml output formats for scripting.
// Design Decision: Logs go to stderr so stdout carries only progress and reports.

mod commands;
mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sayr_core::config::EnvCredentials;
use sayr_core::llm_driver_registry::DriverRegistry;

#[derive(Parser)]
#[command(name = "sayr-bench")]
#[command(about = "Sayr benchmark harness - latency, CPU and binding verification")]
#[command(version)]
pub struct Cli {
    /// Output format
    #[arg(long, short, global = true, default_value = "text", value_parser = ["text", "json", "yaml"])]
    pub output: String,

    /// Suppress progress output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Load environment from this file instead of ./.env
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Time one prompt through the bare driver and through an agent
    Latency(commands::latency::LatencyArgs),

    /// Time the reference and native text processors
    Cpu(commands::cpu::CpuArgs),

    /// Check provider binding, credential, agent and one live call
    Verify(commands::verify::VerifyArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    load_env(cli.env_file.as_deref())?;

    let output_format = output::OutputFormat::from_str(&cli.output);
    let registry = driver_registry();
    let credentials = EnvCredentials;

    match cli.command {
        Commands::Latency(args) => {
            commands::latency::run(args, &registry, &credentials, output_format, cli.quiet).await
        }
        Commands::Cpu(args) => commands::cpu::run(args, output_format, cli.quiet).await,
        Commands::Verify(args) => {
            commands::verify::run(args, &registry, &credentials, output_format, cli.quiet).await
        }
    }
}

fn init_tracing(quiet: bool) {
    let default_filter = if quiet {
        "sayr_cli=warn,sayr_core=warn"
    } else {
        "sayr_cli=info,sayr_core=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load `.env` once. An explicit file must exist; the implicit one is optional.
fn load_env(env_file: Option<&Path>) -> Result<()> {
    match env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load env file {}", path.display()))?;
            tracing::debug!(path = %path.display(), "Loaded env file");
        }
        None => {
            if let Ok(path) = dotenvy::dotenv() {
                tracing::debug!(path = %path.display(), "Loaded .env");
            }
        }
    }
    Ok(())
}

fn driver_registry() -> DriverRegistry {
    let mut registry = DriverRegistry::new();
    sayr_cohere::register_driver(&mut registry);
    sayr_openai::register_driver(&mut registry);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use sayr_core::llm_driver_registry::ProviderType;

    #[test]
    fn test_registry_has_both_providers() {
        let registry = driver_registry();
        assert!(registry.has_driver(&ProviderType::Cohere));
        assert!(registry.has_driver(&ProviderType::OpenAI));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["sayr-bench", "cpu", "--output", "json", "--quiet"]);
        assert_eq!(cli.output, "json");
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Cpu(_)));
    }

    #[test]
    fn test_missing_env_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_env(Some(&dir.path().join("absent.env"))).unwrap_err();
        assert!(err.to_string().contains("absent.env"));
    }
}
