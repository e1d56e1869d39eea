// Latency command - direct driver path vs agent path

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;

use crate::output::{print_field, print_summary, BenchmarkReport, ConsoleSink, OutputFormat};
use sayr_core::bench::{BenchmarkSummary, LatencyBenchmark};
use sayr_core::config::{
    load_credential, CredentialSource, ErrorPolicy, LatencyConfig, TrialSettings,
    DEFAULT_ITERATIONS, DEFAULT_PROMPT, DEFAULT_TIMEOUT,
};
use sayr_core::llm_driver_registry::{ChatDriver, DriverRegistry, ProviderConfig, ProviderType};

/// Which code paths to measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PathSelection {
    Direct,
    Agent,
    Both,
}

#[derive(Debug, Args)]
pub struct LatencyArgs {
    /// Chat provider
    #[arg(long, default_value = "cohere")]
    pub provider: ProviderType,

    /// Model identifier (provider default if omitted)
    #[arg(long)]
    pub model: Option<String>,

    /// Full endpoint URL override
    #[arg(long)]
    pub base_url: Option<String>,

    /// Trials per path
    #[arg(long, short = 'n', default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: usize,

    /// Prompt sent on every trial
    #[arg(long, default_value = DEFAULT_PROMPT)]
    pub prompt: String,

    /// Per-call timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout: u64,

    /// Sampling temperature (provider default if omitted)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Maximum reply tokens (provider default if omitted)
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// What to do when a trial fails
    #[arg(long, default_value = "tolerant")]
    pub policy: ErrorPolicy,

    /// Paths to benchmark
    #[arg(long, value_enum, default_value_t = PathSelection::Both)]
    pub path: PathSelection,
}

#[derive(Debug, Serialize)]
struct LatencyResults {
    provider: ProviderType,
    model: String,
    paths: Vec<BenchmarkSummary>,
    /// Agent mean minus direct mean, when both paths ran
    agent_overhead_secs: Option<f64>,
}

pub async fn run(
    args: LatencyArgs,
    registry: &DriverRegistry,
    credentials: &dyn CredentialSource,
    output: OutputFormat,
    quiet: bool,
) -> Result<ExitCode> {
    let started_at = chrono::Utc::now();
    let provider = args.provider;

    let api_key = load_credential(credentials, provider.credential_var())?;
    let mut provider_config = ProviderConfig::new(provider).with_api_key(api_key);
    if let Some(url) = args.base_url {
        provider_config = provider_config.with_base_url(url);
    }
    let driver: Arc<dyn ChatDriver> = Arc::from(
        registry
            .create_driver(&provider_config)
            .context("Failed to create chat driver")?,
    );

    let model = args
        .model
        .unwrap_or_else(|| provider.default_model().to_string());
    let config = LatencyConfig::new(model.clone())
        .with_prompt(args.prompt)
        .with_temperature(args.temperature)
        .with_max_tokens(args.max_tokens)
        .with_trials(
            TrialSettings::new(args.iterations)
                .with_policy(args.policy)
                .with_timeout(Duration::from_secs(args.timeout)),
        );

    if output.is_text() && !quiet {
        print_field("Provider", &provider.to_string());
        print_field("Model", &model);
        print_field("Iterations", &args.iterations.to_string());
        print_field("Policy", &args.policy.to_string());
    }

    let sink = ConsoleSink::new(output, quiet);
    let bench = LatencyBenchmark::new(driver, config, &sink);

    let direct = match args.path {
        PathSelection::Direct | PathSelection::Both => Some(bench.benchmark_direct_path().await?),
        PathSelection::Agent => None,
    };
    let agent = match args.path {
        PathSelection::Agent | PathSelection::Both => Some(bench.benchmark_agent_path().await?),
        PathSelection::Direct => None,
    };

    let agent_overhead_secs = match (&direct, &agent) {
        (Some(d), Some(a)) if d.succeeded > 0 && a.succeeded > 0 => Some(a.mean_secs - d.mean_secs),
        _ => None,
    };

    if output.is_text() {
        println!("\n--- Results ---");
        if let Some(summary) = &direct {
            print_summary("Direct", summary);
        }
        if let Some(summary) = &agent {
            print_summary("Agent", summary);
        }
        if let Some(overhead) = agent_overhead_secs {
            println!("Agent overhead: {overhead:+.4}s");
        }
    } else {
        let results = LatencyResults {
            provider,
            model,
            paths: direct.into_iter().chain(agent).collect(),
            agent_overhead_secs,
        };
        output.print_value(&BenchmarkReport::new(
            "latency",
            args.policy,
            started_at,
            results,
        ))?;
    }

    Ok(ExitCode::SUCCESS)
}
