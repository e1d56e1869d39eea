// CPU command - reference vs native text processor

use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, ValueEnum};

use crate::output::{BenchmarkReport, ConsoleSink, OutputFormat};
use sayr_core::bench::{Comparison, CpuBenchmark};
use sayr_core::config::{
    CpuConfig, ErrorPolicy, TrialSettings, DEFAULT_FIBONACCI_INPUT, DEFAULT_ITERATIONS,
    DEFAULT_TOKEN_WORD, DEFAULT_TOKEN_WORDS,
};
use sayr_core::processor::{synthetic_text, NativeProcessor, ReferenceProcessor};

/// Which workloads to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Workload {
    Fibonacci,
    Tokens,
    All,
}

#[derive(Debug, Args)]
pub struct CpuArgs {
    /// Trials per processor and workload
    #[arg(long, short = 'n', default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: usize,

    /// Fibonacci input
    #[arg(long, default_value_t = DEFAULT_FIBONACCI_INPUT)]
    pub fib_n: u32,

    /// Word repeated to build the token corpus
    #[arg(long, default_value = DEFAULT_TOKEN_WORD)]
    pub word: String,

    /// Number of repetitions of the word
    #[arg(long, default_value_t = DEFAULT_TOKEN_WORDS)]
    pub words: usize,

    /// What to do when a trial fails
    #[arg(long, default_value = "tolerant")]
    pub policy: ErrorPolicy,

    /// Workloads to run
    #[arg(long, value_enum, default_value_t = Workload::All)]
    pub workload: Workload,
}

impl CpuArgs {
    fn config(&self) -> CpuConfig {
        CpuConfig {
            fibonacci_input: self.fib_n,
            token_word: self.word.clone(),
            token_words: self.words,
            trials: TrialSettings::new(self.iterations).with_policy(self.policy),
        }
    }
}

pub async fn run(args: CpuArgs, output: OutputFormat, quiet: bool) -> Result<ExitCode> {
    let started_at = chrono::Utc::now();
    let config = args.config();

    if output.is_text() && !quiet {
        println!(
            "Starting CPU Benchmark (Iterations: {})",
            config.trials.iterations
        );
    }

    let sink = ConsoleSink::new(output, quiet);
    let baseline = ReferenceProcessor;
    let candidate = NativeProcessor;
    let bench = CpuBenchmark::new(&baseline, &candidate, config.trials.clone(), &sink);

    let mut comparisons = Vec::new();
    if matches!(args.workload, Workload::Fibonacci | Workload::All) {
        comparisons.push(bench.fibonacci_comparison(config.fibonacci_input).await?);
    }
    if matches!(args.workload, Workload::Tokens | Workload::All) {
        let text = synthetic_text(&config.token_word, config.token_words)?;
        comparisons.push(bench.token_count_comparison(&text).await?);
    }

    if output.is_text() {
        println!("\n--- Results ---");
        for comparison in &comparisons {
            print_comparison(comparison);
        }
    } else {
        output.print_value(&BenchmarkReport::new(
            "cpu",
            args.policy,
            started_at,
            comparisons,
        ))?;
    }

    Ok(ExitCode::SUCCESS)
}

fn print_comparison(comparison: &Comparison) {
    println!("{}", comparison.workload);
    println!(
        "  1. {:<28} {:.6}s",
        comparison.baseline.path, comparison.baseline.mean_secs
    );
    println!(
        "  2. {:<28} {:.6}s",
        comparison.candidate.path, comparison.candidate.mean_secs
    );
    if let Some(speedup) = comparison.speedup {
        println!("  Speedup: {speedup:.2}x");
    }
    if let Some(note) = &comparison.note {
        println!("  Note: {note}");
    }
    if !comparison.outputs_agree {
        println!(
            "  WARNING: outputs differ ({} vs {})",
            comparison.baseline_output, comparison.candidate_output
        );
    }
}
