// Integration tests for the benchmark harness with scripted collaborators
//
// Runners, registry and verification gate are wired together through the
// public API only, the same way the CLI wires them.
//
// Run with: cargo test -p sayr-core --test harness_test

use std::sync::Arc;
use std::time::Duration;

use sayr_core::bench::{CpuBenchmark, LatencyBenchmark, AGENT_PATH, DIRECT_PATH};
use sayr_core::config::{load_credential, ErrorPolicy, LatencyConfig, TrialSettings};
use sayr_core::error::BenchError;
use sayr_core::events::{BenchEvent, NoopSink};
use sayr_core::llm_driver_registry::{
    BoxedChatDriver, ChatDriver, DriverRegistry, ProviderConfig, ProviderType,
};
use sayr_core::memory::{RecordingSink, ScriptStep, ScriptedDriver, StaticCredentials};
use sayr_core::processor::{synthetic_text, NativeProcessor, ReferenceProcessor};
use sayr_core::verify::{run_verification, VerifyOptions, VerifyStage};

fn scripted_registry() -> DriverRegistry {
    let mut registry = DriverRegistry::new();
    registry.register(ProviderType::Cohere, |_key, _url| {
        Ok(Box::new(ScriptedDriver::repeating("Hello")) as BoxedChatDriver)
    });
    registry
}

#[tokio::test]
async fn test_registry_driver_feeds_both_latency_paths() {
    let credentials = StaticCredentials::new().with("COHERE_API_KEY", "co-123456");
    let api_key = load_credential(&credentials, ProviderType::Cohere.credential_var()).unwrap();
    let config = ProviderConfig::new(ProviderType::Cohere).with_api_key(api_key);
    let driver: Arc<dyn ChatDriver> = Arc::from(scripted_registry().create_driver(&config).unwrap());

    let sink = RecordingSink::new();
    let bench = LatencyBenchmark::new(
        driver,
        LatencyConfig::new("command-a-03-2025").with_trials(TrialSettings::new(3)),
        &sink,
    );

    let direct = bench.benchmark_direct_path().await.unwrap();
    let agent = bench.benchmark_agent_path().await.unwrap();
    assert_eq!(direct.path, DIRECT_PATH);
    assert_eq!(agent.path, AGENT_PATH);
    assert_eq!(direct.succeeded, 3);
    assert_eq!(agent.succeeded, 3);

    let started: Vec<usize> = sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            BenchEvent::TrialStarted { iteration, .. } => Some(iteration),
            _ => None,
        })
        .collect();
    assert_eq!(started, vec![0, 1, 2, 0, 1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_tolerant_run_survives_mixed_failures() {
    let driver = Arc::new(ScriptedDriver::new(vec![
        ScriptStep::fail(BenchError::provider_status("cohere", 429, "busy")),
        ScriptStep::reply_after(Duration::from_millis(400), "Hi"),
        ScriptStep::fail_after(Duration::from_secs(90), BenchError::transient("late")),
    ]));
    let config = LatencyConfig::new("command-a-03-2025").with_trials(
        TrialSettings::new(3)
            .with_policy(ErrorPolicy::Tolerant)
            .with_timeout(Duration::from_secs(60)),
    );
    let bench = LatencyBenchmark::new(driver, config, &NoopSink);

    let summary = bench.benchmark_direct_path().await.unwrap();
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 2);
    assert!((summary.mean_secs - 0.4).abs() < 2e-3);
    assert!(summary.min_secs.is_some());
}

#[tokio::test]
async fn test_cpu_comparison_on_reference_workloads() {
    let bench = CpuBenchmark::new(
        &ReferenceProcessor,
        &NativeProcessor,
        TrialSettings::new(2),
        &NoopSink,
    );

    let fib = bench.fibonacci_comparison(25).await.unwrap();
    assert_eq!(fib.baseline_output, 75025);
    assert!(fib.outputs_agree);

    let tokens = bench
        .token_count_comparison(&synthetic_text("word", 50_000).unwrap())
        .await
        .unwrap();
    assert_eq!(tokens.candidate_output, 50_000);
    assert!(tokens.outputs_agree);
}

#[tokio::test]
async fn test_verification_passes_through_registry() {
    let credentials = StaticCredentials::new().with("COHERE_API_KEY", "co-123456");
    let sink = RecordingSink::new();

    let report = run_verification(
        &scripted_registry(),
        &credentials,
        &VerifyOptions::new(ProviderType::Cohere),
        &sink,
    )
    .await
    .unwrap();
    assert_eq!(report.response, "Hello");

    let stages: Vec<VerifyStage> = sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            BenchEvent::StagePassed { stage, .. } => Some(stage),
            _ => None,
        })
        .collect();
    assert_eq!(stages.len(), 5);
    assert_eq!(stages.last(), Some(&VerifyStage::Call));
}
