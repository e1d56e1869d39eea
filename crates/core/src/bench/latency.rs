//! Latency benchmark: direct driver path vs agent path

use std::sync::Arc;

use crate::agent::{Agent, AgentConfig};
use crate::bench::stats::BenchmarkSummary;
use crate::bench::trial::run_trials;
use crate::config::LatencyConfig;
use crate::error::Result;
use crate::events::{BenchEvent, EventSink};
use crate::llm_driver_registry::{ChatCallConfig, ChatDriver, ChatMessage};

/// Path label for calls through the bare driver
pub const DIRECT_PATH: &str = "direct";

/// Path label for calls through the agent
pub const AGENT_PATH: &str = "agent";

/// Measures round-trip latency of one fixed prompt through two code paths
pub struct LatencyBenchmark<'a> {
    driver: Arc<dyn ChatDriver>,
    config: LatencyConfig,
    sink: &'a dyn EventSink,
}

impl<'a> LatencyBenchmark<'a> {
    pub fn new(driver: Arc<dyn ChatDriver>, config: LatencyConfig, sink: &'a dyn EventSink) -> Self {
        Self {
            driver,
            config,
            sink,
        }
    }

    /// Send the prompt through the bare driver `iterations` times
    pub async fn benchmark_direct_path(&self) -> Result<BenchmarkSummary> {
        let mut call_config = ChatCallConfig::new(self.config.model.clone());
        if let Some(temperature) = self.config.temperature {
            call_config = call_config.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.config.max_tokens {
            call_config = call_config.with_max_tokens(max_tokens);
        }
        let driver = &self.driver;
        let prompt = self.config.prompt.as_str();
        let call_config = &call_config;

        self.measure(DIRECT_PATH, |_| async move {
            driver
                .chat(vec![ChatMessage::user(prompt)], call_config)
                .await
        })
        .await
    }

    /// Send the prompt through an agent built once before the loop
    pub async fn benchmark_agent_path(&self) -> Result<BenchmarkSummary> {
        let mut agent_config = AgentConfig::new(self.config.model.clone())
            .with_description(self.config.agent_description.clone());
        if let Some(temperature) = self.config.temperature {
            agent_config = agent_config.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.config.max_tokens {
            agent_config = agent_config.with_max_tokens(max_tokens);
        }
        let agent = Agent::new(self.driver.clone(), agent_config)?;
        let agent = &agent;
        let prompt = self.config.prompt.as_str();

        self.measure(AGENT_PATH, |_| agent.run(prompt)).await
    }

    async fn measure<T, F, Fut>(&self, path: &str, call: F) -> Result<BenchmarkSummary>
    where
        F: FnMut(usize) -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let trials = &self.config.trials;
        tracing::info!(
            path,
            provider = %self.driver.provider(),
            model = %self.config.model,
            iterations = trials.iterations,
            policy = %trials.policy,
            "Starting latency benchmark"
        );
        self.sink.emit(BenchEvent::RunStarted {
            path: path.to_string(),
            iterations: trials.iterations,
        });

        let samples = run_trials(path, trials, self.sink, call).await?;
        let summary = samples.summarize(path, trials.iterations);

        tracing::info!(
            path,
            succeeded = summary.succeeded,
            failed = summary.failed,
            mean_secs = summary.mean_secs,
            "Latency benchmark completed"
        );
        self.sink.emit(BenchEvent::RunCompleted(summary.clone()));
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::config::{ErrorPolicy, TrialSettings};
    use crate::error::BenchError;
    use crate::llm_driver_registry::ChatRole;
    use crate::memory::{RecordingSink, ScriptStep, ScriptedDriver};

    fn config(iterations: usize, policy: ErrorPolicy) -> LatencyConfig {
        LatencyConfig::new("command-a-03-2025").with_trials(
            TrialSettings::new(iterations)
                .with_policy(policy)
                .with_timeout(Duration::from_secs(60)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_direct_path_records_every_success() {
        let driver = Arc::new(ScriptedDriver::repeating("Hello").with_delay(Duration::from_millis(200)));
        let sink = RecordingSink::new();
        let bench = LatencyBenchmark::new(driver.clone(), config(3, ErrorPolicy::Tolerant), &sink);

        let summary = bench.benchmark_direct_path().await.unwrap();
        assert_eq!(summary.path, DIRECT_PATH);
        assert_eq!(summary.succeeded, 3);
        assert!((summary.mean_secs - 0.2).abs() < 2e-3);

        let calls = driver.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].messages, vec![ChatMessage::user("Say hello in one word.")]);
        assert_eq!(calls[0].model, "command-a-03-2025");
    }

    #[tokio::test]
    async fn test_agent_path_uses_description() {
        let driver = Arc::new(ScriptedDriver::repeating("Hello"));
        let sink = RecordingSink::new();
        let bench = LatencyBenchmark::new(driver.clone(), config(2, ErrorPolicy::Tolerant), &sink);

        let summary = bench.benchmark_agent_path().await.unwrap();
        assert_eq!(summary.path, AGENT_PATH);
        assert_eq!(summary.succeeded, 2);

        let calls = driver.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].messages[0].role, ChatRole::System);
        assert_eq!(calls[0].messages[0].content, "Bench agent");
    }

    #[tokio::test]
    async fn test_sampling_settings_reach_both_paths() {
        let driver = Arc::new(ScriptedDriver::repeating("Hello"));
        let sink = RecordingSink::new();
        let config = config(1, ErrorPolicy::Tolerant)
            .with_temperature(Some(0.5))
            .with_max_tokens(Some(16));
        let bench = LatencyBenchmark::new(driver.clone(), config, &sink);

        bench.benchmark_direct_path().await.unwrap();
        bench.benchmark_agent_path().await.unwrap();

        let calls = driver.calls();
        assert_eq!(calls.len(), 2);
        for call in &calls {
            assert_eq!(call.temperature, Some(0.5));
            assert_eq!(call.max_tokens, Some(16));
        }
    }

    #[tokio::test]
    async fn test_unset_sampling_settings_are_not_sent() {
        let driver = Arc::new(ScriptedDriver::repeating("Hello"));
        let sink = RecordingSink::new();
        let bench = LatencyBenchmark::new(driver.clone(), config(1, ErrorPolicy::Tolerant), &sink);

        bench.benchmark_direct_path().await.unwrap();
        let calls = driver.calls();
        assert!(calls[0].temperature.is_none());
        assert!(calls[0].max_tokens.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tolerant_mean_covers_only_successes() {
        let driver = Arc::new(ScriptedDriver::new(vec![
            ScriptStep::reply_after(Duration::from_millis(100), "a"),
            ScriptStep::fail_after(Duration::from_millis(900), BenchError::transient("503")),
            ScriptStep::reply_after(Duration::from_millis(300), "b"),
            ScriptStep::fail(BenchError::transient("reset")),
        ]));
        let sink = RecordingSink::new();
        let bench = LatencyBenchmark::new(driver, config(4, ErrorPolicy::Tolerant), &sink);

        let summary = bench.benchmark_direct_path().await.unwrap();
        assert_eq!(summary.iterations, 4);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 2);
        assert!((summary.mean_secs - 0.2).abs() < 2e-3);
    }

    #[tokio::test]
    async fn test_all_failures_in_tolerant_mode_report_zero() {
        let driver = Arc::new(ScriptedDriver::failing(|| BenchError::transient("unreachable")));
        let sink = RecordingSink::new();
        let bench = LatencyBenchmark::new(driver, config(5, ErrorPolicy::Tolerant), &sink);

        let direct = bench.benchmark_direct_path().await.unwrap();
        let agent = bench.benchmark_agent_path().await.unwrap();
        for summary in [direct, agent] {
            assert_eq!(summary.succeeded, 0);
            assert_eq!(summary.failed, 5);
            assert_eq!(summary.mean_secs, 0.0);
        }

        let completed: Vec<_> = sink
            .events()
            .into_iter()
            .filter(|e| matches!(e, BenchEvent::RunCompleted(_)))
            .collect();
        assert_eq!(completed.len(), 2);
    }

    #[tokio::test]
    async fn test_fail_fast_aborts_run() {
        let driver = Arc::new(ScriptedDriver::new(vec![
            ScriptStep::reply("ok"),
            ScriptStep::fail(BenchError::transient("down")),
            ScriptStep::reply("never"),
        ]));
        let sink = RecordingSink::new();
        let bench = LatencyBenchmark::new(driver.clone(), config(3, ErrorPolicy::FailFast), &sink);

        let err = bench.benchmark_direct_path().await.unwrap_err();
        assert!(matches!(err, BenchError::Transient(_)));
        assert_eq!(driver.calls().len(), 2);
        assert!(!sink
            .events()
            .iter()
            .any(|e| matches!(e, BenchEvent::RunCompleted(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_calls_time_out() {
        let driver = Arc::new(ScriptedDriver::repeating("late").with_delay(Duration::from_secs(120)));
        let sink = RecordingSink::new();
        let bench = LatencyBenchmark::new(driver, config(2, ErrorPolicy::Tolerant), &sink);

        let summary = bench.benchmark_direct_path().await.unwrap();
        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, 2);
    }
}
