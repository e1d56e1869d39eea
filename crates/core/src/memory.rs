// In-memory implementations for testing
//
// Scripted collaborators stand in for providers, credentials and text
// processors so runners can be exercised without a network.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::CredentialSource;
use crate::error::{BenchError, Result};
use crate::events::{BenchEvent, EventSink};
use crate::llm_driver_registry::{
    ChatCallConfig, ChatDriver, ChatMessage, ChatResponse, ProviderType,
};
use crate::processor::TextProcessor;

// ============================================================================
// ScriptedDriver
// ============================================================================

/// One scripted driver response
pub enum ScriptStep {
    Reply { text: String, delay: Duration },
    Fail { error: BenchError, delay: Duration },
}

impl ScriptStep {
    pub fn reply(text: impl Into<String>) -> Self {
        ScriptStep::Reply {
            text: text.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn reply_after(delay: Duration, text: impl Into<String>) -> Self {
        ScriptStep::Reply {
            text: text.into(),
            delay,
        }
    }

    pub fn fail(error: BenchError) -> Self {
        ScriptStep::Fail {
            error,
            delay: Duration::ZERO,
        }
    }

    pub fn fail_after(delay: Duration, error: BenchError) -> Self {
        ScriptStep::Fail { error, delay }
    }
}

type ErrorFactory = Box<dyn Fn() -> BenchError + Send + Sync>;

enum Fallback {
    Reply(String),
    Fail(ErrorFactory),
}

/// A call observed by the scripted driver
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub messages: Vec<ChatMessage>,
}

/// Chat driver that replays a script, then falls back to a fixed behavior
pub struct ScriptedDriver {
    steps: Mutex<VecDeque<ScriptStep>>,
    fallback: Fallback,
    fallback_delay: Duration,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedDriver {
    /// Replay `steps` in order; calls past the end are contract errors
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self::with_fallback(
            steps,
            Fallback::Fail(Box::new(|| BenchError::contract("scripted driver exhausted"))),
        )
    }

    /// Always reply with `text`
    pub fn repeating(text: impl Into<String>) -> Self {
        Self::with_fallback(Vec::new(), Fallback::Reply(text.into()))
    }

    /// Always fail with an error from `factory`
    pub fn failing<F>(factory: F) -> Self
    where
        F: Fn() -> BenchError + Send + Sync + 'static,
    {
        Self::with_fallback(Vec::new(), Fallback::Fail(Box::new(factory)))
    }

    fn with_fallback(steps: Vec<ScriptStep>, fallback: Fallback) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            fallback,
            fallback_delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Delay applied to fallback responses
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.fallback_delay = delay;
        self
    }

    /// Calls received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn next_step(&self) -> ScriptStep {
        let scripted = self.steps.lock().ok().and_then(|mut steps| steps.pop_front());
        match scripted {
            Some(step) => step,
            None => match &self.fallback {
                Fallback::Reply(text) => ScriptStep::reply_after(self.fallback_delay, text.clone()),
                Fallback::Fail(factory) => ScriptStep::fail_after(self.fallback_delay, factory()),
            },
        }
    }
}

#[async_trait]
impl ChatDriver for ScriptedDriver {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        config: &ChatCallConfig,
    ) -> Result<ChatResponse> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                model: config.model.clone(),
                temperature: config.temperature,
                max_tokens: config.max_tokens,
                messages,
            });
        }

        let (outcome, delay) = match self.next_step() {
            ScriptStep::Reply { text, delay } => (Ok(ChatResponse::text(text)), delay),
            ScriptStep::Fail { error, delay } => (Err(error), delay),
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        outcome
    }

    fn provider(&self) -> ProviderType {
        ProviderType::Cohere
    }
}

// ============================================================================
// RecordingSink
// ============================================================================

/// Event sink that keeps every event
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<BenchEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BenchEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: BenchEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

// ============================================================================
// StaticCredentials
// ============================================================================

/// Credential source backed by a map
#[derive(Debug, Default, Clone)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

// ============================================================================
// ScriptedProcessor
// ============================================================================

/// Text processor returning fixed answers, failing on chosen calls
#[derive(Debug)]
pub struct ScriptedProcessor {
    name: String,
    fibonacci: u64,
    tokens: usize,
    failing_calls: HashSet<usize>,
    calls: AtomicUsize,
}

impl ScriptedProcessor {
    pub fn new(name: impl Into<String>, fibonacci: u64, tokens: usize) -> Self {
        Self {
            name: name.into(),
            fibonacci,
            tokens,
            failing_calls: HashSet::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Make the given zero-based calls fail with a transient error
    pub fn failing_on(mut self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.failing_calls.extend(calls);
        self
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_calls.contains(&call) {
            return Err(BenchError::transient(format!(
                "{} scripted failure on call {call}",
                self.name
            )));
        }
        Ok(())
    }
}

impl TextProcessor for ScriptedProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn fibonacci(&self, _n: u32) -> Result<u64> {
        self.check()?;
        Ok(self.fibonacci)
    }

    fn fibonacci_algorithm(&self) -> &str {
        "scripted"
    }

    fn token_count(&self, _text: &str) -> Result<usize> {
        self.check()?;
        Ok(self.tokens)
    }
}
