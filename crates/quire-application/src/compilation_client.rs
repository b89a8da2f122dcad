//! Single-flight LaTeX compilation with bounded retry.
//!
//! `CompilationClient` wraps a [`CompilationService`] and owns the retry loop.
//! One instance serves one session: a second `compile` while the first is
//! still retrying gets `Busy` back immediately instead of queueing.

use quire_core::compile::{CompilationOutcome, CompilationService, CompileFailure};
use quire_core::config::CompileConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// Attempt ceiling and backoff curve for [`CompilationClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Always at least 1.
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(5000),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &CompileConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_delay: Duration::from_millis(config.initial_backoff_ms),
            max_delay: Duration::from_millis(config.max_backoff_ms),
        }
    }

    /// Delay to wait after the `failed_attempts`-th consecutive failure.
    ///
    /// Doubles from `initial_delay` and is capped at `max_delay`; no jitter.
    pub fn delay_after(&self, failed_attempts: u32) -> Duration {
        let mut delay = self.initial_delay.min(self.max_delay);
        for _ in 1..failed_attempts {
            delay = delay.saturating_mul(2).min(self.max_delay);
        }
        delay
    }
}

/// Compiles LaTeX source through a [`CompilationService`], retrying failed
/// attempts with exponential backoff.
///
/// Per-attempt failures are logged and swallowed; callers only ever see
/// `Rendered`, `Failed(Busy)` or `Failed(Terminal)`.
pub struct CompilationClient {
    service: Arc<dyn CompilationService>,
    policy: RetryPolicy,
    in_flight: AtomicBool,
    settled: Notify,
}

impl CompilationClient {
    pub fn new(service: Arc<dyn CompilationService>, policy: RetryPolicy) -> Self {
        Self {
            service,
            policy,
            in_flight: AtomicBool::new(false),
            settled: Notify::new(),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Returns `true` while a `compile` call is running on this instance.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Resolves once no `compile` call is running on this instance.
    ///
    /// Returns immediately when the client is already idle.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.settled.notified();
            tokio::pin!(notified);
            // Register before checking the flag so a release in between is not missed.
            notified.as_mut().enable();
            if !self.is_busy() {
                return;
            }
            notified.await;
        }
    }

    /// Compiles `source` into a rendered artifact.
    ///
    /// # Returns
    ///
    /// - `Rendered` on the first successful attempt
    /// - `Failed(Busy)` without touching the service if another call is in flight
    /// - `Failed(Terminal)` once every attempt has failed, carrying the last error
    pub async fn compile(&self, source: &str) -> CompilationOutcome {
        let Some(_flight) = InFlight::begin(self) else {
            tracing::debug!("Compile requested while another is in flight");
            return CompilationOutcome::busy();
        };

        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self.service.compile(source).await {
                Ok(artifact) if artifact.is_usable() => {
                    tracing::info!(attempt, "LaTeX compiled");
                    return CompilationOutcome::Rendered(artifact);
                }
                Ok(_) => {
                    last_error = "Compilation service returned an empty artifact".to_string();
                }
                Err(err) => {
                    last_error = err.to_string();
                }
            }

            if attempt < max_attempts {
                let delay = self.policy.delay_after(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %last_error,
                    "Compile attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }

        tracing::error!(attempts = max_attempts, error = %last_error, "Compilation failed");
        CompilationOutcome::Failed(CompileFailure::Terminal {
            attempts: max_attempts,
            message: last_error,
        })
    }
}

/// Holds the in-flight flag for the duration of one `compile` call.
struct InFlight<'a> {
    client: &'a CompilationClient,
}

impl<'a> InFlight<'a> {
    fn begin(client: &'a CompilationClient) -> Option<Self> {
        client
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { client })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.client.in_flight.store(false, Ordering::Release);
        self.client.settled.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quire_core::compile::{CompileServiceError, RenderedArtifact};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Fails the first `failures` attempts, then renders.
    struct ScriptedService {
        failures: u32,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedService {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn gaps(&self) -> Vec<Duration> {
            let calls = self.calls.lock().unwrap();
            calls.windows(2).map(|pair| pair[1] - pair[0]).collect()
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompilationService for ScriptedService {
        async fn compile(&self, source: &str) -> Result<RenderedArtifact, CompileServiceError> {
            let attempt = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(Instant::now());
                calls.len() as u32
            };
            if attempt <= self.failures {
                Err(CompileServiceError::http(500, format!("attempt {attempt} failed")))
            } else {
                Ok(RenderedArtifact::new(format!("pdf:{source}")))
            }
        }
    }

    /// Blocks until released, so tests can observe the in-flight state.
    struct GatedService {
        gate: Notify,
    }

    #[async_trait]
    impl CompilationService for GatedService {
        async fn compile(&self, _source: &str) -> Result<RenderedArtifact, CompileServiceError> {
            self.gate.notified().await;
            Ok(RenderedArtifact::new("pdf:gated"))
        }
    }

    struct EmptyArtifactService;

    #[async_trait]
    impl CompilationService for EmptyArtifactService {
        async fn compile(&self, _source: &str) -> Result<RenderedArtifact, CompileServiceError> {
            Ok(RenderedArtifact::new(""))
        }
    }

    #[test]
    fn test_delay_curve_doubles_and_caps() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = (1..=6)
            .map(|n| policy.delay_after(n).as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 5000, 5000, 5000]);
    }

    #[test]
    fn test_policy_from_config_never_zero_attempts() {
        let config = CompileConfig {
            max_attempts: 0,
            ..CompileConfig::default()
        };
        assert_eq!(RetryPolicy::from_config(&config).max_attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_needs_no_retry() {
        let service = Arc::new(ScriptedService::new(0));
        let client = CompilationClient::new(service.clone(), RetryPolicy::default());

        let outcome = client.compile("\\documentclass{article}").await;

        assert!(outcome.is_rendered());
        assert_eq!(service.call_count(), 1);
        assert!(!client.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_with_exact_backoff() {
        let service = Arc::new(ScriptedService::new(4));
        let client = CompilationClient::new(service.clone(), RetryPolicy::default());

        let outcome = client.compile("body").await;

        assert_eq!(
            outcome.artifact().map(|a| a.as_str().to_string()),
            Some("pdf:body".to_string())
        );
        assert_eq!(service.call_count(), 5);
        assert_eq!(
            service.gaps(),
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000),
                Duration::from_millis(5000),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_is_terminal_after_twenty_attempts() {
        let service = Arc::new(ScriptedService::new(u32::MAX));
        let client = CompilationClient::new(service.clone(), RetryPolicy::default());
        let started = Instant::now();

        let outcome = client.compile("body").await;

        match outcome.failure() {
            Some(CompileFailure::Terminal { attempts, message }) => {
                assert_eq!(*attempts, 20);
                assert!(message.contains("attempt 20 failed"));
            }
            other => panic!("expected terminal failure, got {other:?}"),
        }
        assert_eq!(service.call_count(), 20);
        // 1000 + 2000 + 4000 + 16 * 5000, and no delay after the last attempt
        assert_eq!(started.elapsed(), Duration::from_millis(87_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_artifact_counts_as_failure() {
        let policy = RetryPolicy {
            max_attempts: 2,
            ..RetryPolicy::default()
        };
        let client = CompilationClient::new(Arc::new(EmptyArtifactService), policy);

        let outcome = client.compile("body").await;

        assert!(outcome.failure().is_some_and(|f| f.is_terminal()));
    }

    #[tokio::test]
    async fn test_concurrent_compile_is_busy() {
        let service = Arc::new(GatedService { gate: Notify::new() });
        let client = Arc::new(CompilationClient::new(service.clone(), RetryPolicy::default()));

        let first = {
            let client = client.clone();
            tokio::spawn(async move { client.compile("first").await })
        };
        while !client.is_busy() {
            tokio::task::yield_now().await;
        }

        let second = client.compile("second").await;
        assert!(second.is_busy());

        service.gate.notify_one();
        let first = first.await.unwrap();
        assert!(first.is_rendered());
        assert!(!client.is_busy());
    }

    #[tokio::test]
    async fn test_wait_idle_resolves_when_call_settles() {
        let service = Arc::new(GatedService { gate: Notify::new() });
        let client = Arc::new(CompilationClient::new(service.clone(), RetryPolicy::default()));

        // Idle client resolves immediately
        client.wait_idle().await;

        let running = {
            let client = client.clone();
            tokio::spawn(async move { client.compile("body").await })
        };
        while !client.is_busy() {
            tokio::task::yield_now().await;
        }

        let waiter = {
            let client = client.clone();
            tokio::spawn(async move { client.wait_idle().await })
        };
        service.gate.notify_one();

        waiter.await.unwrap();
        assert!(!client.is_busy());
        assert!(running.await.unwrap().is_rendered());
    }
}
