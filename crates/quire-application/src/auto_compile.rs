//! Trailing-edge debounce in front of the compile path.

use async_trait::async_trait;
use quire_core::compile::CompilationOutcome;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// The compile path the scheduler feeds.
///
/// Implemented by the session so that debounced and manual compiles share
/// one staleness check and one apply step.
#[async_trait]
pub trait CompileTrigger: Send + Sync {
    async fn compile_snapshot(&self, source: String) -> CompilationOutcome;
}

#[derive(Default)]
struct SchedulerState {
    latest: Option<String>,
    enabled: bool,
    pending: Option<JoinHandle<()>>,
}

impl SchedulerState {
    fn cancel_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }
}

/// Debounces editor changes into compile calls.
///
/// Every `on_edit` restarts the countdown; only an uninterrupted countdown
/// issues a compile, with the most recent snapshot. Must be used from
/// within a Tokio runtime.
///
/// Once a countdown fires, the compile runs on its own task: later edits,
/// `set_enabled(false)` and `shutdown` cancel countdowns, never compiles.
pub struct AutoCompileScheduler {
    target: Arc<dyn CompileTrigger>,
    debounce: Duration,
    state: Mutex<SchedulerState>,
}

impl AutoCompileScheduler {
    pub fn new(target: Arc<dyn CompileTrigger>, debounce: Duration, enabled: bool) -> Self {
        Self {
            target,
            debounce,
            state: Mutex::new(SchedulerState {
                enabled,
                ..SchedulerState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    /// Returns `true` while a countdown is running.
    pub fn has_pending(&self) -> bool {
        self.lock()
            .pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// The most recent snapshot handed to the scheduler, if any.
    pub fn latest_snapshot(&self) -> Option<String> {
        self.lock().latest.clone()
    }

    /// Records an edit and (re)starts the countdown when auto-compile is on.
    pub fn on_edit(&self, source: impl Into<String>) {
        let source = source.into();
        let mut state = self.lock();
        state.latest = Some(source.clone());
        if !state.enabled {
            tracing::trace!("Auto-compile off, edit recorded only");
            return;
        }

        if state.cancel_pending() {
            tracing::trace!("Debounce restarted");
        }

        let target = self.target.clone();
        let debounce = self.debounce;
        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            tracing::debug!("Debounce elapsed, compiling latest snapshot");
            tokio::spawn(async move {
                target.compile_snapshot(source).await;
            });
        }));
    }

    /// Replaces the snapshot without scheduling, cancelling any countdown.
    ///
    /// Used when the body changes outside the editor (a generation result).
    pub fn replace_snapshot(&self, source: impl Into<String>) {
        let mut state = self.lock();
        state.cancel_pending();
        state.latest = Some(source.into());
    }

    /// Turns auto-compile on or off. Turning it off drops a pending countdown.
    pub fn set_enabled(&self, enabled: bool) {
        let mut state = self.lock();
        state.enabled = enabled;
        if !enabled && state.cancel_pending() {
            tracing::debug!("Auto-compile disabled, pending countdown dropped");
        }
    }

    /// Compiles the latest snapshot now, skipping the debounce.
    ///
    /// # Returns
    ///
    /// The outcome of the compile, or `None` when nothing has been recorded yet.
    pub async fn regenerate(&self) -> Option<CompilationOutcome> {
        let source = {
            let mut state = self.lock();
            state.cancel_pending();
            state.latest.clone()
        }?;
        Some(self.target.compile_snapshot(source).await)
    }

    /// Releases any pending countdown. A compile already issued keeps running.
    pub fn shutdown(&self) {
        self.lock().cancel_pending();
    }
}

impl Drop for AutoCompileScheduler {
    fn drop(&mut self) {
        self.lock().cancel_pending();
    }
}
