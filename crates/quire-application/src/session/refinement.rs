use super::compiler::SessionCompiler;
use super::state::{SessionSnapshot, SessionState};
use crate::auto_compile::AutoCompileScheduler;
use crate::compilation_client::{CompilationClient, RetryPolicy};
use quire_core::compile::CompilationService;
use quire_core::config::{DEFAULT_OWNER, RootConfig};
use quire_core::conversation::ConversationTurn;
use quire_core::document::ArtifactStore;
use quire_core::error::{QuireError, Result};
use quire_core::generation::{GeneratedDocument, GenerationService};
use quire_core::notification::{NotificationKind, NotificationSink};
use quire_core::title::extract_title;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// External collaborators a session talks to.
#[derive(Clone)]
pub struct SessionServices {
    pub generator: Arc<dyn GenerationService>,
    pub compiler: Arc<dyn CompilationService>,
    pub store: Arc<dyn ArtifactStore>,
    pub notifier: Arc<dyn NotificationSink>,
}

/// Per-session tuning, usually derived from [`RootConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Owner scope for every store call
    pub owner: String,
    pub retry: RetryPolicy,
    pub debounce: Duration,
    pub auto_compile: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            owner: DEFAULT_OWNER.to_string(),
            retry: RetryPolicy::default(),
            debounce: Duration::from_millis(3000),
            auto_compile: true,
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &RootConfig) -> Self {
        Self {
            owner: config.storage.owner.clone(),
            retry: RetryPolicy::from_config(&config.compile),
            debounce: config.editor.debounce(),
            auto_compile: config.editor.auto_compile,
        }
    }
}

/// A conversation that produces and refines one LaTeX document.
///
/// The session starts `Empty`. The first submitted instruction generates a
/// document from scratch; every later one refines the current body with
/// the full conversation as context. A session restored with [`RefinementSession::open`]
/// refines the stored document from its first instruction on. Each new body is compiled right away;
/// editor changes go through the debounced scheduler instead.
///
/// One `submit` runs at a time. Compiles from any entry point share one
/// client (single-flight) and one staleness ledger.
pub struct RefinementSession {
    state: Arc<RwLock<SessionState>>,
    compiler: Arc<SessionCompiler>,
    scheduler: AutoCompileScheduler,
    generator: Arc<dyn GenerationService>,
    notifier: Arc<dyn NotificationSink>,
    submitting: AtomicBool,
}

impl RefinementSession {
    /// Creates an empty session with no document.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(services: SessionServices, options: SessionOptions) -> Self {
        Self::with_state(services, options, SessionState::default())
    }

    /// Restores a stored document into a fresh, `Empty` session.
    ///
    /// The conversation is not persisted, so the restored session has no
    /// turns. Nothing is compiled until the caller asks for it.
    ///
    /// # Errors
    ///
    /// Returns `QuireError::NotFound` if the owner has no document with this id,
    /// or the store's error if the lookup fails.
    pub async fn open(
        services: SessionServices,
        options: SessionOptions,
        id: &str,
    ) -> Result<Self> {
        let document = services
            .store
            .get(&options.owner, id)
            .await?
            .ok_or_else(|| QuireError::not_found("document", id))?;
        tracing::info!(document_id = %id, title = %document.title, "Document opened");

        let body = document.source.clone();
        let session = Self::with_state(services, options, SessionState::restored(document));
        session.scheduler.replace_snapshot(body);
        Ok(session)
    }

    fn with_state(services: SessionServices, options: SessionOptions, state: SessionState) -> Self {
        let state = Arc::new(RwLock::new(state));
        let client = Arc::new(CompilationClient::new(services.compiler, options.retry));
        let compiler = Arc::new(SessionCompiler::new(
            client,
            state.clone(),
            services.store,
            services.notifier.clone(),
            options.owner,
        ));
        let scheduler =
            AutoCompileScheduler::new(compiler.clone(), options.debounce, options.auto_compile);

        Self {
            state,
            compiler,
            scheduler,
            generator: services.generator,
            notifier: services.notifier,
            submitting: AtomicBool::new(false),
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.read().await.snapshot(self.scheduler.is_enabled())
    }

    /// Returns `true` while a `submit` is running.
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Processes one instruction: generate (first instruction of a fresh session) or
    /// refine, then compile the new body.
    ///
    /// Generation, compilation and persistence failures are reported through
    /// the notification sink and reflected in the returned snapshot; they
    /// are not errors here. A blank instruction changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `QuireError::SessionBusy` if another `submit` is still running.
    pub async fn submit(&self, instruction: &str) -> Result<SessionSnapshot> {
        let _guard = SubmitGuard::acquire(&self.submitting).ok_or(QuireError::SessionBusy)?;

        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Ok(self.snapshot().await);
        }

        let (from_scratch, body, history) = {
            let mut state = self.state.write().await;
            let from_scratch = state.starts_fresh();
            state.turns.push(ConversationTurn::user(instruction));
            (from_scratch, state.document.source.clone(), state.turns.clone())
        };

        if from_scratch {
            tracing::debug!("Session becomes active, generating initial document");
            self.generate_initial(instruction).await;
        } else {
            self.refine(&body, &history, instruction).await;
        }

        Ok(self.snapshot().await)
    }

    async fn generate_initial(&self, instruction: &str) {
        let generated = match self.generator.generate_initial(instruction).await {
            Ok(generated) => generated,
            Err(err) => {
                self.record_generation_failure(
                    "Failed to generate document",
                    format!("Error: {err}"),
                    &err,
                )
                .await;
                return;
            }
        };

        {
            let mut state = self.state.write().await;
            state.turns.push(ConversationTurn::assistant(&generated.explanation));
            // Stored by whichever compile of this document succeeds first
            state.document.title = extract_title(instruction);
            state.pending_record = true;
        }
        self.replace_body(&generated).await;
        self.compiler.compile_and_apply(generated.body.clone()).await;
    }

    async fn refine(&self, body: &str, history: &[ConversationTurn], instruction: &str) {
        let result = if body.trim().is_empty() {
            Err(QuireError::generation("No previous LaTeX document to refine"))
        } else {
            self.generator.refine(body, history, instruction).await
        };

        let generated = match result {
            Ok(generated) => generated,
            Err(err) => {
                self.record_generation_failure(
                    "Failed to refine document",
                    format!("Error refining document: {err}"),
                    &err,
                )
                .await;
                return;
            }
        };

        self.replace_body(&generated).await;
        self.compiler.compile_and_apply(generated.body.clone()).await;

        let mut state = self.state.write().await;
        state.turns.push(ConversationTurn::assistant(&generated.explanation));
    }

    async fn replace_body(&self, generated: &GeneratedDocument) {
        {
            let mut state = self.state.write().await;
            state.document.set_source(&generated.body);
        }
        self.scheduler.replace_snapshot(&generated.body);
    }

    async fn record_generation_failure(&self, summary: &str, turn: String, err: &QuireError) {
        tracing::warn!(error = %err, "{summary}");
        self.notifier
            .notify(NotificationKind::Error, &format!("{summary}: {err}"));
        let mut state = self.state.write().await;
        state.turns.push(ConversationTurn::assistant(turn));
    }

    /// Records an editor change. The body is held locally and compiled (then
    /// saved) once the debounce elapses, if auto-compile is on.
    pub async fn on_edit(&self, source: impl Into<String>) -> SessionSnapshot {
        let source = source.into();
        {
            let mut state = self.state.write().await;
            state.document.set_source(&source);
        }
        self.scheduler.on_edit(source);
        self.snapshot().await
    }

    /// Compiles the current body immediately, skipping the debounce.
    pub async fn regenerate(&self) -> SessionSnapshot {
        if self.scheduler.regenerate().await.is_none() {
            tracing::debug!("Nothing to regenerate");
        }
        self.snapshot().await
    }

    pub async fn set_auto_compile(&self, enabled: bool) -> SessionSnapshot {
        self.scheduler.set_enabled(enabled);
        self.notifier.notify(
            NotificationKind::Info,
            if enabled {
                "Auto-compile enabled"
            } else {
                "Auto-compile disabled"
            },
        );
        self.snapshot().await
    }

    /// Returns `true` while an editor change is waiting for its debounce.
    pub fn has_pending_compile(&self) -> bool {
        self.scheduler.has_pending()
    }

    /// Releases the debounce timer. Compiles already issued run to completion.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }
}

struct SubmitGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SubmitGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
#[path = "refinement_test.rs"]
mod tests;
