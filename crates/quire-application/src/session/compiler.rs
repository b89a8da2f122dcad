//! The single compile-and-apply path shared by submit, debounce and
//! regenerate.

use super::state::SessionState;
use crate::auto_compile::CompileTrigger;
use crate::compilation_client::CompilationClient;
use async_trait::async_trait;
use quire_core::compile::{CompilationOutcome, CompilationRequest, CompileLedger};
use quire_core::document::ArtifactStore;
use quire_core::notification::{NotificationKind, NotificationSink};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// What a successful compile does to the store.
enum Save {
    Create { title: String },
    Update { id: String },
}

pub(crate) struct SessionCompiler {
    client: Arc<CompilationClient>,
    ledger: CompileLedger,
    state: Arc<RwLock<SessionState>>,
    store: Arc<dyn ArtifactStore>,
    notifier: Arc<dyn NotificationSink>,
    owner: String,
    /// Store writes happen one at a time, in request order
    persisting: Mutex<()>,
}

impl SessionCompiler {
    pub fn new(
        client: Arc<CompilationClient>,
        state: Arc<RwLock<SessionState>>,
        store: Arc<dyn ArtifactStore>,
        notifier: Arc<dyn NotificationSink>,
        owner: String,
    ) -> Self {
        Self {
            client,
            ledger: CompileLedger::new(),
            state,
            store,
            notifier,
            owner,
            persisting: Mutex::new(()),
        }
    }

    /// Compiles `source` and applies the outcome unless a newer request has
    /// been issued in the meantime. An applied success is then saved.
    ///
    /// A `Busy` client is waited out and the request re-issued, as long as
    /// it is still the newest one.
    pub async fn compile_and_apply(&self, source: String) -> CompilationOutcome {
        loop {
            let request = self.ledger.issue(source.clone());
            let outcome = self.client.compile(&request.source).await;

            if outcome.is_busy() {
                self.client.wait_idle().await;
                if self.ledger.is_current(&request) {
                    tracing::debug!(seq = request.seq, "Client settled, re-issuing compile");
                    continue;
                }
                tracing::debug!(seq = request.seq, "Busy request superseded");
                return outcome;
            }

            if self.apply(&request, &outcome).await && outcome.is_rendered() {
                self.persist(&request).await;
            }
            return outcome;
        }
    }

    async fn apply(&self, request: &CompilationRequest, outcome: &CompilationOutcome) -> bool {
        {
            let mut state = self.state.write().await;
            if !self.ledger.is_current(request) {
                tracing::debug!(
                    seq = request.seq,
                    latest = self.ledger.latest(),
                    "Discarding stale compile outcome"
                );
                return false;
            }
            state.outcome = Some(outcome.clone());
            if let Some(artifact) = outcome.artifact() {
                state.artifact = Some(artifact.clone());
            }
        }

        if let Some(failure) = outcome.failure() {
            self.notifier
                .notify(NotificationKind::Error, &format!("Compilation failed: {failure}"));
        }
        true
    }

    /// Writes the compiled source: creates the record of a freshly
    /// generated document, updates an existing one, and leaves a document
    /// that was never generated or opened alone.
    async fn persist(&self, request: &CompilationRequest) {
        let _persisting = self.persisting.lock().await;
        if !self.ledger.is_current(request) {
            tracing::debug!(seq = request.seq, "Skipping save of superseded source");
            return;
        }

        let save = {
            let state = self.state.read().await;
            match (&state.document.id, state.pending_record) {
                (Some(id), _) => Save::Update { id: id.clone() },
                (None, true) => Save::Create {
                    title: state.document.title.clone(),
                },
                (None, false) => return,
            }
        };

        match save {
            Save::Update { id } => {
                match self.store.update(&self.owner, &id, &request.source).await {
                    Ok(()) => tracing::info!(document_id = %id, "Document saved"),
                    Err(err) => {
                        tracing::warn!(document_id = %id, error = %err, "Failed to save document");
                        self.notifier.notify(
                            NotificationKind::Error,
                            &format!("Failed to save document: {err}"),
                        );
                    }
                }
            }
            Save::Create { title } => {
                match self.store.create(&self.owner, &title, &request.source).await {
                    Ok(id) => {
                        tracing::info!(document_id = %id, title = %title, "Document created");
                        let mut state = self.state.write().await;
                        state.document.id = Some(id);
                        state.pending_record = false;
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "Failed to create document");
                        self.notifier.notify(
                            NotificationKind::Error,
                            &format!("Failed to create document: {err}"),
                        );
                    }
                }
            }
        }
    }
}

#[async_trait]
impl CompileTrigger for SessionCompiler {
    async fn compile_snapshot(&self, source: String) -> CompilationOutcome {
        self.compile_and_apply(source).await
    }
}
