//! Hand-written collaborators shared by the session scenarios.

#![allow(dead_code)]

use async_trait::async_trait;
use quire_application::{RefinementSession, SessionOptions, SessionServices};
use quire_core::compile::{CompilationService, CompileServiceError, RenderedArtifact};
use quire_core::conversation::ConversationTurn;
use quire_core::document::{ArtifactStore, Document, DocumentSummary};
use quire_core::error::{QuireError, Result};
use quire_core::generation::{GeneratedDocument, GenerationService};
use quire_core::notification::{NotificationKind, NotificationSink};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

pub fn generated(body: &str, explanation: &str) -> GeneratedDocument {
    GeneratedDocument {
        body: body.to_string(),
        explanation: explanation.to_string(),
    }
}

/// Replays queued responses; an empty queue is a generation failure.
#[derive(Default)]
pub struct ScriptedGenerator {
    initial: Mutex<VecDeque<Result<GeneratedDocument>>>,
    refined: Mutex<VecDeque<Result<GeneratedDocument>>>,
    pub refine_calls: Mutex<Vec<(String, Vec<ConversationTurn>, String)>>,
}

impl ScriptedGenerator {
    pub fn push_initial(&self, response: Result<GeneratedDocument>) {
        self.initial.lock().unwrap().push_back(response);
    }

    pub fn push_refined(&self, response: Result<GeneratedDocument>) {
        self.refined.lock().unwrap().push_back(response);
    }
}

#[async_trait]
impl GenerationService for ScriptedGenerator {
    async fn generate_initial(&self, _instruction: &str) -> Result<GeneratedDocument> {
        self.initial
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(QuireError::generation("no scripted response")))
    }

    async fn refine(
        &self,
        body: &str,
        history: &[ConversationTurn],
        instruction: &str,
    ) -> Result<GeneratedDocument> {
        self.refine_calls.lock().unwrap().push((
            body.to_string(),
            history.to_vec(),
            instruction.to_string(),
        ));
        self.refined
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(QuireError::generation("no scripted response")))
    }
}

/// Fails the first `failures` attempts, then renders `pdf:<source>`.
///
/// A source listed in `held` waits for `release` before answering.
#[derive(Default)]
pub struct StubCompiler {
    failures: Mutex<u32>,
    pub always_fail: AtomicBool,
    held: Mutex<Option<String>>,
    pub release: Notify,
    pub attempts: Mutex<Vec<(String, Instant)>>,
}

impl StubCompiler {
    pub fn failing_first(failures: u32) -> Self {
        Self {
            failures: Mutex::new(failures),
            ..Self::default()
        }
    }

    pub fn always_failing() -> Self {
        let compiler = Self::default();
        compiler.always_fail.store(true, Ordering::SeqCst);
        compiler
    }

    pub fn hold(&self, source: &str) {
        *self.held.lock().unwrap() = Some(source.to_string());
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }

    pub fn attempted_sources(&self) -> Vec<String> {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .map(|(source, _)| source.clone())
            .collect()
    }

    pub fn gaps(&self) -> Vec<Duration> {
        let attempts = self.attempts.lock().unwrap();
        attempts.windows(2).map(|pair| pair[1].1 - pair[0].1).collect()
    }
}

#[async_trait]
impl CompilationService for StubCompiler {
    async fn compile(&self, source: &str) -> std::result::Result<RenderedArtifact, CompileServiceError> {
        self.attempts
            .lock()
            .unwrap()
            .push((source.to_string(), Instant::now()));

        let held = self.held.lock().unwrap().as_deref() == Some(source);
        if held {
            self.release.notified().await;
        }

        if self.always_fail.load(Ordering::SeqCst) {
            return Err(CompileServiceError::http(500, "Compilation failed: Internal Server Error"));
        }
        {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(CompileServiceError::transport("connection reset"));
            }
        }
        Ok(RenderedArtifact::new(format!("pdf:{source}")))
    }
}

/// In-memory store that records writes and can be told to reject them.
#[derive(Default)]
pub struct RecordingStore {
    documents: Mutex<HashMap<String, (String, Document)>>,
    pub reject_writes: AtomicBool,
    pub updates: Mutex<Vec<(String, String)>>,
    next_id: Mutex<u32>,
}

impl RecordingStore {
    pub fn rejecting() -> Self {
        let store = Self::default();
        store.reject_writes.store(true, Ordering::SeqCst);
        store
    }

    pub fn insert(&self, owner: &str, id: &str, title: &str, source: &str) {
        let mut document = Document::unsaved(source);
        document.id = Some(id.to_string());
        document.title = title.to_string();
        self.documents
            .lock()
            .unwrap()
            .insert(id.to_string(), (owner.to_string(), document));
    }

    pub fn stored_source(&self, id: &str) -> Option<String> {
        self.documents
            .lock()
            .unwrap()
            .get(id)
            .map(|(_, document)| document.source.clone())
    }

    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    fn check_writable(&self) -> Result<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            Err(QuireError::persistence("store unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ArtifactStore for RecordingStore {
    async fn create(&self, owner: &str, title: &str, source: &str) -> Result<String> {
        self.check_writable()?;
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            format!("doc-{next}")
        };
        self.insert(owner, &id, title, source);
        Ok(id)
    }

    async fn update(&self, owner: &str, id: &str, source: &str) -> Result<()> {
        self.check_writable()?;
        let mut documents = self.documents.lock().unwrap();
        match documents.get_mut(id) {
            Some((stored_owner, document)) if stored_owner == owner => {
                document.set_source(source);
                self.updates
                    .lock()
                    .unwrap()
                    .push((id.to_string(), source.to_string()));
                Ok(())
            }
            _ => Err(QuireError::not_found("document", id)),
        }
    }

    async fn get(&self, owner: &str, id: &str) -> Result<Option<Document>> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .get(id)
            .filter(|(stored_owner, _)| stored_owner == owner)
            .map(|(_, document)| document.clone()))
    }

    async fn list(&self, owner: &str) -> Result<Vec<DocumentSummary>> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .values()
            .filter(|(stored_owner, _)| stored_owner == owner)
            .filter_map(|(_, document)| document.summary())
            .collect())
    }

    async fn delete(&self, owner: &str, id: &str) -> Result<()> {
        let mut documents = self.documents.lock().unwrap();
        let owned = documents
            .get(id)
            .is_some_and(|(stored_owner, _)| stored_owner == owner);
        if !owned {
            return Err(QuireError::not_found("document", id));
        }
        documents.remove(id);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub notifications: Mutex<Vec<(NotificationKind, String)>>,
}

impl RecordingSink {
    pub fn errors(&self) -> Vec<String> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|(kind, _)| *kind == NotificationKind::Error)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, kind: NotificationKind, message: &str) {
        self.notifications
            .lock()
            .unwrap()
            .push((kind, message.to_string()));
    }
}

pub struct Harness {
    pub generator: Arc<ScriptedGenerator>,
    pub compiler: Arc<StubCompiler>,
    pub store: Arc<RecordingStore>,
    pub sink: Arc<RecordingSink>,
}

impl Harness {
    pub fn new(compiler: StubCompiler, store: RecordingStore) -> Self {
        Self {
            generator: Arc::new(ScriptedGenerator::default()),
            compiler: Arc::new(compiler),
            store: Arc::new(store),
            sink: Arc::new(RecordingSink::default()),
        }
    }

    pub fn services(&self) -> SessionServices {
        SessionServices {
            generator: self.generator.clone(),
            compiler: self.compiler.clone(),
            store: self.store.clone(),
            notifier: self.sink.clone(),
        }
    }

    pub fn session(&self) -> RefinementSession {
        RefinementSession::new(self.services(), SessionOptions::default())
    }
}

/// Lets spawned tasks (countdown, detached compile) run to their next await.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
