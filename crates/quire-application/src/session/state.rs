use quire_core::compile::{CompilationOutcome, RenderedArtifact};
use quire_core::conversation::ConversationTurn;
use quire_core::document::Document;

/// Lifecycle of a refinement session.
///
/// `Empty` until the first instruction is submitted, `Active` afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Empty,
    Active,
}

/// Point-in-time copy of everything a session exposes.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub document: Document,
    /// Last successfully rendered artifact
    pub artifact: Option<RenderedArtifact>,
    /// Most recently applied compile outcome, successful or not
    pub outcome: Option<CompilationOutcome>,
    pub turns: Vec<ConversationTurn>,
    pub auto_compile: bool,
}

impl SessionSnapshot {
    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }
}

/// Mutable session data behind the session lock.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub document: Document,
    pub turns: Vec<ConversationTurn>,
    pub artifact: Option<RenderedArtifact>,
    pub outcome: Option<CompilationOutcome>,
    /// The document was loaded from the store; the first instruction
    /// refines it instead of generating a new one
    pub restored: bool,
    /// A generated document has no stored record yet; the next applied
    /// successful compile creates it
    pub pending_record: bool,
}

impl SessionState {
    pub fn restored(document: Document) -> Self {
        Self {
            document,
            restored: true,
            ..Self::default()
        }
    }

    /// Whether the next instruction should generate from scratch.
    pub fn starts_fresh(&self) -> bool {
        self.turns.is_empty() && !self.restored
    }

    /// Turns are append-only, so the phase can never go back to `Empty`.
    pub fn phase(&self) -> SessionPhase {
        if self.turns.is_empty() {
            SessionPhase::Empty
        } else {
            SessionPhase::Active
        }
    }

    pub fn snapshot(&self, auto_compile: bool) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase(),
            document: self.document.clone(),
            artifact: self.artifact.clone(),
            outcome: self.outcome.clone(),
            turns: self.turns.clone(),
            auto_compile,
        }
    }
}
