//! Staleness guard for compilation results.

use std::sync::atomic::{AtomicU64, Ordering};

/// A source snapshot tagged with its issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationRequest {
    pub seq: u64,
    pub source: String,
}

/// Issues monotonically increasing sequence numbers for one session.
///
/// The sequence number is the only authority on staleness: an outcome may
/// be applied only while its request is the most recently issued one. A
/// slow earlier compile therefore never overwrites a faster later one.
#[derive(Debug, Default)]
pub struct CompileLedger {
    latest: AtomicU64,
}

impl CompileLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags `source` with the next sequence number, superseding every
    /// request issued before it.
    pub fn issue(&self, source: impl Into<String>) -> CompilationRequest {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        CompilationRequest {
            seq,
            source: source.into(),
        }
    }

    /// Highest sequence number issued so far (0 before the first request).
    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Whether `request` is still the newest one.
    pub fn is_current(&self, request: &CompilationRequest) -> bool {
        request.seq == self.latest()
    }
}
