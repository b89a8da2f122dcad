//! Application layer for Quire.
//!
//! Coordinates the domain types from `quire-core` into the behaviour the
//! user sees: retried single-flight compilation, debounced auto-compile,
//! and the refinement session that ties generation, compilation and
//! persistence together.

pub mod auto_compile;
pub mod compilation_client;
pub mod notification;
pub mod session;

pub use auto_compile::{AutoCompileScheduler, CompileTrigger};
pub use compilation_client::{CompilationClient, RetryPolicy};
pub use notification::{ChannelNotificationSink, TracingNotificationSink};
pub use session::{RefinementSession, SessionOptions, SessionPhase, SessionServices, SessionSnapshot};
