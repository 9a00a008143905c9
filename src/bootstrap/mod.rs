//! Session bring-up for distributed training processes.
//!
//! A process that wants a usable session goes through a [`SessionCreator`]:
//! the chief flavor restores or initializes, the worker flavor only waits,
//! and the coordinated flavor wraps either with a [`crate::coordination::Coordinator`]
//! and lifecycle hooks. The [`SessionManager`] underneath implements the
//! restore-or-init-then-poll state machine both flavors share.

mod chief;
mod coordinated;
mod error;
mod manager;
mod scaffold;
mod worker;

pub use chief::ChiefSessionCreator;
pub use coordinated::{CoordinatedSession, CoordinatedSessionCreator, DEFAULT_STOP_GRACE};
pub use error::{BootstrapErr, Result};
pub use manager::{CheckpointTarget, DEFAULT_READY_TIMEOUT, SessionManager};
pub use scaffold::{BuiltScaffold, InitFn, Scaffold};
pub use worker::{DEFAULT_MAX_WAIT, WorkerSessionCreator};

use crate::runtime::Session;

/// Produces ready-to-use sessions.
///
/// Creators are stateful: the first creation resolves and caches the
/// scaffold, and later creations reuse it, so one creator can serve a
/// process that loses and re-establishes its session.
pub trait SessionCreator {
    /// Creates a session that has reached readiness.
    ///
    /// # Returns
    /// A ready session, or why bring-up failed.
    fn create_session(&mut self) -> Result<Box<dyn Session>>;
}
