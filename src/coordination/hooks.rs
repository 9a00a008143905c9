use crate::{
    graph::OpHandle,
    runtime::{Fetch, Session},
};

use super::Coordinator;

/// Observer of coordinated session lifecycle and op execution.
///
/// Hooks are notified once per created session, after the wrapped session
/// exists and before it is handed to the caller, and see every op routed
/// through a coordinated session.
pub trait SessionHook: Send + Sync {
    /// Called exactly once per created coordinated session.
    ///
    /// # Arguments
    /// * `session` - The freshly created, ready session.
    /// * `coordinator` - The coordinator bound to the session, for spawning
    ///   and tracking background threads.
    fn after_session_creation(&self, session: &dyn Session, coordinator: &Coordinator) {
        let _ = session;
        let _ = coordinator;
    }

    /// Called before every op run of the coordinated session.
    fn before_run(&self, op: OpHandle) {
        let _ = op;
    }

    /// Called after every successful op run of the coordinated session.
    fn after_run(&self, op: OpHandle, fetch: &Fetch) {
        let _ = op;
        let _ = fetch;
    }
}
