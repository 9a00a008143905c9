use std::{
    error::Error,
    fmt::{self, Display},
    time::Duration,
};

use crate::{checkpoint::CheckpointErr, graph::GraphErr, runtime::SessionErr};

/// The bootstrap module's result type.
pub type Result<T> = std::result::Result<T, BootstrapErr>;

/// Session bring-up failures.
///
/// Errors raised while a session is being brought to a ready state; the
/// partially-created session is always discarded, never returned.
#[derive(Debug)]
pub enum BootstrapErr {
    /// Active initialization ran but readiness was never achieved.
    Preparation { master: String, reason: String },
    /// Passive waiting exceeded its ceiling.
    WaitTimeout {
        master: String,
        waited: Duration,
        reason: String,
    },
    /// A checkpoint restore was attempted and failed.
    Restore(CheckpointErr),
    /// The graph rejected scaffold construction.
    Graph(GraphErr),
    /// The substrate failed while driving initialization.
    Session(SessionErr),
}

impl Display for BootstrapErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapErr::Preparation { master, reason } => {
                write!(f, "failed to prepare session against {master:?}: {reason}")
            }
            BootstrapErr::WaitTimeout {
                master,
                waited,
                reason,
            } => write!(
                f,
                "session against {master:?} not ready after {waited:?}: {reason}"
            ),
            BootstrapErr::Restore(e) => write!(f, "checkpoint restore failed: {e}"),
            BootstrapErr::Graph(e) => write!(f, "scaffold construction failed: {e}"),
            BootstrapErr::Session(e) => write!(f, "session error during bring-up: {e}"),
        }
    }
}

impl Error for BootstrapErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BootstrapErr::Restore(e) => Some(e),
            BootstrapErr::Graph(e) => Some(e),
            BootstrapErr::Session(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GraphErr> for BootstrapErr {
    fn from(value: GraphErr) -> Self {
        Self::Graph(value)
    }
}

impl From<SessionErr> for BootstrapErr {
    fn from(value: SessionErr) -> Self {
        Self::Session(value)
    }
}
