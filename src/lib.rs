//! Distributed training session bring-up and optimizer machinery.
//!
//! The crate splits into two halves. The bootstrap half takes a process
//! from "I have a graph" to "I have a ready session": [`bootstrap::Scaffold`]
//! declares the supportive ops, [`bootstrap::SessionManager`] drives the
//! restore-or-init-then-poll state machine, and the [`bootstrap::SessionCreator`]
//! flavors encode the chief and worker roles. The optimization half applies
//! gradients through graph ops: [`optimization::Optimizer`] owns per-variable
//! auxiliary state in a [`optimization::SlotStore`] and delegates the math to
//! an [`optimization::Algorithm`] such as [`optimization::AdaGrad`].
//!
//! Everything executes against the in-memory [`runtime::Runtime`], where
//! sessions created against the same master address share variable state,
//! the way separate processes would against one training cluster.

pub mod bootstrap;
pub mod checkpoint;
pub mod coordination;
pub mod graph;
pub mod initialization;
pub mod optimization;
pub mod runtime;

pub use bootstrap::{
    ChiefSessionCreator, CoordinatedSessionCreator, Scaffold, SessionCreator, SessionManager,
    WorkerSessionCreator,
};
pub use coordination::{Coordinator, SessionHook};
pub use graph::{DType, Graph, TensorValue};
pub use optimization::{AdaGrad, GradientDescent, Momentum, Optimizer};
pub use runtime::{Runtime, Session, SessionConfig};
