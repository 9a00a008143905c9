//! Cooperative cancellation and session lifecycle observation.

mod coordinator;
mod hooks;

pub use coordinator::{Coordinator, CoordinatorErr};
pub use hooks::SessionHook;
