//! Gradient-based optimizers and their auxiliary slot state.
//!
//! The stateful machinery (slot registry, prepare gate, locking flag) lives
//! in [`Optimizer`]; concrete update rules implement [`Algorithm`] and only
//! emit ops into the graph. The numeric kernels themselves are executed by
//! the runtime's session interpreter.

mod adagrad;
mod error;
mod gradient_descent;
mod momentum;
mod optimizer;
mod slots;

pub use adagrad::{ACCUMULATOR_SLOT, AdaGrad, DEFAULT_INITIAL_ACCUMULATOR};
pub use error::{OptimizerErr, Result};
pub use gradient_descent::GradientDescent;
pub use momentum::{MOMENTUM_SLOT, Momentum};
pub use optimizer::{Algorithm, ApplyCtx, Optimizer, Prepared};
pub use slots::SlotStore;
