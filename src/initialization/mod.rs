//! Initial-value generators for variables and optimizer slots.

mod constant;
mod error;
mod random;

pub use constant::ConstInit;
pub use error::{RandErr, Result};
pub use random::RandInit;

/// An `Initializer` generates the initial values of a variable.
pub trait Initializer: Send + Sync {
    /// Generates `n` initial values.
    ///
    /// # Arguments
    /// * `n` - The number of values to generate.
    ///
    /// # Returns
    /// Exactly `n` values.
    fn generate(&self, n: usize) -> Vec<f64>;
}
