use std::{
    error::Error,
    fmt::{self, Display},
};

use crate::graph::GraphErr;

/// The optimization module's result type.
pub type Result<T> = std::result::Result<T, OptimizerErr>;

/// Optimizer misuse and emission failures.
#[derive(Debug)]
pub enum OptimizerErr {
    /// `apply_dense`/`apply_sparse` was called before `prepare`.
    NotPrepared,
    /// A slot lookup ran before the slot was created.
    SlotNotFound { slot: String, variable: String },
    /// A gradient does not match the target variable's element count.
    ShapeMismatch {
        variable: String,
        expected: usize,
        got: usize,
    },
    /// The underlying graph rejected the emission.
    Graph(GraphErr),
}

impl Display for OptimizerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizerErr::NotPrepared => {
                f.write_str("optimizer not prepared: call prepare() before applying gradients")
            }
            OptimizerErr::SlotNotFound { slot, variable } => {
                write!(f, "no slot {slot:?} registered for variable {variable:?}")
            }
            OptimizerErr::ShapeMismatch {
                variable,
                expected,
                got,
            } => write!(
                f,
                "gradient length mismatch for {variable:?}: got {got}, expected {expected}"
            ),
            OptimizerErr::Graph(e) => write!(f, "graph error: {e}"),
        }
    }
}

impl Error for OptimizerErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            OptimizerErr::Graph(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GraphErr> for OptimizerErr {
    fn from(value: GraphErr) -> Self {
        Self::Graph(value)
    }
}
