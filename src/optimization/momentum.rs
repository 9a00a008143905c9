use std::sync::Arc;

use crate::{
    graph::{AttrValue, Graph, Input, OpHandle, TensorValue, VariableRef},
    initialization::ConstInit,
};

use super::{Algorithm, ApplyCtx, Prepared, Result, SlotStore};

/// The name of the per-variable velocity slot.
pub const MOMENTUM_SLOT: &str = "momentum";

/// Gradient descent with momentum.
///
/// Keeps one zero-initialized velocity slot per variable and performs
///
/// ```text
/// velocity  = momentum * velocity + g
/// variable -= lr * velocity
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Momentum {
    learning_rate: f64,
    momentum: f64,
}

impl Momentum {
    /// Creates a new `Momentum` update rule.
    ///
    /// # Arguments
    /// * `learning_rate` - The small coefficient that modulates the amount of
    ///   training per update.
    /// * `momentum` - The velocity decay coefficient.
    ///
    /// # Returns
    /// A new `Momentum` instance.
    pub fn new(learning_rate: f64, momentum: f64) -> Self {
        Self {
            learning_rate,
            momentum,
        }
    }
}

impl Algorithm for Momentum {
    fn name(&self) -> &'static str {
        "momentum"
    }

    fn create_slots(
        &self,
        graph: &Graph,
        slots: &mut SlotStore,
        vars: &[VariableRef],
    ) -> Result<()> {
        let init = Arc::new(ConstInit::new(0.0));

        for var in vars {
            slots.get_or_create(
                MOMENTUM_SLOT,
                var,
                init.clone(),
                var.shape(),
                var.dtype(),
                graph,
            )?;
        }

        Ok(())
    }

    fn prepare(&self) -> Prepared {
        Prepared::new(self.learning_rate)
    }

    fn apply_dense(
        &self,
        ctx: &ApplyCtx<'_>,
        grad: &TensorValue,
        var: &VariableRef,
    ) -> Result<OpHandle> {
        let vel = ctx.slots.get(MOMENTUM_SLOT, var)?;
        let lr = ctx.prepared.learning_rate_for(var);
        let momentum = var.dtype().quantize(self.momentum);

        let handle = ctx.graph.add_op(
            "apply_momentum",
            vec![
                ("var".to_string(), Input::Var(var.clone())),
                ("vel".to_string(), Input::Var(vel)),
                ("grad".to_string(), Input::Tensor(grad.clone())),
            ],
            vec![
                ("lr".to_string(), AttrValue::Float(lr)),
                ("momentum".to_string(), AttrValue::Float(momentum)),
                ("use_locking".to_string(), AttrValue::Bool(ctx.use_locking)),
            ],
        )?;

        Ok(handle)
    }

    fn apply_sparse(
        &self,
        ctx: &ApplyCtx<'_>,
        values: &TensorValue,
        indices: &[usize],
        var: &VariableRef,
    ) -> Result<OpHandle> {
        let vel = ctx.slots.get(MOMENTUM_SLOT, var)?;
        let lr = ctx.prepared.learning_rate_for(var);
        let momentum = var.dtype().quantize(self.momentum);

        let handle = ctx.graph.add_op(
            "sparse_apply_momentum",
            vec![
                ("var".to_string(), Input::Var(var.clone())),
                ("vel".to_string(), Input::Var(vel)),
                ("grad".to_string(), Input::Tensor(values.clone())),
                ("indices".to_string(), Input::Indices(indices.to_vec())),
            ],
            vec![
                ("lr".to_string(), AttrValue::Float(lr)),
                ("momentum".to_string(), AttrValue::Float(momentum)),
                ("use_locking".to_string(), AttrValue::Bool(ctx.use_locking)),
            ],
        )?;

        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graph::{Collection, DType},
        optimization::Optimizer,
        runtime::{FeedMap, Runtime, Session, SessionConfig},
    };

    #[test]
    fn velocity_accumulates_across_steps() {
        let graph = Arc::new(Graph::new());
        let var = graph
            .variable(
                "w",
                DType::F64,
                &[1],
                Collection::Global,
                Arc::new(ConstInit::new(0.0)),
            )
            .unwrap();

        let mut optimizer = Optimizer::new(Momentum::new(0.1, 0.9));
        optimizer
            .create_slots(&graph, std::slice::from_ref(&var))
            .unwrap();
        optimizer.prepare();

        let grad = TensorValue::new(DType::F64, vec![1.0]);
        let op = optimizer.apply_dense(&graph, &grad, &var).unwrap();

        let runtime = Arc::new(Runtime::new());
        let session = runtime.connect("local", graph.clone(), SessionConfig::default());
        session
            .assign("w", TensorValue::new(DType::F64, vec![1.0]))
            .unwrap();
        session
            .assign("w/momentum/momentum", TensorValue::new(DType::F64, vec![0.0]))
            .unwrap();

        session.run(op, &FeedMap::new()).unwrap();
        session.run(op, &FeedMap::new()).unwrap();

        // v1 = 0.9 * 0 + 1, w1 = 1 - 0.1 * v1; v2 = 0.9 * v1 + 1,
        // w2 = w1 - 0.1 * v2. Mirrors the update's arithmetic exactly.
        let v1 = 0.9 * 0.0 + 1.0;
        let v2 = 0.9 * v1 + 1.0;
        let vel = session.fetch("w/momentum/momentum").unwrap();
        assert_eq!(vel.data(), &[v2]);

        let w = session.fetch("w").unwrap();
        assert_eq!(w.data(), &[1.0 - 0.1 * v1 - 0.1 * v2]);
    }
}
