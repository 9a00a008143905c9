use crate::graph::{AttrValue, Graph, Input, OpHandle, TensorValue, VariableRef};

use super::{Algorithm, ApplyCtx, Prepared, Result, SlotStore};

/// Plain stochastic gradient descent: `variable -= lr * g`. Keeps no slots.
#[derive(Debug, Clone, Copy)]
pub struct GradientDescent {
    learning_rate: f64,
}

impl GradientDescent {
    /// Creates a new `GradientDescent` update rule.
    ///
    /// # Arguments
    /// * `learning_rate` - The small coefficient that modulates the amount of
    ///   training per update.
    ///
    /// # Returns
    /// A new `GradientDescent` instance.
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }
}

impl Algorithm for GradientDescent {
    fn name(&self) -> &'static str {
        "gradient_descent"
    }

    fn create_slots(
        &self,
        _graph: &Graph,
        _slots: &mut SlotStore,
        _vars: &[VariableRef],
    ) -> Result<()> {
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
        let lr = ctx.prepared.learning_rate_for(var);

        let handle = ctx.graph.add_op(
            "apply_gradient_descent",
            vec![
                ("var".to_string(), Input::Var(var.clone())),
                ("grad".to_string(), Input::Tensor(grad.clone())),
            ],
            vec![
                ("lr".to_string(), AttrValue::Float(lr)),
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
        let lr = ctx.prepared.learning_rate_for(var);

        let handle = ctx.graph.add_op(
            "sparse_apply_gradient_descent",
            vec![
                ("var".to_string(), Input::Var(var.clone())),
                ("grad".to_string(), Input::Tensor(values.clone())),
                ("indices".to_string(), Input::Indices(indices.to_vec())),
            ],
            vec![
                ("lr".to_string(), AttrValue::Float(lr)),
                ("use_locking".to_string(), AttrValue::Bool(ctx.use_locking)),
            ],
        )?;

        Ok(handle)
    }
}
