use std::sync::Arc;

use crate::{
    graph::{AttrValue, Graph, Input, OpHandle, TensorValue, VariableRef},
    initialization::ConstInit,
};

use super::{Algorithm, ApplyCtx, Prepared, Result, SlotStore};

/// Default initial value of the squared-gradient accumulator.
pub const DEFAULT_INITIAL_ACCUMULATOR: f64 = 0.1;

/// The name of the per-variable accumulator slot.
pub const ACCUMULATOR_SLOT: &str = "accumulator";

/// Adaptive-gradient update rule.
///
/// Keeps one accumulator slot per variable, same shape and dtype as the
/// variable, and performs
///
/// ```text
/// accumulator += g * g
/// variable    -= lr * g / sqrt(accumulator)
/// ```
///
/// element-wise per step. The accumulator stays strictly positive as long as
/// the initial value is positive, since it only grows by squared gradients.
#[derive(Debug, Clone, Copy)]
pub struct AdaGrad {
    learning_rate: f64,
    initial_accumulator_value: f64,
}

impl AdaGrad {
    /// Creates a new `AdaGrad` update rule.
    ///
    /// # Arguments
    /// * `learning_rate` - The small coefficient that modulates the amount of
    ///   training per update.
    ///
    /// # Returns
    /// A new `AdaGrad` instance with the default accumulator start value.
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            initial_accumulator_value: DEFAULT_INITIAL_ACCUMULATOR,
        }
    }

    /// Overrides the accumulator's start value.
    ///
    /// Callers must supply a strictly positive value; a non-positive start
    /// divides by zero inside the update and is not validated here.
    ///
    /// # Arguments
    /// * `value` - The accumulator start value.
    ///
    /// # Returns
    /// Self, for chaining.
    pub fn initial_accumulator_value(mut self, value: f64) -> Self {
        self.initial_accumulator_value = value;
        self
    }
}

impl Algorithm for AdaGrad {
    fn name(&self) -> &'static str {
        "adagrad"
    }

    fn create_slots(
        &self,
        graph: &Graph,
        slots: &mut SlotStore,
        vars: &[VariableRef],
    ) -> Result<()> {
        let init = Arc::new(ConstInit::new(self.initial_accumulator_value));

        for var in vars {
            slots.get_or_create(
                ACCUMULATOR_SLOT,
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
        let accum = ctx.slots.get(ACCUMULATOR_SLOT, var)?;
        let lr = ctx.prepared.learning_rate_for(var);

        let handle = ctx.graph.add_op(
            "apply_adagrad",
            vec![
                ("var".to_string(), Input::Var(var.clone())),
                ("accum".to_string(), Input::Var(accum)),
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
        let accum = ctx.slots.get(ACCUMULATOR_SLOT, var)?;
        let lr = ctx.prepared.learning_rate_for(var);

        let handle = ctx.graph.add_op(
            "sparse_apply_adagrad",
            vec![
                ("var".to_string(), Input::Var(var.clone())),
                ("accum".to_string(), Input::Var(accum)),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graph::{Collection, DType},
        optimization::Optimizer,
        runtime::{FeedMap, Runtime, Session, SessionConfig},
    };

    fn setup(shape: &[usize]) -> (Arc<Graph>, VariableRef, Optimizer<AdaGrad>) {
        let graph = Arc::new(Graph::new());
        let var = graph
            .variable(
                "w",
                DType::F64,
                shape,
                Collection::Global,
                Arc::new(ConstInit::new(1.0)),
            )
            .unwrap();

        let mut optimizer = Optimizer::new(AdaGrad::new(0.5));
        optimizer
            .create_slots(&graph, std::slice::from_ref(&var))
            .unwrap();
        optimizer.prepare();

        (graph, var, optimizer)
    }

    #[test]
    fn create_slots_is_idempotent() {
        let (graph, var, mut optimizer) = setup(&[2]);

        optimizer
            .create_slots(&graph, std::slice::from_ref(&var))
            .unwrap();
        assert_eq!(optimizer.slots().len(), 1);
    }

    #[test]
    fn dense_update_follows_the_recurrence() {
        let (graph, var, optimizer) = setup(&[2]);
        let grad = TensorValue::new(DType::F64, vec![2.0, -3.0]);
        let op = optimizer.apply_dense(&graph, &grad, &var).unwrap();

        let runtime = Arc::new(Runtime::new());
        let session = runtime.connect("local", graph.clone(), SessionConfig::default());
        session
            .assign("w", TensorValue::new(DType::F64, vec![1.0, 1.0]))
            .unwrap();
        session
            .assign("w/adagrad/accumulator", TensorValue::filled(DType::F64, 2, 0.1))
            .unwrap();

        session.run(op, &FeedMap::new()).unwrap();

        let accum = session.fetch("w/adagrad/accumulator").unwrap();
        let expected_accum = [0.1 + 4.0, 0.1 + 9.0];
        assert_eq!(accum.data(), &expected_accum);

        let w = session.fetch("w").unwrap();
        let expected = [
            1.0 - 0.5 * 2.0 / expected_accum[0].sqrt(),
            1.0 - 0.5 * -3.0 / expected_accum[1].sqrt(),
        ];
        assert_eq!(w.data(), &expected);
    }

    #[test]
    fn sparse_update_leaves_unindexed_rows_untouched() {
        let (graph, var, optimizer) = setup(&[3, 2]);
        let values = TensorValue::new(DType::F64, vec![1.0, 2.0]);
        let op = optimizer.apply_sparse(&graph, &values, &[1], &var).unwrap();

        let runtime = Arc::new(Runtime::new());
        let session = runtime.connect("local", graph.clone(), SessionConfig::default());
        session
            .assign("w", TensorValue::filled(DType::F64, 6, 1.0))
            .unwrap();
        session
            .assign("w/adagrad/accumulator", TensorValue::filled(DType::F64, 6, 0.1))
            .unwrap();

        session.run(op, &FeedMap::new()).unwrap();

        let accum = session.fetch("w/adagrad/accumulator").unwrap();
        let w = session.fetch("w").unwrap();

        // Rows 0 and 2 keep their exact previous values.
        for i in [0, 1, 4, 5] {
            assert_eq!(accum.data()[i], 0.1);
            assert_eq!(w.data()[i], 1.0);
        }

        // Row 1 follows the dense recurrence.
        let a2 = 0.1 + 1.0;
        let a3 = 0.1 + 4.0;
        assert_eq!(accum.data()[2], a2);
        assert_eq!(accum.data()[3], a3);
        assert_eq!(w.data()[2], 1.0 - 0.5 * 1.0 / a2.sqrt());
        assert_eq!(w.data()[3], 1.0 - 0.5 * 2.0 / a3.sqrt());
    }

    #[test]
    fn mixed_precision_variables_share_one_optimizer() {
        let graph = Arc::new(Graph::new());
        let lo = graph
            .variable(
                "lo",
                DType::F32,
                &[1],
                Collection::Global,
                Arc::new(ConstInit::new(1.0)),
            )
            .unwrap();
        let hi = graph
            .variable(
                "hi",
                DType::F64,
                &[1],
                Collection::Global,
                Arc::new(ConstInit::new(1.0)),
            )
            .unwrap();

        let mut optimizer = Optimizer::new(AdaGrad::new(0.1));
        optimizer
            .create_slots(&graph, &[lo.clone(), hi.clone()])
            .unwrap();
        optimizer.prepare();

        let grad_lo = TensorValue::new(DType::F32, vec![1.0]);
        let grad_hi = TensorValue::new(DType::F64, vec![1.0]);
        let op_lo = optimizer.apply_dense(&graph, &grad_lo, &lo).unwrap();
        let op_hi = optimizer.apply_dense(&graph, &grad_hi, &hi).unwrap();

        let lr_lo = match graph.op(op_lo).unwrap().attr("lr") {
            Some(AttrValue::Float(lr)) => *lr,
            _ => panic!("missing lr attr"),
        };
        let lr_hi = match graph.op(op_hi).unwrap().attr("lr") {
            Some(AttrValue::Float(lr)) => *lr,
            _ => panic!("missing lr attr"),
        };

        assert_eq!(lr_lo, 0.1f32 as f64);
        assert_eq!(lr_hi, 0.1);
    }
}
