use crate::graph::{Graph, OpHandle, TensorValue, VariableRef};

use super::{OptimizerErr, Result, SlotStore};

/// Scalars derived once by `prepare` and reused by every apply call.
#[derive(Debug, Clone, Copy)]
pub struct Prepared {
    learning_rate: f64,
}

impl Prepared {
    /// Creates a new `Prepared` snapshot.
    ///
    /// # Arguments
    /// * `learning_rate` - The optimizer-wide step size.
    ///
    /// # Returns
    /// A new `Prepared` instance.
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }

    /// Returns the step size cast to `var`'s dtype.
    ///
    /// Each variable gets its own cast so that mixed-precision variable sets
    /// can share one optimizer.
    pub fn learning_rate_for(&self, var: &VariableRef) -> f64 {
        var.dtype().quantize(self.learning_rate)
    }
}

/// Per-variable emission context handed to the algorithm.
pub struct ApplyCtx<'a> {
    pub graph: &'a Graph,
    pub slots: &'a SlotStore,
    pub prepared: Prepared,
    pub use_locking: bool,
}

/// Defines the update rule of a gradient-based optimizer.
///
/// An `Algorithm` only emits ops; the state-machine half (slot registry,
/// prepare gate, locking flag) lives in [`Optimizer`].
pub trait Algorithm: Send {
    /// Returns a short identifier used in slot and variable naming.
    fn name(&self) -> &'static str;

    /// Materializes auxiliary slot variables for `vars`.
    ///
    /// Relies on slot idempotence, so repeating the call for an overlapping
    /// variable set is safe.
    ///
    /// # Arguments
    /// * `graph` - The graph to declare slots in.
    /// * `slots` - The owning optimizer's slot store.
    /// * `vars` - The variables that will receive gradients.
    ///
    /// # Returns
    /// An error if slot creation fails.
    fn create_slots(
        &self,
        graph: &Graph,
        slots: &mut SlotStore,
        vars: &[VariableRef],
    ) -> Result<()>;

    /// Computes the optimizer-wide derived scalars.
    ///
    /// # Returns
    /// The prepared snapshot cached by the owning optimizer.
    fn prepare(&self) -> Prepared;

    /// Emits the in-place dense update op for `var`.
    ///
    /// # Arguments
    /// * `ctx` - The emission context.
    /// * `grad` - A dense gradient matching `var`'s element count.
    /// * `var` - The variable to update.
    ///
    /// # Returns
    /// The emitted op's handle.
    fn apply_dense(
        &self,
        ctx: &ApplyCtx<'_>,
        grad: &TensorValue,
        var: &VariableRef,
    ) -> Result<OpHandle>;

    /// Emits the row-restricted sparse update op for `var`.
    ///
    /// Rows of `var` (and of its slots) outside `indices` must be left
    /// unchanged by the emitted op.
    ///
    /// # Arguments
    /// * `ctx` - The emission context.
    /// * `values` - Gradient rows, one per entry of `indices`.
    /// * `indices` - The rows to update.
    /// * `var` - The variable to update.
    ///
    /// # Returns
    /// The emitted op's handle.
    fn apply_sparse(
        &self,
        ctx: &ApplyCtx<'_>,
        values: &TensorValue,
        indices: &[usize],
        var: &VariableRef,
    ) -> Result<OpHandle>;
}

/// The stateful half of an optimizer: slot registry, prepare gate, locking.
///
/// Lifecycle: `create_slots` during graph construction, `prepare` exactly
/// once before the first apply call, then `apply_dense`/`apply_sparse` per
/// variable. Applying before preparing fails with `NotPrepared` before any
/// op is emitted.
pub struct Optimizer<A: Algorithm> {
    algorithm: A,
    slots: SlotStore,
    prepared: Option<Prepared>,
    use_locking: bool,
}

impl<A: Algorithm> Optimizer<A> {
    /// Creates a new, unprepared `Optimizer`.
    ///
    /// # Arguments
    /// * `algorithm` - The update rule to emit ops for.
    ///
    /// # Returns
    /// A new `Optimizer` instance.
    pub fn new(algorithm: A) -> Self {
        let slots = SlotStore::new(algorithm.name());

        Self {
            algorithm,
            slots,
            prepared: None,
            use_locking: false,
        }
    }

    /// Sets whether emitted updates run under the variable cells' locks.
    ///
    /// When false, concurrent updates to the same variable are allowed to
    /// race; last-write or interleaved outcomes are undefined by contract.
    ///
    /// # Arguments
    /// * `use_locking` - The locking flag for every emitted op.
    ///
    /// # Returns
    /// Self, for chaining.
    pub fn with_locking(mut self, use_locking: bool) -> Self {
        self.use_locking = use_locking;
        self
    }

    /// Materializes the algorithm's slots for `vars`. Safe to repeat.
    ///
    /// # Arguments
    /// * `graph` - The graph to declare slots in.
    /// * `vars` - The variables that will receive gradients.
    ///
    /// # Returns
    /// An error if slot creation fails.
    pub fn create_slots(&mut self, graph: &Graph, vars: &[VariableRef]) -> Result<()> {
        self.algorithm.create_slots(graph, &mut self.slots, vars)
    }

    /// Computes and caches the optimizer-wide derived scalars.
    ///
    /// Must run before the first apply call; repeating it refreshes the
    /// cached snapshot.
    pub fn prepare(&mut self) {
        self.prepared = Some(self.algorithm.prepare());
    }

    /// Returns whether `prepare` has run.
    pub fn is_prepared(&self) -> bool {
        self.prepared.is_some()
    }

    /// Emits the dense update op for `var`.
    ///
    /// # Arguments
    /// * `graph` - The graph to emit into.
    /// * `grad` - A dense gradient matching `var`'s element count.
    /// * `var` - The variable to update.
    ///
    /// # Returns
    /// The emitted op's handle, `NotPrepared` if `prepare` never ran, or a
    /// shape error if the gradient does not match.
    pub fn apply_dense(
        &self,
        graph: &Graph,
        grad: &TensorValue,
        var: &VariableRef,
    ) -> Result<OpHandle> {
        let ctx = self.ctx(graph)?;

        if grad.len() != var.len() {
            return Err(OptimizerErr::ShapeMismatch {
                variable: var.name().to_string(),
                expected: var.len(),
                got: grad.len(),
            });
        }

        self.algorithm.apply_dense(&ctx, grad, var)
    }

    /// Emits the sparse update op for `var`.
    ///
    /// # Arguments
    /// * `graph` - The graph to emit into.
    /// * `values` - Gradient rows, one per entry of `indices`.
    /// * `indices` - The rows to update.
    /// * `var` - The variable to update.
    ///
    /// # Returns
    /// The emitted op's handle, `NotPrepared` if `prepare` never ran, or a
    /// shape error if the rows do not match.
    pub fn apply_sparse(
        &self,
        graph: &Graph,
        values: &TensorValue,
        indices: &[usize],
        var: &VariableRef,
    ) -> Result<OpHandle> {
        let ctx = self.ctx(graph)?;
        let expected = indices.len() * var.row_size();

        if values.len() != expected {
            return Err(OptimizerErr::ShapeMismatch {
                variable: var.name().to_string(),
                expected,
                got: values.len(),
            });
        }

        self.algorithm.apply_sparse(&ctx, values, indices, var)
    }

    /// Returns the optimizer's slot store.
    pub fn slots(&self) -> &SlotStore {
        &self.slots
    }

    fn ctx<'a>(&'a self, graph: &'a Graph) -> Result<ApplyCtx<'a>> {
        let prepared = self.prepared.ok_or(OptimizerErr::NotPrepared)?;

        Ok(ApplyCtx {
            graph,
            slots: &self.slots,
            prepared,
            use_locking: self.use_locking,
        })
    }
}
