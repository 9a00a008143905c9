use std::{
    collections::HashMap,
    error::Error,
    fmt::{self, Display},
    sync::Arc,
    time::Duration,
};

use log::debug;
use parking_lot::MutexGuard;

use crate::graph::{
    AttrValue, Collection, Graph, Input, Op, OpHandle, TensorValue, VariableRef,
};

use super::{VariableCell, VariableStore};

/// The runtime module's result type.
pub type Result<T> = std::result::Result<T, SessionErr>;

/// Values fed into an op run, keyed by variable name.
pub type FeedMap = HashMap<String, TensorValue>;

/// Session execution failures.
#[derive(Debug)]
pub enum SessionErr {
    /// The op handle does not belong to the session's graph.
    UnknownOp(usize),
    /// The op kind is not understood by this runtime.
    UnsupportedOp(String),
    /// The named variable is not declared in the graph.
    UnknownVariable(String),
    /// The named variable was read or updated before initialization.
    Uninitialized(String),
    /// An op is missing a required input.
    MissingInput { op: String, name: String },
    /// An op is missing a required attribute, or it has the wrong type.
    BadAttr { op: String, name: String },
    /// A value's element count does not match the target variable.
    LengthMismatch {
        variable: String,
        expected: usize,
        got: usize,
    },
    /// A sparse update addressed a row past the variable's leading dimension.
    IndexOutOfRange {
        variable: String,
        index: usize,
        rows: usize,
    },
    /// A locked update could not take the cell lock within the configured
    /// operation timeout.
    LockTimeout { variable: String },
    /// Background-thread shutdown failed while closing a coordinated session.
    Coordination(String),
}

impl Display for SessionErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionErr::UnknownOp(index) => {
                write!(f, "op handle {index} does not belong to this graph")
            }
            SessionErr::UnsupportedOp(kind) => write!(f, "unsupported op kind {kind:?}"),
            SessionErr::UnknownVariable(name) => {
                write!(f, "variable {name:?} is not declared in the graph")
            }
            SessionErr::Uninitialized(name) => {
                write!(f, "variable {name:?} has not been initialized")
            }
            SessionErr::MissingInput { op, name } => {
                write!(f, "op {op:?} is missing required input {name:?}")
            }
            SessionErr::BadAttr { op, name } => {
                write!(f, "op {op:?} is missing or mistyping attribute {name:?}")
            }
            SessionErr::LengthMismatch {
                variable,
                expected,
                got,
            } => write!(
                f,
                "value length mismatch for {variable:?}: got {got}, expected {expected}"
            ),
            SessionErr::IndexOutOfRange {
                variable,
                index,
                rows,
            } => write!(
                f,
                "sparse index {index} out of range for {variable:?} with {rows} rows"
            ),
            SessionErr::LockTimeout { variable } => {
                write!(f, "timed out waiting for the lock on {variable:?}")
            }
            SessionErr::Coordination(reason) => {
                write!(f, "coordinated shutdown failed: {reason}")
            }
        }
    }
}

impl Error for SessionErr {}

/// Runtime-level session options, opaque to the bootstrap machinery.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Bounds lock acquisition of locked updates. `None` waits indefinitely.
    pub operation_timeout: Option<Duration>,
}

/// The result of running an op.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch {
    /// The op produced no value.
    None,
    /// The op produced a list of variable names, e.g. a readiness probe.
    Names(Vec<String>),
}

impl Fetch {
    /// Returns whether the fetch carries no offending names.
    pub fn is_empty(&self) -> bool {
        match self {
            Fetch::None => true,
            Fetch::Names(names) => names.is_empty(),
        }
    }
}

/// A live connection to the execution substrate.
///
/// Every session creation path (chief, worker, coordinated) produces a value
/// satisfying this interface.
pub trait Session: Send + Sync {
    /// Executes an op of the session's graph.
    ///
    /// # Arguments
    /// * `op` - The op to run.
    /// * `feeds` - Values fed into the run, keyed by variable name.
    ///
    /// # Returns
    /// The op's fetch, or an execution error.
    fn run(&self, op: OpHandle, feeds: &FeedMap) -> Result<Fetch>;

    /// Reads a variable's current value.
    ///
    /// # Arguments
    /// * `variable` - The variable name.
    ///
    /// # Returns
    /// The current value, or an error if unknown or uninitialized.
    fn fetch(&self, variable: &str) -> Result<TensorValue>;

    /// Overwrites a variable's value, marking it initialized.
    ///
    /// # Arguments
    /// * `variable` - The variable name.
    /// * `value` - The new value; cast into the variable's dtype.
    ///
    /// # Returns
    /// An error if the variable is unknown or the length does not match.
    fn assign(&self, variable: &str, value: TensorValue) -> Result<()>;

    /// Returns the runtime target address this session talks to.
    fn master(&self) -> &str;

    /// Returns the graph the session executes ops of.
    fn graph(&self) -> &Arc<Graph>;

    /// Releases the session's resources.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// The substrate's own session implementation.
pub struct RuntimeSession {
    master: String,
    graph: Arc<Graph>,
    store: Arc<VariableStore>,
    config: SessionConfig,
}

impl RuntimeSession {
    pub(crate) fn new(
        master: String,
        graph: Arc<Graph>,
        store: Arc<VariableStore>,
        config: SessionConfig,
    ) -> Self {
        Self {
            master,
            graph,
            store,
            config,
        }
    }

    fn run_init(&self, op: &Op, feeds: &FeedMap) -> Result<Fetch> {
        let collection = collection_attr(op)?;

        for (var, initializer) in self.graph.variables_with_init(collection) {
            let value = match feeds.get(var.name()) {
                Some(fed) => {
                    if fed.len() != var.len() {
                        return Err(SessionErr::LengthMismatch {
                            variable: var.name().to_string(),
                            expected: var.len(),
                            got: fed.len(),
                        });
                    }
                    fed.cast(var.dtype())
                }
                None => TensorValue::new(var.dtype(), initializer.generate(var.len())),
            };

            self.store.cell(var.name()).put(value);
        }

        Ok(Fetch::None)
    }

    fn run_report(&self, op: &Op) -> Result<Fetch> {
        let collection = collection_attr(op)?;

        let names = self
            .graph
            .variables()
            .into_iter()
            .filter(|var| collection.is_none_or(|c| var.collection() == c))
            .filter(|var| !self.store.is_initialized(var.name()))
            .map(|var| var.name().to_string())
            .collect();

        Ok(Fetch::Names(names))
    }

    fn run_dense(&self, op: &Op) -> Result<Fetch> {
        let var = input_var(op, "var")?;
        let grad = input_tensor(op, "grad")?;
        let lr = attr_f64(op, "lr")?;
        let use_locking = attr_bool(op, "use_locking")?;

        if grad.len() != var.len() {
            return Err(SessionErr::LengthMismatch {
                variable: var.name().to_string(),
                expected: var.len(),
                got: grad.len(),
            });
        }

        match op.kind() {
            "apply_gradient_descent" => self.update_one(&var, use_locking, |value| {
                value.map_in_place(|p| {
                    for (p, g) in p.iter_mut().zip(grad.data()) {
                        *p -= lr * g;
                    }
                });
                Ok(())
            }),
            "apply_momentum" => {
                let vel = input_var(op, "vel")?;
                let momentum = attr_f64(op, "momentum")?;

                self.update_two(&var, &vel, use_locking, |value, vel| {
                    vel.map_in_place(|v| {
                        for (v, g) in v.iter_mut().zip(grad.data()) {
                            *v = momentum * *v + g;
                        }
                    });

                    let vel_now = vel.data().to_vec();
                    value.map_in_place(|p| {
                        for (p, v) in p.iter_mut().zip(&vel_now) {
                            *p -= lr * v;
                        }
                    });
                    Ok(())
                })
            }
            "apply_adagrad" => {
                let accum = input_var(op, "accum")?;

                self.update_two(&var, &accum, use_locking, |value, accum| {
                    accum.map_in_place(|a| {
                        for (a, g) in a.iter_mut().zip(grad.data()) {
                            *a += g * g;
                        }
                    });

                    let accum_now = accum.data().to_vec();
                    value.map_in_place(|p| {
                        for ((p, g), a) in p.iter_mut().zip(grad.data()).zip(&accum_now) {
                            *p -= lr * g / a.sqrt();
                        }
                    });
                    Ok(())
                })
            }
            other => Err(SessionErr::UnsupportedOp(other.to_string())),
        }?;

        Ok(Fetch::None)
    }

    fn run_sparse(&self, op: &Op) -> Result<Fetch> {
        let var = input_var(op, "var")?;
        let grad = input_tensor(op, "grad")?;
        let indices = input_indices(op, "indices")?;
        let lr = attr_f64(op, "lr")?;
        let use_locking = attr_bool(op, "use_locking")?;

        let row_size = var.row_size();
        let expected = indices.len() * row_size;

        if grad.len() != expected {
            return Err(SessionErr::LengthMismatch {
                variable: var.name().to_string(),
                expected,
                got: grad.len(),
            });
        }

        // Bounds are checked up front so a bad index cannot leave a partial
        // update behind.
        for &index in &indices {
            if index >= var.rows() {
                return Err(SessionErr::IndexOutOfRange {
                    variable: var.name().to_string(),
                    index,
                    rows: var.rows(),
                });
            }
        }

        match op.kind() {
            "sparse_apply_gradient_descent" => self.update_one(&var, use_locking, |value| {
                value.map_in_place(|p| {
                    for (k, &row) in indices.iter().enumerate() {
                        let src = &grad.data()[k * row_size..(k + 1) * row_size];
                        let dst = &mut p[row * row_size..(row + 1) * row_size];
                        for (p, g) in dst.iter_mut().zip(src) {
                            *p -= lr * g;
                        }
                    }
                });
                Ok(())
            }),
            "sparse_apply_momentum" => {
                let vel = input_var(op, "vel")?;
                let momentum = attr_f64(op, "momentum")?;

                self.update_two(&var, &vel, use_locking, |value, vel| {
                    vel.map_in_place(|v| {
                        for (k, &row) in indices.iter().enumerate() {
                            let src = &grad.data()[k * row_size..(k + 1) * row_size];
                            let dst = &mut v[row * row_size..(row + 1) * row_size];
                            for (v, g) in dst.iter_mut().zip(src) {
                                *v = momentum * *v + g;
                            }
                        }
                    });

                    let vel_now = vel.data().to_vec();
                    value.map_in_place(|p| {
                        for &row in &indices {
                            let range = row * row_size..(row + 1) * row_size;
                            for (p, v) in p[range.clone()].iter_mut().zip(&vel_now[range]) {
                                *p -= lr * v;
                            }
                        }
                    });
                    Ok(())
                })
            }
            "sparse_apply_adagrad" => {
                let accum = input_var(op, "accum")?;

                self.update_two(&var, &accum, use_locking, |value, accum| {
                    accum.map_in_place(|a| {
                        for (k, &row) in indices.iter().enumerate() {
                            let src = &grad.data()[k * row_size..(k + 1) * row_size];
                            let dst = &mut a[row * row_size..(row + 1) * row_size];
                            for (a, g) in dst.iter_mut().zip(src) {
                                *a += g * g;
                            }
                        }
                    });

                    let accum_now = accum.data().to_vec();
                    value.map_in_place(|p| {
                        for (k, &row) in indices.iter().enumerate() {
                            let src = &grad.data()[k * row_size..(k + 1) * row_size];
                            let range = row * row_size..(row + 1) * row_size;
                            let dst = &mut p[range.clone()];
                            for ((p, g), a) in dst.iter_mut().zip(src).zip(&accum_now[range]) {
                                *p -= lr * g / a.sqrt();
                            }
                        }
                    });
                    Ok(())
                })
            }
            other => Err(SessionErr::UnsupportedOp(other.to_string())),
        }?;

        Ok(Fetch::None)
    }

    /// Read-modify-writes one variable, honoring the op's locking flag.
    fn update_one<F>(&self, var: &VariableRef, use_locking: bool, f: F) -> Result<()>
    where
        F: FnOnce(&mut TensorValue) -> Result<()>,
    {
        let cell = self.store.cell(var.name());

        if use_locking {
            let mut guard = self.lock_cell(&cell, var.name())?;
            let value = guard
                .as_mut()
                .ok_or_else(|| SessionErr::Uninitialized(var.name().to_string()))?;
            f(value)
        } else {
            // Snapshot, compute, write back; interleavings with concurrent
            // updates are undefined by contract.
            let mut value = cell
                .snapshot()
                .ok_or_else(|| SessionErr::Uninitialized(var.name().to_string()))?;
            f(&mut value)?;
            cell.put(value);
            Ok(())
        }
    }

    /// Read-modify-writes a variable and one of its slots together.
    fn update_two<F>(
        &self,
        var: &VariableRef,
        slot: &VariableRef,
        use_locking: bool,
        f: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut TensorValue, &mut TensorValue) -> Result<()>,
    {
        let var_cell = self.store.cell(var.name());
        let slot_cell = self.store.cell(slot.name());

        if use_locking {
            // Guards are taken in id order so concurrent pairs cannot
            // deadlock against each other.
            let (mut var_guard, mut slot_guard);
            if var.id() <= slot.id() {
                var_guard = self.lock_cell(&var_cell, var.name())?;
                slot_guard = self.lock_cell(&slot_cell, slot.name())?;
            } else {
                slot_guard = self.lock_cell(&slot_cell, slot.name())?;
                var_guard = self.lock_cell(&var_cell, var.name())?;
            }

            let value = var_guard
                .as_mut()
                .ok_or_else(|| SessionErr::Uninitialized(var.name().to_string()))?;
            let slot_value = slot_guard
                .as_mut()
                .ok_or_else(|| SessionErr::Uninitialized(slot.name().to_string()))?;
            f(value, slot_value)
        } else {
            let mut value = var_cell
                .snapshot()
                .ok_or_else(|| SessionErr::Uninitialized(var.name().to_string()))?;
            let mut slot_value = slot_cell
                .snapshot()
                .ok_or_else(|| SessionErr::Uninitialized(slot.name().to_string()))?;
            f(&mut value, &mut slot_value)?;
            var_cell.put(value);
            slot_cell.put(slot_value);
            Ok(())
        }
    }

    fn lock_cell<'a>(
        &self,
        cell: &'a VariableCell,
        name: &str,
    ) -> Result<MutexGuard<'a, Option<TensorValue>>> {
        match self.config.operation_timeout {
            Some(timeout) => {
                cell.value
                    .try_lock_for(timeout)
                    .ok_or_else(|| SessionErr::LockTimeout {
                        variable: name.to_string(),
                    })
            }
            None => Ok(cell.value.lock()),
        }
    }
}

impl Session for RuntimeSession {
    fn run(&self, op: OpHandle, feeds: &FeedMap) -> Result<Fetch> {
        let op = self
            .graph
            .op(op)
            .ok_or(SessionErr::UnknownOp(op.index()))?;

        debug!(master = self.master.as_str(), op = op.kind(); "running op");

        match op.kind() {
            "no_op" => Ok(Fetch::None),
            "init_vars" => self.run_init(&op, feeds),
            "report_uninitialized" => self.run_report(&op),
            "apply_gradient_descent" | "apply_momentum" | "apply_adagrad" => self.run_dense(&op),
            "sparse_apply_gradient_descent" | "sparse_apply_momentum" | "sparse_apply_adagrad" => {
                self.run_sparse(&op)
            }
            other => Err(SessionErr::UnsupportedOp(other.to_string())),
        }
    }

    fn fetch(&self, variable: &str) -> Result<TensorValue> {
        let var = self
            .graph
            .variable_by_name(variable)
            .ok_or_else(|| SessionErr::UnknownVariable(variable.to_string()))?;

        self.store
            .cell(var.name())
            .snapshot()
            .ok_or_else(|| SessionErr::Uninitialized(variable.to_string()))
    }

    fn assign(&self, variable: &str, value: TensorValue) -> Result<()> {
        let var = self
            .graph
            .variable_by_name(variable)
            .ok_or_else(|| SessionErr::UnknownVariable(variable.to_string()))?;

        if value.len() != var.len() {
            return Err(SessionErr::LengthMismatch {
                variable: variable.to_string(),
                expected: var.len(),
                got: value.len(),
            });
        }

        self.store.cell(var.name()).put(value.cast(var.dtype()));
        Ok(())
    }

    fn master(&self) -> &str {
        &self.master
    }

    fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }
}

fn collection_attr(op: &Op) -> Result<Option<Collection>> {
    match op.attr("collection") {
        None => Ok(None),
        Some(AttrValue::Str(name)) => match name.as_str() {
            "global" => Ok(Some(Collection::Global)),
            "local" => Ok(Some(Collection::Local)),
            "all" => Ok(None),
            _ => Err(SessionErr::BadAttr {
                op: op.kind().to_string(),
                name: "collection".to_string(),
            }),
        },
        Some(_) => Err(SessionErr::BadAttr {
            op: op.kind().to_string(),
            name: "collection".to_string(),
        }),
    }
}

fn input_var(op: &Op, name: &str) -> Result<VariableRef> {
    match op.input(name) {
        Some(Input::Var(var)) => Ok(var.clone()),
        _ => Err(SessionErr::MissingInput {
            op: op.kind().to_string(),
            name: name.to_string(),
        }),
    }
}

fn input_tensor(op: &Op, name: &str) -> Result<TensorValue> {
    match op.input(name) {
        Some(Input::Tensor(tensor)) => Ok(tensor.clone()),
        _ => Err(SessionErr::MissingInput {
            op: op.kind().to_string(),
            name: name.to_string(),
        }),
    }
}

fn input_indices(op: &Op, name: &str) -> Result<Vec<usize>> {
    match op.input(name) {
        Some(Input::Indices(indices)) => Ok(indices.clone()),
        _ => Err(SessionErr::MissingInput {
            op: op.kind().to_string(),
            name: name.to_string(),
        }),
    }
}

fn attr_f64(op: &Op, name: &str) -> Result<f64> {
    match op.attr(name) {
        Some(AttrValue::Float(value)) => Ok(*value),
        _ => Err(SessionErr::BadAttr {
            op: op.kind().to_string(),
            name: name.to_string(),
        }),
    }
}

fn attr_bool(op: &Op, name: &str) -> Result<bool> {
    match op.attr(name) {
        Some(AttrValue::Bool(value)) => Ok(*value),
        _ => Err(SessionErr::BadAttr {
            op: op.kind().to_string(),
            name: name.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graph::DType,
        initialization::ConstInit,
        runtime::Runtime,
    };

    fn build_graph() -> Arc<Graph> {
        let graph = Graph::new();
        graph
            .variable(
                "global",
                DType::F64,
                &[2],
                Collection::Global,
                Arc::new(ConstInit::new(1.0)),
            )
            .unwrap();
        graph
            .variable(
                "local",
                DType::F64,
                &[1],
                Collection::Local,
                Arc::new(ConstInit::new(2.0)),
            )
            .unwrap();
        Arc::new(graph)
    }

    fn str_attr(name: &str, value: &str) -> (String, AttrValue) {
        (name.to_string(), AttrValue::Str(value.to_string()))
    }

    #[test]
    fn init_respects_collections_and_feeds() {
        let graph = build_graph();
        let init_global = graph
            .add_op("init_vars", vec![], vec![str_attr("collection", "global")])
            .unwrap();
        let report_all = graph
            .add_op("report_uninitialized", vec![], vec![str_attr("collection", "all")])
            .unwrap();

        let runtime = Arc::new(Runtime::new());
        let session = runtime.connect("local", graph.clone(), SessionConfig::default());

        let fetch = session.run(report_all, &FeedMap::new()).unwrap();
        assert_eq!(
            fetch,
            Fetch::Names(vec!["global".to_string(), "local".to_string()])
        );

        let mut feeds = FeedMap::new();
        feeds.insert(
            "global".to_string(),
            TensorValue::new(DType::F64, vec![5.0, 6.0]),
        );
        session.run(init_global, &feeds).unwrap();

        // The feed overrides the initializer; locals stay uninitialized.
        assert_eq!(session.fetch("global").unwrap().data(), &[5.0, 6.0]);
        let fetch = session.run(report_all, &FeedMap::new()).unwrap();
        assert_eq!(fetch, Fetch::Names(vec!["local".to_string()]));
    }

    #[test]
    fn sessions_against_one_master_share_state() {
        let graph = build_graph();
        let runtime = Arc::new(Runtime::new());
        let a = runtime.connect("m", graph.clone(), SessionConfig::default());
        let b = runtime.connect("m", graph.clone(), SessionConfig::default());

        a.assign("global", TensorValue::new(DType::F64, vec![3.0, 4.0]))
            .unwrap();
        assert_eq!(b.fetch("global").unwrap().data(), &[3.0, 4.0]);

        let c = runtime.connect("other", graph.clone(), SessionConfig::default());
        assert!(matches!(
            c.fetch("global"),
            Err(SessionErr::Uninitialized(_))
        ));
    }

    #[test]
    fn assign_checks_names_and_lengths() {
        let graph = build_graph();
        let runtime = Arc::new(Runtime::new());
        let session = runtime.connect("m", graph.clone(), SessionConfig::default());

        assert!(matches!(
            session.assign("missing", TensorValue::new(DType::F64, vec![1.0])),
            Err(SessionErr::UnknownVariable(_))
        ));
        assert!(matches!(
            session.assign("global", TensorValue::new(DType::F64, vec![1.0])),
            Err(SessionErr::LengthMismatch { .. })
        ));
    }

    #[test]
    fn assign_casts_into_variable_dtype() {
        let graph = Graph::new();
        graph
            .variable(
                "half",
                DType::F32,
                &[1],
                Collection::Global,
                Arc::new(ConstInit::new(0.0)),
            )
            .unwrap();
        let graph = Arc::new(graph);

        let runtime = Arc::new(Runtime::new());
        let session = runtime.connect("m", graph, SessionConfig::default());
        session
            .assign("half", TensorValue::new(DType::F64, vec![0.1]))
            .unwrap();

        assert_eq!(session.fetch("half").unwrap().data(), &[0.1f32 as f64]);
    }

    #[test]
    fn locked_and_unlocked_updates_agree_single_threaded() {
        for use_locking in [false, true] {
            let graph = build_graph();
            let var = graph.variable_by_name("global").unwrap();
            let op = graph
                .add_op(
                    "apply_gradient_descent",
                    vec![
                        ("var".to_string(), Input::Var(var)),
                        (
                            "grad".to_string(),
                            Input::Tensor(TensorValue::new(DType::F64, vec![1.0, 2.0])),
                        ),
                    ],
                    vec![
                        ("lr".to_string(), AttrValue::Float(0.5)),
                        ("use_locking".to_string(), AttrValue::Bool(use_locking)),
                    ],
                )
                .unwrap();

            let runtime = Arc::new(Runtime::new());
            let session = runtime.connect("m", graph, SessionConfig::default());
            session
                .assign("global", TensorValue::new(DType::F64, vec![1.0, 1.0]))
                .unwrap();

            session.run(op, &FeedMap::new()).unwrap();
            assert_eq!(session.fetch("global").unwrap().data(), &[0.5, 0.0]);
        }
    }

    #[test]
    fn updating_an_uninitialized_variable_fails() {
        let graph = build_graph();
        let var = graph.variable_by_name("global").unwrap();
        let op = graph
            .add_op(
                "apply_gradient_descent",
                vec![
                    ("var".to_string(), Input::Var(var)),
                    (
                        "grad".to_string(),
                        Input::Tensor(TensorValue::new(DType::F64, vec![1.0, 2.0])),
                    ),
                ],
                vec![
                    ("lr".to_string(), AttrValue::Float(0.5)),
                    ("use_locking".to_string(), AttrValue::Bool(false)),
                ],
            )
            .unwrap();

        let runtime = Arc::new(Runtime::new());
        let session = runtime.connect("m", graph, SessionConfig::default());

        assert!(matches!(
            session.run(op, &FeedMap::new()),
            Err(SessionErr::Uninitialized(name)) if name == "global"
        ));
    }

    #[test]
    fn unknown_op_kinds_are_rejected() {
        let graph = build_graph();
        let op = graph.add_op("frobnicate", vec![], vec![]).unwrap();

        let runtime = Arc::new(Runtime::new());
        let session = runtime.connect("m", graph, SessionConfig::default());

        assert!(matches!(
            session.run(op, &FeedMap::new()),
            Err(SessionErr::UnsupportedOp(kind)) if kind == "frobnicate"
        ));
    }
}
