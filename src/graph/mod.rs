//! The op-construction side of the execution substrate.
//!
//! A [`Graph`] holds variable declarations and ops built through a generic
//! string-keyed op builder. Sessions created against a runtime interpret the
//! ops; the graph itself never executes anything.

mod tensor;

pub use tensor::{DType, TensorValue};

use std::{
    error::Error,
    fmt::{self, Display},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use parking_lot::RwLock;

use crate::initialization::Initializer;

/// The graph module's result type.
pub type Result<T> = std::result::Result<T, GraphErr>;

/// Graph construction failures.
#[derive(Debug)]
pub enum GraphErr {
    /// The graph was finalized and no longer accepts structural mutation.
    Finalized,
    /// A variable with the same name already exists.
    DuplicateVariable(String),
}

impl Display for GraphErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphErr::Finalized => {
                f.write_str("graph is finalized and cannot accept new variables or ops")
            }
            GraphErr::DuplicateVariable(name) => {
                write!(f, "a variable named {name:?} already exists in the graph")
            }
        }
    }
}

impl Error for GraphErr {}

/// Which initialization pass owns a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// Initialized by the primary init op, normally driven by the chief.
    Global,
    /// Initialized by the local-init op of each participating process.
    Local,
}

/// A cheap handle to a named, typed, shaped variable declared in a graph.
///
/// The value itself lives in the runtime's per-master store; optimizers and
/// slots reference variables, they never own them.
#[derive(Debug, Clone)]
pub struct VariableRef {
    id: usize,
    name: Arc<str>,
    dtype: DType,
    shape: Arc<[usize]>,
    collection: Collection,
}

impl VariableRef {
    /// Returns the graph-unique identity of this variable.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the variable's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the element type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the declared shape.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns which initialization pass owns this variable.
    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Returns the total number of elements.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Returns whether the variable holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the size of the leading dimension. Scalars count as one row.
    pub fn rows(&self) -> usize {
        self.shape.first().copied().unwrap_or(1)
    }

    /// Returns the number of elements per row of the leading dimension.
    pub fn row_size(&self) -> usize {
        self.shape.iter().skip(1).product()
    }
}

/// A named op input.
#[derive(Debug, Clone)]
pub enum Input {
    /// A variable mutated or read by the op.
    Var(VariableRef),
    /// An immediate tensor value, e.g. a gradient.
    Tensor(TensorValue),
    /// Row indices for sparse ops.
    Indices(Vec<usize>),
}

/// A named op attribute.
#[derive(Debug, Clone)]
pub enum AttrValue {
    Float(f64),
    Bool(bool),
    Str(String),
}

/// An op recorded in the graph, interpreted later by a session.
#[derive(Debug, Clone)]
pub struct Op {
    kind: String,
    inputs: Vec<(String, Input)>,
    attrs: Vec<(String, AttrValue)>,
}

impl Op {
    /// Returns the op-type string.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Looks up a named input.
    ///
    /// # Arguments
    /// * `name` - The input name.
    ///
    /// # Returns
    /// The input if present.
    pub fn input(&self, name: &str) -> Option<&Input> {
        self.inputs
            .iter()
            .find(|(input, _)| input == name)
            .map(|(_, value)| value)
    }

    /// Looks up a named attribute.
    ///
    /// # Arguments
    /// * `name` - The attribute name.
    ///
    /// # Returns
    /// The attribute if present.
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value)
    }
}

/// An opaque handle to an op added to a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpHandle(usize);

impl OpHandle {
    /// Returns the position of the op inside its graph.
    pub fn index(&self) -> usize {
        self.0
    }
}

struct VariableDef {
    reference: VariableRef,
    initializer: Arc<dyn Initializer>,
}

#[derive(Default)]
struct GraphInner {
    variables: Vec<VariableDef>,
    ops: Vec<Op>,
}

/// A computation graph under construction.
///
/// Structural mutation is rejected once [`Graph::finalize`] runs, which the
/// scaffold does when it builds; this prevents races between graph
/// construction and session creation.
pub struct Graph {
    inner: RwLock<GraphInner>,
    finalized: AtomicBool,
}

impl Graph {
    /// Creates a new, empty graph.
    ///
    /// # Returns
    /// A new `Graph` instance.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(GraphInner::default()),
            finalized: AtomicBool::new(false),
        }
    }

    /// Declares a variable in the graph.
    ///
    /// # Arguments
    /// * `name` - A graph-unique variable name.
    /// * `dtype` - The element type.
    /// * `shape` - The variable's shape.
    /// * `collection` - Which initialization pass owns the variable.
    /// * `initializer` - Generates the variable's initial values.
    ///
    /// # Returns
    /// A handle to the declared variable, or an error if the graph is
    /// finalized or the name is taken.
    pub fn variable(
        &self,
        name: &str,
        dtype: DType,
        shape: &[usize],
        collection: Collection,
        initializer: Arc<dyn Initializer>,
    ) -> Result<VariableRef> {
        if self.is_finalized() {
            return Err(GraphErr::Finalized);
        }

        let mut inner = self.inner.write();

        if inner.variables.iter().any(|v| &*v.reference.name == name) {
            return Err(GraphErr::DuplicateVariable(name.to_string()));
        }

        let reference = VariableRef {
            id: inner.variables.len(),
            name: Arc::from(name),
            dtype,
            shape: Arc::from(shape),
            collection,
        };

        inner.variables.push(VariableDef {
            reference: reference.clone(),
            initializer,
        });

        Ok(reference)
    }

    /// Adds an op to the graph.
    ///
    /// # Arguments
    /// * `kind` - The op-type string.
    /// * `inputs` - Named inputs.
    /// * `attrs` - Named attributes.
    ///
    /// # Returns
    /// A handle to the op, or an error if the graph is finalized.
    pub fn add_op(
        &self,
        kind: &str,
        inputs: Vec<(String, Input)>,
        attrs: Vec<(String, AttrValue)>,
    ) -> Result<OpHandle> {
        if self.is_finalized() {
            return Err(GraphErr::Finalized);
        }

        let mut inner = self.inner.write();
        let handle = OpHandle(inner.ops.len());

        inner.ops.push(Op {
            kind: kind.to_string(),
            inputs,
            attrs,
        });

        Ok(handle)
    }

    /// Freezes the graph against further structural mutation.
    pub fn finalize(&self) {
        self.finalized.store(true, Ordering::SeqCst);
    }

    /// Returns whether the graph is frozen.
    pub fn is_finalized(&self) -> bool {
        self.finalized.load(Ordering::SeqCst)
    }

    /// Returns handles to every declared variable.
    pub fn variables(&self) -> Vec<VariableRef> {
        self.inner
            .read()
            .variables
            .iter()
            .map(|v| v.reference.clone())
            .collect()
    }

    /// Looks up a variable by name.
    ///
    /// # Arguments
    /// * `name` - The variable name.
    ///
    /// # Returns
    /// The variable's handle if declared.
    pub fn variable_by_name(&self, name: &str) -> Option<VariableRef> {
        self.inner
            .read()
            .variables
            .iter()
            .find(|v| &*v.reference.name == name)
            .map(|v| v.reference.clone())
    }

    /// Returns every variable of `collection` paired with its initializer.
    /// `None` selects all collections.
    pub(crate) fn variables_with_init(
        &self,
        collection: Option<Collection>,
    ) -> Vec<(VariableRef, Arc<dyn Initializer>)> {
        self.inner
            .read()
            .variables
            .iter()
            .filter(|v| collection.is_none_or(|c| v.reference.collection == c))
            .map(|v| (v.reference.clone(), v.initializer.clone()))
            .collect()
    }

    /// Fetches a snapshot of an op by handle.
    pub(crate) fn op(&self, handle: OpHandle) -> Option<Op> {
        self.inner.read().ops.get(handle.0).cloned()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
