use std::sync::Arc;

use log::debug;

use crate::{
    checkpoint::Saver,
    graph::{AttrValue, Graph, OpHandle},
    runtime::{FeedMap, Session, SessionErr},
};

use super::Result;

/// Callback invoked with the freshly created session, instead of or in
/// addition to running the init op.
pub type InitFn = dyn Fn(&dyn Session) -> std::result::Result<(), SessionErr> + Send + Sync;

/// Declares the supportive ops needed to bring a session to a usable state.
///
/// Any op left unset is resolved to a graph-derived default when the
/// scaffold is built.
#[derive(Default)]
pub struct Scaffold {
    init_op: Option<OpHandle>,
    ready_op: Option<OpHandle>,
    ready_for_local_init_op: Option<OpHandle>,
    local_init_op: Option<OpHandle>,
    saver: Option<Arc<Saver>>,
    init_feed: FeedMap,
    init_fn: Option<Arc<InitFn>>,
}

impl Scaffold {
    /// Creates a new `Scaffold` with every op unset.
    ///
    /// # Returns
    /// A new `Scaffold` instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the op that initializes global state.
    pub fn with_init_op(mut self, op: OpHandle) -> Self {
        self.init_op = Some(op);
        self
    }

    /// Overrides the op probing overall readiness.
    pub fn with_ready_op(mut self, op: OpHandle) -> Self {
        self.ready_op = Some(op);
        self
    }

    /// Overrides the op probing whether local init may run.
    pub fn with_ready_for_local_init_op(mut self, op: OpHandle) -> Self {
        self.ready_for_local_init_op = Some(op);
        self
    }

    /// Overrides the op that initializes process-local state.
    pub fn with_local_init_op(mut self, op: OpHandle) -> Self {
        self.local_init_op = Some(op);
        self
    }

    /// Overrides the saver used for checkpoint restore.
    pub fn with_saver(mut self, saver: Arc<Saver>) -> Self {
        self.saver = Some(saver);
        self
    }

    /// Sets the feed map passed to the init op run.
    pub fn with_init_feed(mut self, feed: FeedMap) -> Self {
        self.init_feed = feed;
        self
    }

    /// Sets the callback invoked with the new session on the init path.
    pub fn with_init_fn(mut self, init_fn: Arc<InitFn>) -> Self {
        self.init_fn = Some(init_fn);
        self
    }

    /// Resolves defaults for every unset op and freezes the graph.
    ///
    /// Finalizing prevents races between further graph construction and
    /// session creation; after `build` the graph rejects new variables and
    /// ops. The scaffold itself is left intact, so a failed build can be
    /// retried without losing explicitly supplied ops.
    ///
    /// # Arguments
    /// * `graph` - The graph to derive defaults from.
    ///
    /// # Returns
    /// An immutable snapshot of the resolved scaffold.
    pub fn build(&self, graph: &Graph) -> Result<BuiltScaffold> {
        let init_op = match self.init_op {
            Some(op) => op,
            None => graph.add_op("init_vars", vec![], vec![collection("global")])?,
        };

        let ready_op = match self.ready_op {
            Some(op) => op,
            None => graph.add_op("report_uninitialized", vec![], vec![collection("all")])?,
        };

        let ready_for_local_init_op = match self.ready_for_local_init_op {
            Some(op) => op,
            None => graph.add_op("report_uninitialized", vec![], vec![collection("global")])?,
        };

        let local_init_op = match self.local_init_op {
            Some(op) => op,
            None => graph.add_op("init_vars", vec![], vec![collection("local")])?,
        };

        let saver = self.saver.clone().unwrap_or_default();

        graph.finalize();
        debug!("scaffold built, graph finalized");

        Ok(BuiltScaffold {
            init_op,
            ready_op,
            ready_for_local_init_op,
            local_init_op,
            saver,
            init_feed: self.init_feed.clone(),
            init_fn: self.init_fn.clone(),
        })
    }
}

fn collection(name: &str) -> (String, AttrValue) {
    ("collection".to_string(), AttrValue::Str(name.to_string()))
}

/// The immutable result of building a [`Scaffold`].
pub struct BuiltScaffold {
    pub init_op: OpHandle,
    pub ready_op: OpHandle,
    pub ready_for_local_init_op: OpHandle,
    pub local_init_op: OpHandle,
    pub saver: Arc<Saver>,
    pub init_feed: FeedMap,
    pub init_fn: Option<Arc<InitFn>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graph::{Collection, DType, GraphErr},
        initialization::ConstInit,
    };

    #[test]
    fn build_resolves_defaults_and_finalizes() {
        let graph = Graph::new();
        graph
            .variable(
                "w",
                DType::F64,
                &[1],
                Collection::Global,
                Arc::new(ConstInit::new(0.0)),
            )
            .unwrap();

        let built = Scaffold::new().build(&graph).unwrap();

        assert!(graph.is_finalized());
        assert_ne!(built.init_op, built.ready_op);
        assert_ne!(built.ready_op, built.ready_for_local_init_op);

        // The frozen graph rejects further construction.
        assert!(matches!(
            graph.add_op("no_op", vec![], vec![]),
            Err(GraphErr::Finalized)
        ));
    }

    #[test]
    fn explicit_ops_are_kept() {
        let graph = Graph::new();
        let init = graph.add_op("init_vars", vec![], vec![]).unwrap();

        let built = Scaffold::new().with_init_op(init).build(&graph).unwrap();
        assert_eq!(built.init_op, init);
    }

    #[test]
    fn explicit_ops_survive_a_failed_build() {
        let graph = Graph::new();
        let init = graph.add_op("init_vars", vec![], vec![]).unwrap();
        let scaffold = Scaffold::new().with_init_op(init);

        // Resolving the unset ops needs graph mutation, so a frozen graph
        // makes the build fail; the scaffold must stay usable afterwards.
        let frozen = Graph::new();
        frozen.finalize();
        assert!(scaffold.build(&frozen).is_err());

        let built = scaffold.build(&graph).unwrap();
        assert_eq!(built.init_op, init);
    }

    #[test]
    fn build_fails_on_a_finalized_graph() {
        let graph = Graph::new();
        graph.finalize();

        assert!(matches!(
            Scaffold::new().build(&graph),
            Err(super::super::BootstrapErr::Graph(GraphErr::Finalized))
        ));
    }
}
