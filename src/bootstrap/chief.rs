use std::sync::Arc;

use log::info;

use crate::{
    graph::Graph,
    runtime::{Runtime, Session, SessionConfig},
};

use super::{
    Result, SessionCreator,
    manager::{CheckpointTarget, SessionManager},
    scaffold::{BuiltScaffold, Scaffold},
};

/// Creates sessions for the process responsible for initialization.
///
/// A chief restores from a checkpoint when one resolves and runs the init
/// ops otherwise; it never waits for another process. The scaffold is built
/// on the first `create_session` call, which also finalizes the graph, so
/// later calls reuse the same resolved ops.
pub struct ChiefSessionCreator {
    runtime: Arc<Runtime>,
    graph: Arc<Graph>,
    master: String,
    scaffold: Scaffold,
    built: Option<Arc<BuiltScaffold>>,
    manager: Option<SessionManager>,
    config: SessionConfig,
    checkpoint: Option<CheckpointTarget>,
}

impl ChiefSessionCreator {
    /// Creates a new `ChiefSessionCreator`.
    ///
    /// # Arguments
    /// * `runtime` - The execution substrate endpoint.
    /// * `graph` - The graph sessions execute ops of.
    /// * `master` - The runtime target address.
    /// * `scaffold` - The supportive ops; unset fields get defaults.
    ///
    /// # Returns
    /// A new `ChiefSessionCreator` instance.
    pub fn new(
        runtime: Arc<Runtime>,
        graph: Arc<Graph>,
        master: impl Into<String>,
        scaffold: Scaffold,
    ) -> Self {
        Self {
            runtime,
            graph,
            master: master.into(),
            scaffold,
            built: None,
            manager: None,
            config: SessionConfig::default(),
            checkpoint: None,
        }
    }

    /// Sets the runtime-level session options.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets where to look for a checkpoint before falling back to init.
    pub fn with_checkpoint(mut self, checkpoint: CheckpointTarget) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    fn built(&mut self) -> Result<Arc<BuiltScaffold>> {
        if let Some(built) = &self.built {
            return Ok(built.clone());
        }

        let built = Arc::new(self.scaffold.build(&self.graph)?);
        self.built = Some(built.clone());
        Ok(built)
    }
}

impl SessionCreator for ChiefSessionCreator {
    fn create_session(&mut self) -> Result<Box<dyn Session>> {
        let built = self.built()?;
        let runtime = self.runtime.clone();
        let graph = self.graph.clone();

        let manager = self.manager.get_or_insert_with(|| {
            SessionManager::new(
                runtime,
                graph,
                built.ready_op,
                built.ready_for_local_init_op,
                built.local_init_op,
            )
        });

        info!(master = self.master.as_str(); "chief creating session");

        let session = manager.prepare_session(
            &self.master,
            Some(&*built.saver),
            self.checkpoint.as_ref(),
            &self.config,
            Some(built.init_op),
            &built.init_feed,
            built.init_fn.as_deref(),
        )?;

        Ok(Box::new(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graph::{Collection, DType},
        initialization::ConstInit,
    };

    #[test]
    fn repeated_creation_reuses_the_built_scaffold() {
        let graph = Graph::new();
        graph
            .variable(
                "w",
                DType::F64,
                &[1],
                Collection::Global,
                Arc::new(ConstInit::new(3.0)),
            )
            .unwrap();
        let graph = Arc::new(graph);
        let runtime = Arc::new(Runtime::new());

        let mut creator =
            ChiefSessionCreator::new(runtime, graph.clone(), "chief", Scaffold::new());

        let first = creator.create_session().unwrap();
        assert_eq!(first.fetch("w").unwrap().data(), &[3.0]);
        assert!(graph.is_finalized());

        // The second call must not try to add default ops again.
        let second = creator.create_session().unwrap();
        assert_eq!(second.fetch("w").unwrap().data(), &[3.0]);
    }
}
