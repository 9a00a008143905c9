use std::{sync::Arc, time::Duration};

use log::info;

use crate::{
    graph::Graph,
    runtime::{Runtime, Session, SessionConfig},
};

use super::{
    Result, SessionCreator,
    manager::SessionManager,
    scaffold::{BuiltScaffold, Scaffold},
};

/// How long a worker waits for the chief before giving up.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(30 * 60);

/// Creates sessions for processes that must not initialize anything.
///
/// A worker only polls readiness; initialization is the chief's job. The
/// wait is bounded by `max_wait` and cancellable only by its expiry.
pub struct WorkerSessionCreator {
    runtime: Arc<Runtime>,
    graph: Arc<Graph>,
    master: String,
    scaffold: Scaffold,
    built: Option<Arc<BuiltScaffold>>,
    manager: Option<SessionManager>,
    config: SessionConfig,
    max_wait: Duration,
}

impl WorkerSessionCreator {
    /// Creates a new `WorkerSessionCreator`.
    ///
    /// # Arguments
    /// * `runtime` - The execution substrate endpoint.
    /// * `graph` - The graph sessions execute ops of.
    /// * `master` - The runtime target address.
    /// * `scaffold` - The supportive ops; unset fields get defaults.
    ///
    /// # Returns
    /// A new `WorkerSessionCreator` instance.
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
            max_wait: DEFAULT_MAX_WAIT,
        }
    }

    /// Sets the runtime-level session options.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides how long the worker waits for readiness.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
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

impl SessionCreator for WorkerSessionCreator {
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

        info!(master = self.master.as_str(); "worker waiting for session");

        let session = manager.wait_for_session(&self.master, &self.config, self.max_wait)?;
        Ok(Box::new(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bootstrap::BootstrapErr,
        graph::{Collection, DType},
        initialization::ConstInit,
    };

    #[test]
    fn worker_times_out_without_a_chief() {
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
        let runtime = Arc::new(Runtime::new());

        let mut creator =
            WorkerSessionCreator::new(runtime, Arc::new(graph), "worker", Scaffold::new())
                .with_max_wait(Duration::ZERO);

        let err = creator.create_session().map(|_| ()).unwrap_err();
        assert!(matches!(err, BootstrapErr::WaitTimeout { .. }));
    }
}
