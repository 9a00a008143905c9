use std::{sync::Arc, time::Duration};

use log::{debug, info};

use crate::{
    coordination::{Coordinator, SessionHook},
    graph::{Graph, OpHandle, TensorValue},
    runtime::{FeedMap, Fetch, Session, SessionErr},
};

use super::{Result, SessionCreator};

/// How long a closing coordinated session waits for tracked threads.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(120);

/// Wraps another creator to attach a coordinator and lifecycle hooks.
///
/// Every created session gets its own fresh [`Coordinator`], so stopping
/// one session never poisons the next. Hooks are notified exactly once per
/// created session, after the delegate session exists.
pub struct CoordinatedSessionCreator {
    inner: Box<dyn SessionCreator>,
    hooks: Vec<Arc<dyn SessionHook>>,
    stop_grace: Duration,
}

impl CoordinatedSessionCreator {
    /// Creates a new `CoordinatedSessionCreator`.
    ///
    /// # Arguments
    /// * `inner` - The creator producing the underlying sessions.
    /// * `hooks` - Observers of session lifecycle and op execution.
    ///
    /// # Returns
    /// A new `CoordinatedSessionCreator` instance.
    pub fn new(inner: Box<dyn SessionCreator>, hooks: Vec<Arc<dyn SessionHook>>) -> Self {
        Self {
            inner,
            hooks,
            stop_grace: DEFAULT_STOP_GRACE,
        }
    }

    /// Overrides how long `close` waits for tracked threads to exit.
    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }
}

impl SessionCreator for CoordinatedSessionCreator {
    fn create_session(&mut self) -> Result<Box<dyn Session>> {
        let session = self.inner.create_session()?;
        let coordinator = Arc::new(Coordinator::new());

        for hook in &self.hooks {
            hook.after_session_creation(session.as_ref(), &coordinator);
        }

        info!(hooks = self.hooks.len() as u64; "coordinated session created");

        Ok(Box::new(CoordinatedSession {
            inner: session,
            hooks: self.hooks.clone(),
            coordinator,
            stop_grace: self.stop_grace,
        }))
    }
}

/// A session that routes op runs through hooks and owns a coordinator.
pub struct CoordinatedSession {
    inner: Box<dyn Session>,
    hooks: Vec<Arc<dyn SessionHook>>,
    coordinator: Arc<Coordinator>,
    stop_grace: Duration,
}

impl CoordinatedSession {
    /// Returns the coordinator bound to this session.
    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }
}

impl Session for CoordinatedSession {
    fn run(&self, op: OpHandle, feeds: &FeedMap) -> std::result::Result<Fetch, SessionErr> {
        for hook in &self.hooks {
            hook.before_run(op);
        }

        let fetch = self.inner.run(op, feeds)?;

        for hook in &self.hooks {
            hook.after_run(op, &fetch);
        }

        Ok(fetch)
    }

    fn fetch(&self, variable: &str) -> std::result::Result<TensorValue, SessionErr> {
        self.inner.fetch(variable)
    }

    fn assign(
        &self,
        variable: &str,
        value: TensorValue,
    ) -> std::result::Result<(), SessionErr> {
        self.inner.assign(variable, value)
    }

    fn master(&self) -> &str {
        self.inner.master()
    }

    fn graph(&self) -> &Arc<Graph> {
        self.inner.graph()
    }

    /// Stops tracked threads before releasing the underlying session.
    fn close(&mut self) -> std::result::Result<(), SessionErr> {
        debug!("closing coordinated session");

        self.coordinator
            .join(self.stop_grace)
            .map_err(|e| SessionErr::Coordination(e.to_string()))?;

        self.inner.close()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
    };

    use super::*;
    use crate::{
        bootstrap::{ChiefSessionCreator, Scaffold},
        graph::{Collection, DType},
        initialization::ConstInit,
        runtime::Runtime,
    };

    #[derive(Default)]
    struct CountingHook {
        creations: AtomicUsize,
        before: AtomicUsize,
        after: AtomicUsize,
    }

    impl SessionHook for CountingHook {
        fn after_session_creation(&self, _session: &dyn Session, _coordinator: &Coordinator) {
            self.creations.fetch_add(1, Ordering::SeqCst);
        }

        fn before_run(&self, _op: OpHandle) {
            self.before.fetch_add(1, Ordering::SeqCst);
        }

        fn after_run(&self, _op: OpHandle, _fetch: &Fetch) {
            self.after.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// A chief creator over a one-variable graph, plus a probe op added
    /// before the scaffold finalizes the graph.
    fn chief_creator() -> (Box<dyn SessionCreator>, OpHandle) {
        let graph = Graph::new();
        graph
            .variable(
                "w",
                DType::F64,
                &[1],
                Collection::Global,
                Arc::new(ConstInit::new(2.0)),
            )
            .unwrap();
        let probe = graph.add_op("no_op", vec![], vec![]).unwrap();
        let graph = Arc::new(graph);
        let runtime = Arc::new(Runtime::new());

        (
            Box::new(ChiefSessionCreator::new(
                runtime,
                graph,
                "chief",
                Scaffold::new(),
            )),
            probe,
        )
    }

    #[test]
    fn hooks_fire_once_per_creation_and_on_every_run() {
        let (inner, probe) = chief_creator();
        let hook = Arc::new(CountingHook::default());
        let mut creator = CoordinatedSessionCreator::new(inner, vec![hook.clone()]);

        let session = creator.create_session().unwrap();
        assert_eq!(hook.creations.load(Ordering::SeqCst), 1);

        session.run(probe, &FeedMap::new()).unwrap();
        session.run(probe, &FeedMap::new()).unwrap();

        assert_eq!(hook.before.load(Ordering::SeqCst), 2);
        assert_eq!(hook.after.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn each_session_gets_a_fresh_coordinator() {
        struct CaptureHook(parking_lot::Mutex<Vec<bool>>);

        impl SessionHook for CaptureHook {
            fn after_session_creation(&self, _session: &dyn Session, coordinator: &Coordinator) {
                self.0.lock().push(coordinator.should_stop());
                coordinator.request_stop();
            }
        }

        let (inner, _probe) = chief_creator();
        let hook = Arc::new(CaptureHook(parking_lot::Mutex::new(Vec::new())));
        let mut creator = CoordinatedSessionCreator::new(inner, vec![hook.clone()]);

        creator.create_session().unwrap();
        creator.create_session().unwrap();

        // Each session started with a cleared flag despite the stop above.
        assert_eq!(&*hook.0.lock(), &[false, false]);
    }

    #[test]
    fn close_joins_registered_threads() {
        struct SpawningHook;

        impl SessionHook for SpawningHook {
            fn after_session_creation(&self, _session: &dyn Session, coordinator: &Coordinator) {
                coordinator
                    .register(thread::spawn(|| thread::sleep(Duration::from_millis(5))));
            }
        }

        let (inner, _probe) = chief_creator();
        let mut creator = CoordinatedSessionCreator::new(inner, vec![Arc::new(SpawningHook)])
            .with_stop_grace(Duration::from_secs(2));

        let mut session = creator.create_session().unwrap();
        session.close().unwrap();
    }
}
