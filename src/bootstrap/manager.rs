use std::{
    path::PathBuf,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use log::{debug, info, warn};

use crate::{
    checkpoint::Saver,
    graph::{Graph, OpHandle},
    runtime::{FeedMap, Fetch, Runtime, RuntimeSession, Session, SessionConfig},
};

use super::{BootstrapErr, Result, scaffold::InitFn};

/// First readiness-poll sleep; doubles per retry up to [`POLL_CAP`].
const POLL_BASE: Duration = Duration::from_millis(20);
const POLL_CAP: Duration = Duration::from_secs(1);

/// How long `prepare_session` keeps polling readiness after driving
/// initialization before giving up.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Where to look for a checkpoint during session preparation or recovery.
#[derive(Debug, Clone)]
pub enum CheckpointTarget {
    /// An exact checkpoint file; restore failure is fatal.
    File(PathBuf),
    /// The newest checkpoint in a directory; an empty directory falls back
    /// to running the init op.
    LatestIn(PathBuf),
}

/// The session recovery/readiness state machine.
///
/// Bound to one graph and its readiness ops; holds no session identity
/// itself, every entry point creates and returns a fresh session. Polling
/// is blocking and cancellable only by timeout expiry.
pub struct SessionManager {
    runtime: Arc<Runtime>,
    graph: Arc<Graph>,
    ready_op: OpHandle,
    ready_for_local_init_op: OpHandle,
    local_init_op: OpHandle,
    ready_timeout: Duration,
}

impl SessionManager {
    /// Creates a new `SessionManager`.
    ///
    /// # Arguments
    /// * `runtime` - The execution substrate endpoint.
    /// * `graph` - The graph sessions execute ops of.
    /// * `ready_op` - Probes overall readiness; an empty fetch means ready.
    /// * `ready_for_local_init_op` - Probes whether local init may run.
    /// * `local_init_op` - Initializes process-local state.
    ///
    /// # Returns
    /// A new `SessionManager` instance.
    pub fn new(
        runtime: Arc<Runtime>,
        graph: Arc<Graph>,
        ready_op: OpHandle,
        ready_for_local_init_op: OpHandle,
        local_init_op: OpHandle,
    ) -> Self {
        Self {
            runtime,
            graph,
            ready_op,
            ready_for_local_init_op,
            local_init_op,
            ready_timeout: DEFAULT_READY_TIMEOUT,
        }
    }

    /// Overrides how long `prepare_session` polls readiness after init.
    ///
    /// # Arguments
    /// * `timeout` - The poll ceiling.
    ///
    /// # Returns
    /// Self, for chaining.
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    /// Actively brings a session to a ready state.
    ///
    /// Creates a session against `master`, restores from a checkpoint when
    /// one resolves, otherwise runs `init_op` with `init_feed` and invokes
    /// `init_fn`, then runs the local-init gate and polls readiness. This
    /// path never waits for another process to initialize.
    ///
    /// # Arguments
    /// * `master` - The runtime target address.
    /// * `saver` - Restores checkpoints; required when `checkpoint` is set.
    /// * `checkpoint` - Where to look for a checkpoint, if anywhere.
    /// * `config` - Runtime-level session options.
    /// * `init_op` - The primary init op, skipped after a restore.
    /// * `init_feed` - Values fed into the init op run.
    /// * `init_fn` - Callback invoked with the session on the init path.
    ///
    /// # Returns
    /// A ready session, or a `Preparation` error carrying the last observed
    /// not-ready reason.
    #[allow(clippy::too_many_arguments)]
    pub fn prepare_session(
        &self,
        master: &str,
        saver: Option<&Saver>,
        checkpoint: Option<&CheckpointTarget>,
        config: &SessionConfig,
        init_op: Option<OpHandle>,
        init_feed: &FeedMap,
        init_fn: Option<&InitFn>,
    ) -> Result<RuntimeSession> {
        let session = self.runtime.connect(master, self.graph.clone(), config.clone());
        let restored = self.try_restore(&session, saver, checkpoint)?;

        if !restored {
            if let Some(op) = init_op {
                debug!(master; "running init op");
                session.run(op, init_feed)?;
            }
            if let Some(init_fn) = init_fn {
                init_fn(&session).map_err(BootstrapErr::Session)?;
            }
        }

        self.try_local_init(&session)?;

        let deadline = Instant::now() + self.ready_timeout;
        let mut backoff = POLL_BASE;

        loop {
            match self.check_ready(&session)? {
                None => {
                    info!(master; "session prepared and ready");
                    return Ok(session);
                }
                Some(reason) => {
                    if Instant::now() >= deadline {
                        return Err(BootstrapErr::Preparation {
                            master: master.to_string(),
                            reason,
                        });
                    }
                    debug!(master, reason = reason.as_str(); "session not ready yet");
                }
            }

            thread::sleep(backoff);
            backoff = (backoff * 2).min(POLL_CAP);
        }
    }

    /// Passively waits for a session to become ready.
    ///
    /// Creates a session against `master` and polls the ready op with
    /// bounded backoff, never running any init op itself; readiness must be
    /// established elsewhere, normally by a chief. The deadline is checked
    /// before every sleep, so a zero `max_wait` fails after a single probe.
    ///
    /// # Arguments
    /// * `master` - The runtime target address.
    /// * `config` - Runtime-level session options.
    /// * `max_wait` - The wait ceiling.
    ///
    /// # Returns
    /// A ready session, or a `WaitTimeout` error carrying the last observed
    /// not-ready reason.
    pub fn wait_for_session(
        &self,
        master: &str,
        config: &SessionConfig,
        max_wait: Duration,
    ) -> Result<RuntimeSession> {
        let start = Instant::now();
        let deadline = start + max_wait;
        let session = self.runtime.connect(master, self.graph.clone(), config.clone());
        let mut backoff = POLL_BASE;

        loop {
            // Probe errors count as "not ready" here; a waiting worker keeps
            // retrying until its ceiling rather than failing fast.
            let not_ready = match self.check_ready(&session) {
                Ok(None) => None,
                Ok(Some(reason)) => Some(reason),
                Err(e) => Some(e.to_string()),
            };

            let Some(reason) = not_ready else {
                info!(master, waited = start.elapsed().as_millis() as u64; "session became ready");
                return Ok(session);
            };

            if let Err(e) = self.try_local_init(&session) {
                warn!(master; "local init attempt failed: {e}");
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(BootstrapErr::WaitTimeout {
                    master: master.to_string(),
                    waited: start.elapsed(),
                    reason,
                });
            }

            debug!(master, reason = reason.as_str(); "still waiting for session");
            thread::sleep(backoff.min(deadline - now));
            backoff = (backoff * 2).min(POLL_CAP);
        }
    }

    /// Restores a session from a checkpoint without falling back to init.
    ///
    /// # Arguments
    /// * `master` - The runtime target address.
    /// * `saver` - Restores checkpoints; required when `checkpoint` is set.
    /// * `checkpoint` - Where to look for a checkpoint, if anywhere.
    /// * `config` - Runtime-level session options.
    ///
    /// # Returns
    /// The session and whether it reached readiness; `(session, false)`
    /// when no checkpoint resolved or the model is still not ready.
    pub fn recover_session(
        &self,
        master: &str,
        saver: Option<&Saver>,
        checkpoint: Option<&CheckpointTarget>,
        config: &SessionConfig,
    ) -> Result<(RuntimeSession, bool)> {
        let session = self.runtime.connect(master, self.graph.clone(), config.clone());

        if !self.try_restore(&session, saver, checkpoint)? {
            return Ok((session, false));
        }

        self.try_local_init(&session)?;
        let ready = self.check_ready(&session)?.is_none();
        Ok((session, ready))
    }

    /// Attempts a restore; returns whether one happened.
    fn try_restore(
        &self,
        session: &RuntimeSession,
        saver: Option<&Saver>,
        checkpoint: Option<&CheckpointTarget>,
    ) -> Result<bool> {
        let (Some(saver), Some(checkpoint)) = (saver, checkpoint) else {
            return Ok(false);
        };

        let path = match checkpoint {
            CheckpointTarget::File(path) => path.clone(),
            CheckpointTarget::LatestIn(dir) => {
                match saver.latest_checkpoint(dir).map_err(BootstrapErr::Restore)? {
                    Some(path) => path,
                    None => {
                        debug!(dir = dir.display().to_string().as_str(); "no checkpoint found, falling back to init");
                        return Ok(false);
                    }
                }
            }
        };

        saver
            .restore(session, &path)
            .map_err(BootstrapErr::Restore)?;
        info!(path = path.display().to_string().as_str(); "session restored from checkpoint");
        Ok(true)
    }

    /// Runs the local-init op once its gate reports clean.
    fn try_local_init(&self, session: &RuntimeSession) -> Result<()> {
        let gate = session.run(self.ready_for_local_init_op, &FeedMap::new())?;

        if gate.is_empty() {
            session.run(self.local_init_op, &FeedMap::new())?;
        } else {
            debug!("not ready for local init yet");
        }

        Ok(())
    }

    /// Probes readiness; `None` means ready, `Some` carries the reason.
    fn check_ready(&self, session: &RuntimeSession) -> Result<Option<String>> {
        match session.run(self.ready_op, &FeedMap::new())? {
            Fetch::None => Ok(None),
            Fetch::Names(names) if names.is_empty() => Ok(None),
            Fetch::Names(names) => Ok(Some(format!(
                "variables not initialized: {}",
                names.join(", ")
            ))),
        }
    }
}
