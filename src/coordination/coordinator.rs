use std::{
    error::Error,
    fmt::{self, Display},
    sync::atomic::{AtomicBool, Ordering},
    thread::JoinHandle,
    time::{Duration, Instant},
};

use log::{debug, warn};
use parking_lot::Mutex;

/// How often the grace-period join re-checks tracked threads.
const JOIN_POLL: Duration = Duration::from_millis(5);

/// Error returned by [`Coordinator::join`] when tracked threads did not
/// observe the stop flag and exit within the grace period.
#[derive(Debug)]
pub struct CoordinatorErr {
    stragglers: Vec<String>,
}

impl CoordinatorErr {
    /// Returns the names of the threads still running when the grace period
    /// expired.
    pub fn stragglers(&self) -> &[String] {
        &self.stragglers
    }
}

impl Display for CoordinatorErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stop grace period expired with {} thread(s) still running: {}",
            self.stragglers.len(),
            self.stragglers.join(", ")
        )
    }
}

impl Error for CoordinatorErr {}

/// Cross-thread stop signaling for auxiliary background execution.
///
/// One coordinator exists per coordinated training session and is passed by
/// reference to every component that needs cancellation visibility. Tracked
/// threads are expected to poll [`Coordinator::should_stop`] and exit
/// cooperatively; the coordinator never interrupts a thread mid-work.
pub struct Coordinator {
    stop: AtomicBool,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl Coordinator {
    /// Creates a new `Coordinator` with the stop flag cleared.
    ///
    /// # Returns
    /// A new `Coordinator` instance.
    pub fn new() -> Self {
        Self {
            stop: AtomicBool::new(false),
            threads: Mutex::new(Vec::new()),
        }
    }

    /// Returns whether a stop was requested.
    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Raises the stop flag for every tracked thread.
    pub fn request_stop(&self) {
        debug!("coordinator stop requested");
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Tracks a background thread for the grace-period join.
    ///
    /// # Arguments
    /// * `handle` - The thread's join handle.
    pub fn register(&self, handle: JoinHandle<()>) {
        self.threads.lock().push(handle);
    }

    /// Requests stop and waits up to `grace` for tracked threads to exit.
    ///
    /// Threads that finished are joined; threads still running when the
    /// grace period expires are abandoned and reported, escalation is the
    /// caller's responsibility.
    ///
    /// # Arguments
    /// * `grace` - How long to wait for cooperative shutdown.
    ///
    /// # Returns
    /// An error naming the threads that outlived the grace period.
    pub fn join(&self, grace: Duration) -> Result<(), CoordinatorErr> {
        self.request_stop();

        let handles = std::mem::take(&mut *self.threads.lock());
        let deadline = Instant::now() + grace;

        while Instant::now() < deadline {
            if handles.iter().all(JoinHandle::is_finished) {
                break;
            }
            std::thread::sleep(JOIN_POLL.min(grace));
        }

        let mut stragglers = Vec::new();

        for handle in handles {
            if handle.is_finished() {
                if handle.join().is_err() {
                    warn!("coordinated thread panicked before shutdown");
                }
            } else {
                let name = handle
                    .thread()
                    .name()
                    .unwrap_or("<unnamed>")
                    .to_string();
                warn!(thread = name.as_str(); "thread ignored stop request past grace period");
                stragglers.push(name);
            }
        }

        if stragglers.is_empty() {
            Ok(())
        } else {
            Err(CoordinatorErr { stragglers })
        }
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}
