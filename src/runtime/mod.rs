//! The execution side of the substrate.
//!
//! A [`Runtime`] stands in for a distributed training runtime: it maps
//! `master` address strings to shared variable stores, so every session
//! created against the same master observes the same state. A chief that
//! initializes variables therefore makes waiting workers ready.

mod session;

pub use session::{Fetch, FeedMap, RuntimeSession, Session, SessionConfig, SessionErr};

use std::{collections::HashMap, sync::Arc};

use log::{debug, info};
use parking_lot::{Mutex, RwLock};

use crate::graph::{Graph, TensorValue};

/// One variable's storage cell. `None` until initialized.
pub(crate) struct VariableCell {
    pub(crate) value: Mutex<Option<TensorValue>>,
}

impl VariableCell {
    fn new() -> Self {
        Self {
            value: Mutex::new(None),
        }
    }

    /// Clones the current value out of the cell.
    pub(crate) fn snapshot(&self) -> Option<TensorValue> {
        self.value.lock().clone()
    }

    /// Replaces the cell's value, marking the variable initialized.
    pub(crate) fn put(&self, value: TensorValue) {
        *self.value.lock() = Some(value);
    }
}

/// Per-master shared variable storage.
pub(crate) struct VariableStore {
    cells: RwLock<HashMap<String, Arc<VariableCell>>>,
}

impl VariableStore {
    fn new() -> Self {
        Self {
            cells: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cell for `name`, creating an uninitialized one on demand.
    pub(crate) fn cell(&self, name: &str) -> Arc<VariableCell> {
        if let Some(cell) = self.cells.read().get(name) {
            return cell.clone();
        }

        self.cells
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(VariableCell::new()))
            .clone()
    }

    /// Returns whether `name` holds a value.
    pub(crate) fn is_initialized(&self, name: &str) -> bool {
        self.cells
            .read()
            .get(name)
            .is_some_and(|cell| cell.value.lock().is_some())
    }
}

/// An in-memory execution substrate endpoint.
///
/// Passed explicitly to every component that creates sessions; there is no
/// process-wide singleton.
pub struct Runtime {
    stores: Mutex<HashMap<String, Arc<VariableStore>>>,
}

impl Runtime {
    /// Creates a new `Runtime` with no masters yet.
    ///
    /// # Returns
    /// A new `Runtime` instance.
    pub fn new() -> Self {
        Self {
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a session against `master`.
    ///
    /// Sessions created against the same master share variable state.
    ///
    /// # Arguments
    /// * `master` - The runtime target address.
    /// * `graph` - The graph the session executes ops of.
    /// * `config` - Runtime-level session options.
    ///
    /// # Returns
    /// A new `RuntimeSession` instance.
    pub fn connect(
        self: &Arc<Self>,
        master: &str,
        graph: Arc<Graph>,
        config: SessionConfig,
    ) -> RuntimeSession {
        let store = self.store(master);
        info!(master; "session connected");
        RuntimeSession::new(master.to_string(), graph, store, config)
    }

    fn store(&self, master: &str) -> Arc<VariableStore> {
        let mut stores = self.stores.lock();

        if !stores.contains_key(master) {
            debug!(master; "allocating variable store for new master");
        }

        stores
            .entry(master.to_string())
            .or_insert_with(|| Arc::new(VariableStore::new()))
            .clone()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
