use std::{collections::HashMap, sync::Arc};

use log::debug;

use crate::{
    graph::{DType, Graph, VariableRef},
    initialization::Initializer,
};

use super::{OptimizerErr, Result};

/// Registry of auxiliary per-variable state owned by one optimizer.
///
/// Slots are keyed by `(slot name, owner variable identity)` and created
/// lazily; repeated requests for the same key return the slot created first.
/// Slot creation is a graph-construction-phase activity, the store is not
/// meant to be shared across threads.
pub struct SlotStore {
    prefix: String,
    slots: HashMap<(String, usize), VariableRef>,
}

impl SlotStore {
    /// Creates a new, empty `SlotStore`.
    ///
    /// # Arguments
    /// * `prefix` - The owning optimizer's name, used in slot variable names.
    ///
    /// # Returns
    /// A new `SlotStore` instance.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            slots: HashMap::new(),
        }
    }

    /// Returns the slot for `(slot_name, var)`, creating it on first request.
    ///
    /// The slot variable is named `{owner}/{prefix}/{slot_name}` and declared
    /// in `var`'s collection. The given shape and dtype may differ from the
    /// owner's, e.g. for scalar accumulators.
    ///
    /// # Arguments
    /// * `slot_name` - The slot's name within the optimizer.
    /// * `var` - The owning variable.
    /// * `initializer` - Generates the slot's initial values.
    /// * `shape` - The slot's shape.
    /// * `dtype` - The slot's element type.
    /// * `graph` - The graph to declare the slot variable in.
    ///
    /// # Returns
    /// The slot's handle, or a graph error if creation fails.
    pub fn get_or_create(
        &mut self,
        slot_name: &str,
        var: &VariableRef,
        initializer: Arc<dyn Initializer>,
        shape: &[usize],
        dtype: DType,
        graph: &Graph,
    ) -> Result<VariableRef> {
        let key = (slot_name.to_string(), var.id());

        if let Some(slot) = self.slots.get(&key) {
            return Ok(slot.clone());
        }

        let name = format!("{}/{}/{}", var.name(), self.prefix, slot_name);
        let slot = graph.variable(&name, dtype, shape, var.collection(), initializer)?;

        debug!(slot = name.as_str(), owner = var.name(); "created optimizer slot");
        self.slots.insert(key, slot.clone());
        Ok(slot)
    }

    /// Looks up an already-created slot.
    ///
    /// # Arguments
    /// * `slot_name` - The slot's name within the optimizer.
    /// * `var` - The owning variable.
    ///
    /// # Returns
    /// The slot's handle, or `SlotNotFound` if it was never created.
    pub fn get(&self, slot_name: &str, var: &VariableRef) -> Result<VariableRef> {
        self.slots
            .get(&(slot_name.to_string(), var.id()))
            .cloned()
            .ok_or_else(|| OptimizerErr::SlotNotFound {
                slot: slot_name.to_string(),
                variable: var.name().to_string(),
            })
    }

    /// Returns the number of registered slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns whether no slots were created yet.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
