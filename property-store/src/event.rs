//! Results reported by store mutations
//!
//! The store never notifies anyone itself. Each mutation returns a summary of
//! what changed and the caller decides which notifications that implies.

/// Outcome of applying properties to one entity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateResult {
    /// At least one tracked field took a new value
    pub changed: bool,

    /// The entity's connection-state key took a new value
    pub changed_connection_state: bool,

    /// Keys that changed, in application order
    pub changed_keys: Vec<String>,

    /// An explicit refresh had been requested for this entity
    ///
    /// The flag is consumed by the update that reports it.
    pub update_requested: bool,
}

impl UpdateResult {
    /// True when the caller should treat the update as notable
    pub fn needs_notify(&self) -> bool {
        self.changed || self.update_requested
    }

    /// Whether a particular key changed
    pub fn key_changed(&self, key: &str) -> bool {
        self.changed_keys.iter().any(|k| k == key)
    }
}

/// Outcome of replacing the ordered membership of a store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListUpdate {
    /// Paths that were not present before, in list order
    pub added: Vec<String>,

    /// Paths that were dropped
    pub removed: Vec<String>,

    /// Surviving entries changed relative order
    pub reordered: bool,
}

impl ListUpdate {
    /// True when membership or order changed
    pub fn is_changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty() || self.reordered
    }
}
