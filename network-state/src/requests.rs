//! Property request bookkeeping
//!
//! Tracks which entity fetches are in flight, which paths have been fetched
//! for the current lists, and which entities are subscribed for per-entity
//! property changes.

use std::collections::{HashMap, HashSet};
use std::fmt;

use network_service::EntityKind;

/// Entity families the handler maintains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagedType {
    Network,
    Favorite,
    Device,
}

impl ManagedType {
    /// Object kind used when fetching this family from the service
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            ManagedType::Network | ManagedType::Favorite => EntityKind::Service,
            ManagedType::Device => EntityKind::Device,
        }
    }
}

impl fmt::Display for ManagedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ManagedType::Network => "network",
            ManagedType::Favorite => "favorite",
            ManagedType::Device => "device",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct RequestTracker {
    pending: HashMap<ManagedType, HashSet<String>>,
    requested: HashMap<ManagedType, HashSet<String>>,
    observed: HashMap<ManagedType, HashSet<String>>,
    max_observed: usize,
}

impl RequestTracker {
    pub fn new(max_observed: usize) -> Self {
        Self {
            pending: HashMap::new(),
            requested: HashMap::new(),
            observed: HashMap::new(),
            max_observed,
        }
    }

    /// Mark a fetch as in flight; `false` if one already is
    pub fn begin_request(&mut self, managed_type: ManagedType, path: &str) -> bool {
        self.pending
            .entry(managed_type)
            .or_default()
            .insert(path.to_string())
    }

    pub fn complete_request(&mut self, managed_type: ManagedType, path: &str) {
        if let Some(pending) = self.pending.get_mut(&managed_type) {
            pending.remove(path);
        }
    }

    pub fn has_pending(&self, managed_type: ManagedType) -> bool {
        self.pending
            .get(&managed_type)
            .map(|pending| !pending.is_empty())
            .unwrap_or(false)
    }

    pub fn is_pending(&self, managed_type: ManagedType, path: &str) -> bool {
        self.pending
            .get(&managed_type)
            .map(|pending| pending.contains(path))
            .unwrap_or(false)
    }

    /// Record a new list and return the paths that need a fetch
    ///
    /// Paths fetched for an earlier list are not fetched again, except
    /// devices, which are always refreshed. Favorites already fetched as
    /// networks are skipped because a network fetch updates both.
    pub fn update_requested(&mut self, managed_type: ManagedType, paths: &[String]) -> Vec<String> {
        let previous = self.requested.remove(&managed_type).unwrap_or_default();
        let networks = self.requested.get(&ManagedType::Network);

        let mut current = HashSet::new();
        let mut to_fetch = Vec::new();
        for path in paths {
            if path.is_empty() {
                continue;
            }
            if managed_type == ManagedType::Favorite
                && networks.map(|n| n.contains(path)).unwrap_or(false)
            {
                continue;
            }
            if (managed_type == ManagedType::Device || !previous.contains(path))
                && !to_fetch.contains(path)
            {
                to_fetch.push(path.clone());
            }
            current.insert(path.clone());
        }
        self.requested.insert(managed_type, current);
        to_fetch
    }

    /// Observe the first `max_observed` entries of a list
    pub fn update_observed(&mut self, managed_type: ManagedType, paths: &[String]) {
        let observed: HashSet<String> = paths
            .iter()
            .filter(|path| !path.is_empty())
            .take(self.max_observed)
            .cloned()
            .collect();
        self.observed.insert(managed_type, observed);
    }

    pub fn is_observed(&self, managed_type: ManagedType, path: &str) -> bool {
        self.observed
            .get(&managed_type)
            .map(|observed| observed.contains(path))
            .unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.requested.clear();
        self.observed.clear();
    }
}
