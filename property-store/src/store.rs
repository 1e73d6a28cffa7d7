//! Ordered, path-keyed entity storage
//!
//! This module provides the storage primitive the aggregator builds on:
//! - `PropertyStore<E>`: the entities of one family, in the order the service
//!   lists them, with per-key change detection on every update
//!
//! The store has no interior locking; callers serialize access the same way
//! they serialize everything else derived from the same events.

use indexmap::IndexMap;

use crate::entity::Entity;
use crate::error::{Result, StoreError};
use crate::event::{ListUpdate, UpdateResult};
use crate::value::{PropertyMap, PropertyValue};

/// Bookkeeping wrapped around each entity
#[derive(Debug, Clone)]
struct Slot<E> {
    entity: E,
    /// A full property dictionary has been applied at least once
    update_received: bool,
    /// A refresh was explicitly requested and not yet answered
    update_requested: bool,
}

impl<E: Entity> Slot<E> {
    fn new(path: &str) -> Self {
        Self {
            entity: E::new(path),
            update_received: false,
            update_requested: false,
        }
    }
}

// ============================================================================
// PropertyStore<E> - entities of one family keyed by path
// ============================================================================

/// Ordered collection of entities with change detection
///
/// Membership and order come from [`PropertyStore::update_list`]; contents
/// come from [`PropertyStore::apply_update`] (a full dictionary) and
/// [`PropertyStore::set_property`] (a single key).
///
/// # Example
///
/// ```rust,ignore
/// let mut store = PropertyStore::<NetworkState>::new();
/// store.update_list(&["/service/eth1", "/service/wifi1"]);
///
/// let result = store.apply_update("/service/eth1", &props)?;
/// assert!(result.changed);
///
/// // Same dictionary again reports nothing
/// let result = store.apply_update("/service/eth1", &props)?;
/// assert!(!result.changed);
/// ```
#[derive(Clone)]
pub struct PropertyStore<E: Entity> {
    slots: IndexMap<String, Slot<E>>,
}

impl<E: Entity> PropertyStore<E> {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            slots: IndexMap::new(),
        }
    }

    /// Replace membership with `paths`, in that order
    ///
    /// Existing entities are kept with their state, new paths get a fresh
    /// entity, and paths no longer listed are dropped. Empty and duplicate
    /// paths are skipped.
    pub fn update_list<S: AsRef<str>>(&mut self, paths: &[S]) -> ListUpdate {
        let old_order: Vec<String> = self.slots.keys().cloned().collect();
        let mut previous = std::mem::take(&mut self.slots);
        let mut added = Vec::new();

        for path in paths {
            let path = path.as_ref();
            if path.is_empty() || self.slots.contains_key(path) {
                continue;
            }
            let slot = match previous.swap_remove(path) {
                Some(slot) => slot,
                None => {
                    added.push(path.to_string());
                    Slot::new(path)
                }
            };
            self.slots.insert(path.to_string(), slot);
        }

        let removed: Vec<String> = old_order
            .iter()
            .filter(|path| !self.slots.contains_key(path.as_str()))
            .cloned()
            .collect();

        let survivors_before = old_order
            .iter()
            .filter(|path| self.slots.contains_key(path.as_str()));
        let survivors_after = self.slots.keys().filter(|path| !added.contains(path));
        let reordered = !survivors_before.eq(survivors_after);

        ListUpdate {
            added,
            removed,
            reordered,
        }
    }

    /// Apply a full property dictionary to an existing entity
    ///
    /// Keys are applied in dictionary order. On a missing required key the
    /// entity is left untouched.
    pub fn apply_update(&mut self, path: &str, properties: &PropertyMap) -> Result<UpdateResult> {
        let slot = self.slot_mut(path)?;

        if let Some(key) = E::REQUIRED_KEYS
            .iter()
            .copied()
            .find(|key| !properties.contains_key(*key))
        {
            return Err(StoreError::MalformedEntity {
                kind: E::KIND,
                path: path.to_string(),
                key,
            });
        }

        let mut result = UpdateResult::default();
        for (key, value) in properties {
            if slot.entity.property_changed(key, value) {
                result.record(key, E::CONNECTION_STATE_KEY);
            }
        }
        if slot.entity.initial_properties_received(properties) {
            result.changed = true;
        }

        slot.update_received = true;
        result.update_requested = std::mem::take(&mut slot.update_requested);
        Ok(result)
    }

    /// Apply a single changed key to an existing entity
    pub fn set_property(
        &mut self,
        path: &str,
        key: &str,
        value: &PropertyValue,
    ) -> Result<UpdateResult> {
        let slot = self.slot_mut(path)?;

        let mut result = UpdateResult::default();
        if slot.entity.property_changed(key, value) {
            result.record(key, E::CONNECTION_STATE_KEY);
        }
        Ok(result)
    }

    /// Mark an entity as awaiting an explicit refresh
    ///
    /// Returns `false` if the path is unknown.
    pub fn request_update(&mut self, path: &str) -> bool {
        match self.slots.get_mut(path) {
            Some(slot) => {
                slot.update_requested = true;
                true
            }
            None => false,
        }
    }

    /// Get an entity by path
    pub fn get(&self, path: &str) -> Option<&E> {
        self.slots.get(path).map(|slot| &slot.entity)
    }

    /// Get an entity by path for direct modification
    pub fn get_mut(&mut self, path: &str) -> Option<&mut E> {
        self.slots.get_mut(path).map(|slot| &mut slot.entity)
    }

    /// Get an entity only once a full dictionary has been applied to it
    pub fn get_received(&self, path: &str) -> Option<&E> {
        self.slots
            .get(path)
            .filter(|slot| slot.update_received)
            .map(|slot| &slot.entity)
    }

    /// Check if a path is listed
    pub fn contains(&self, path: &str) -> bool {
        self.slots.contains_key(path)
    }

    /// Check if a full dictionary has been applied to a path
    pub fn is_update_received(&self, path: &str) -> bool {
        self.slots
            .get(path)
            .map(|slot| slot.update_received)
            .unwrap_or(false)
    }

    /// Iterate all entities in list order
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.slots.values().map(|slot| &slot.entity)
    }

    /// Iterate entities that have received a full dictionary, in list order
    pub fn iter_received(&self) -> impl Iterator<Item = &E> {
        self.slots
            .values()
            .filter(|slot| slot.update_received)
            .map(|slot| &slot.entity)
    }

    /// Iterate mutable entities in list order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut E> {
        self.slots.values_mut().map(|slot| &mut slot.entity)
    }

    /// Listed paths in order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Position of a path in the list
    pub fn position(&self, path: &str) -> Option<usize> {
        self.slots.get_index_of(path)
    }

    /// Get the number of listed entities
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Remove an entity, keeping the order of the rest
    pub fn remove(&mut self, path: &str) -> Option<E> {
        self.slots.shift_remove(path).map(|slot| slot.entity)
    }

    /// Remove every entity
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    fn slot_mut(&mut self, path: &str) -> Result<&mut Slot<E>> {
        self.slots.get_mut(path).ok_or_else(|| StoreError::UnknownEntity {
            kind: E::KIND,
            path: path.to_string(),
        })
    }
}

impl UpdateResult {
    fn record(&mut self, key: &str, connection_state_key: Option<&'static str>) {
        self.changed = true;
        if connection_state_key == Some(key) {
            self.changed_connection_state = true;
        }
        self.changed_keys.push(key.to_string());
    }
}

impl<E: Entity> Default for PropertyStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> std::fmt::Debug for PropertyStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyStore")
            .field("kind", &E::KIND)
            .field("entity_count", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{update_int, update_string};
    use crate::value::property_map;

    #[derive(Clone, Debug, PartialEq)]
    struct Link {
        path: String,
        kind: String,
        state: String,
        strength: i64,
    }

    impl Entity for Link {
        const KIND: &'static str = "link";
        const REQUIRED_KEYS: &'static [&'static str] = &["Type"];
        const CONNECTION_STATE_KEY: Option<&'static str> = Some("State");

        fn new(path: &str) -> Self {
            Link {
                path: path.to_string(),
                kind: String::new(),
                state: String::new(),
                strength: 0,
            }
        }

        fn path(&self) -> &str {
            &self.path
        }

        fn property_changed(&mut self, key: &str, value: &PropertyValue) -> bool {
            match key {
                "Type" => update_string(&mut self.kind, value),
                "State" => update_string(&mut self.state, value),
                "Strength" => update_int(&mut self.strength, value),
                _ => false,
            }
        }
    }

    fn wifi(state: &str) -> PropertyMap {
        property_map([
            ("Type", PropertyValue::from("wifi")),
            ("State", PropertyValue::from(state)),
            ("Strength", PropertyValue::from(40)),
        ])
    }

    #[test]
    fn test_update_list_creates_and_orders() {
        let mut store = PropertyStore::<Link>::new();

        let update = store.update_list(&["/a", "/b", "/c"]);
        assert_eq!(update.added, vec!["/a", "/b", "/c"]);
        assert!(update.removed.is_empty());
        assert!(!update.reordered);
        assert_eq!(store.paths().collect::<Vec<_>>(), vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn test_update_list_keeps_existing_state() {
        let mut store = PropertyStore::<Link>::new();
        store.update_list(&["/a", "/b"]);
        store.apply_update("/a", &wifi("online")).unwrap();

        let update = store.update_list(&["/c", "/a"]);
        assert_eq!(update.added, vec!["/c"]);
        assert_eq!(update.removed, vec!["/b"]);
        assert!(!update.reordered);

        assert!(store.is_update_received("/a"));
        assert_eq!(store.get("/a").unwrap().state, "online");
        assert!(!store.is_update_received("/c"));
    }

    #[test]
    fn test_update_list_detects_reorder() {
        let mut store = PropertyStore::<Link>::new();
        store.update_list(&["/a", "/b"]);

        let update = store.update_list(&["/b", "/a"]);
        assert!(update.reordered);
        assert!(update.is_changed());

        let update = store.update_list(&["/b", "/a"]);
        assert!(!update.is_changed());
    }

    #[test]
    fn test_update_list_skips_empty_and_duplicates() {
        let mut store = PropertyStore::<Link>::new();
        store.update_list(&["/a", "", "/a", "/b"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_apply_update_reports_changed_keys() {
        let mut store = PropertyStore::<Link>::new();
        store.update_list(&["/a"]);

        let result = store.apply_update("/a", &wifi("idle")).unwrap();
        assert!(result.changed);
        assert!(result.changed_connection_state);
        assert_eq!(result.changed_keys, vec!["State", "Strength", "Type"]);

        let result = store.apply_update("/a", &wifi("online")).unwrap();
        assert!(result.changed);
        assert_eq!(result.changed_keys, vec!["State"]);
    }

    #[test]
    fn test_apply_update_identical_is_noop() {
        let mut store = PropertyStore::<Link>::new();
        store.update_list(&["/a"]);
        store.apply_update("/a", &wifi("online")).unwrap();

        let result = store.apply_update("/a", &wifi("online")).unwrap();
        assert!(!result.changed);
        assert!(!result.needs_notify());
    }

    #[test]
    fn test_apply_update_ignores_unknown_keys() {
        let mut store = PropertyStore::<Link>::new();
        store.update_list(&["/a"]);
        store.apply_update("/a", &wifi("online")).unwrap();

        let mut props = wifi("online");
        props.insert("Vendor".to_string(), PropertyValue::from("acme"));
        let result = store.apply_update("/a", &props).unwrap();
        assert!(!result.changed);
    }

    #[test]
    fn test_apply_update_missing_type_preserves_state() {
        let mut store = PropertyStore::<Link>::new();
        store.update_list(&["/a"]);
        store.apply_update("/a", &wifi("online")).unwrap();

        let props = property_map([("State", PropertyValue::from("idle"))]);
        let err = store.apply_update("/a", &props).unwrap_err();
        assert_eq!(
            err,
            StoreError::MalformedEntity {
                kind: "link",
                path: "/a".to_string(),
                key: "Type",
            }
        );
        assert_eq!(store.get("/a").unwrap().state, "online");
    }

    #[test]
    fn test_apply_update_unknown_path() {
        let mut store = PropertyStore::<Link>::new();
        let err = store.apply_update("/missing", &wifi("idle")).unwrap_err();
        assert!(matches!(err, StoreError::UnknownEntity { .. }));
    }

    #[test]
    fn test_request_update_is_consumed() {
        let mut store = PropertyStore::<Link>::new();
        store.update_list(&["/a"]);
        store.apply_update("/a", &wifi("online")).unwrap();

        assert!(store.request_update("/a"));
        let result = store.apply_update("/a", &wifi("online")).unwrap();
        assert!(!result.changed);
        assert!(result.update_requested);
        assert!(result.needs_notify());

        let result = store.apply_update("/a", &wifi("online")).unwrap();
        assert!(!result.update_requested);
        assert!(!store.request_update("/missing"));
    }

    #[test]
    fn test_set_property_single_key() {
        let mut store = PropertyStore::<Link>::new();
        store.update_list(&["/a"]);

        let result = store
            .set_property("/a", "Strength", &PropertyValue::from(80))
            .unwrap();
        assert!(result.changed);
        assert!(!result.changed_connection_state);

        let result = store
            .set_property("/a", "Strength", &PropertyValue::from(80))
            .unwrap();
        assert!(!result.changed);
    }

    #[test]
    fn test_received_views() {
        let mut store = PropertyStore::<Link>::new();
        store.update_list(&["/a", "/b"]);
        store.apply_update("/b", &wifi("online")).unwrap();

        assert!(store.get("/a").is_some());
        assert!(store.get_received("/a").is_none());
        let received: Vec<_> = store.iter_received().map(|l| l.path.clone()).collect();
        assert_eq!(received, vec!["/b"]);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut store = PropertyStore::<Link>::new();
        store.update_list(&["/a", "/b", "/c"]);

        assert!(store.remove("/b").is_some());
        assert_eq!(store.paths().collect::<Vec<_>>(), vec!["/a", "/c"]);
        assert_eq!(store.position("/c"), Some(1));

        store.clear();
        assert!(store.is_empty());
    }
}
