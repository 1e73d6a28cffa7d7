//! In-process fake of the network service
//!
//! `FakeNetworkService` keeps a small model of a connection manager (technology
//! lists, services, devices, profiles) and implements [`NetworkServiceClient`]
//! against it. Every response and every change notification is posted to the
//! shared [`TaskQueue`]; nothing is delivered until the queue is drained.
//!
//! Notification values are captured when the change happens, so a listener
//! sees the sequence of states rather than only the latest one.

use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use property_store::{PropertyMap, PropertyValue};
use tracing::{debug, info};

use crate::client::{
    EntityKind, NetworkServiceClient, PropertiesCallback, PropertyChangedListener, ResultCallback,
    SubscriptionId,
};
use crate::error::ServiceError;
use crate::keys::{self, device, manager, profile, service, state, types};
use crate::queue::TaskQueue;

/// Path of the stub ethernet service in the default environment
pub const STUB_ETHERNET: &str = "eth1";
/// Path of the connected stub wifi service in the default environment
pub const STUB_WIFI1: &str = "wifi1";
/// Path of the idle stub wifi service in the default environment
pub const STUB_WIFI2: &str = "wifi2";
/// Path of the stub cellular service in the default environment
pub const STUB_CELLULAR: &str = "cellular1";
pub const STUB_WIFI_DEVICE: &str = "/device/stub_wifi_device1";
pub const STUB_CELLULAR_DEVICE: &str = "/device/stub_cellular_device1";

fn is_connected_state(value: Option<&PropertyValue>) -> bool {
    matches!(
        value.and_then(PropertyValue::as_str),
        Some(state::READY) | Some(state::PORTAL) | Some(state::ONLINE)
    )
}

fn str_list(items: &[String]) -> PropertyValue {
    PropertyValue::StrList(items.to_vec())
}

/// Add `item` if missing; returns whether the list changed
fn insert_unique(list: &mut Vec<String>, item: &str) -> bool {
    if list.iter().any(|existing| existing == item) {
        false
    } else {
        list.push(item.to_string());
        true
    }
}

/// Remove `item` if present; returns whether the list changed
fn remove_item(list: &mut Vec<String>, item: &str) -> bool {
    let before = list.len();
    list.retain(|existing| existing != item);
    list.len() != before
}

#[derive(Debug, Default)]
struct FakeProfile {
    user_hash: String,
    /// Persisted service dictionaries keyed by service path
    entries: IndexMap<String, PropertyMap>,
}

#[derive(Default)]
struct FakeState {
    available: Vec<String>,
    enabled: Vec<String>,
    uninitialized: Vec<String>,
    /// Visible services in priority order
    services: Vec<String>,
    /// Visible services plus services only known through a profile
    complete: Vec<String>,
    service_props: IndexMap<String, PropertyMap>,
    devices: IndexMap<String, PropertyMap>,
    profiles: IndexMap<String, FakeProfile>,
    default_service: String,
    check_portal_list: String,
    best_service: Option<String>,
    pending_failure: Option<ServiceError>,
    listeners: Vec<(SubscriptionId, Weak<dyn PropertyChangedListener>)>,
    next_subscription: u64,
}

impl FakeState {
    fn manager_properties(&self) -> PropertyMap {
        let default_service = if self.default_service.is_empty() {
            keys::NO_SERVICE_PATH.to_string()
        } else {
            self.default_service.clone()
        };
        let device_paths: Vec<String> = self.devices.keys().cloned().collect();
        let profile_paths: Vec<String> = self.profiles.keys().cloned().collect();

        let mut props = PropertyMap::new();
        props.insert(manager::AVAILABLE_TECHNOLOGIES.into(), str_list(&self.available));
        props.insert(manager::ENABLED_TECHNOLOGIES.into(), str_list(&self.enabled));
        props.insert(manager::UNINITIALIZED_TECHNOLOGIES.into(), str_list(&self.uninitialized));
        props.insert(manager::SERVICES.into(), str_list(&self.services));
        props.insert(manager::SERVICE_COMPLETE_LIST.into(), str_list(&self.complete));
        props.insert(manager::DEVICES.into(), str_list(&device_paths));
        props.insert(manager::PROFILES.into(), str_list(&profile_paths));
        props.insert(manager::DEFAULT_SERVICE.into(), PropertyValue::Str(default_service));
        props.insert(
            manager::CHECK_PORTAL_LIST.into(),
            PropertyValue::Str(self.check_portal_list.clone()),
        );
        props
    }

    fn manager_property(&self, key: &str) -> Option<PropertyValue> {
        self.manager_properties().remove(key)
    }

    fn profile_entry(&self, path: &str) -> Option<&PropertyMap> {
        self.profiles
            .values()
            .find_map(|profile| profile.entries.get(path))
    }

    fn service_properties(&self, path: &str) -> Option<PropertyMap> {
        if let Some(props) = self.service_props.get(path) {
            return Some(props.clone());
        }
        self.profile_entry(path).map(|entry| {
            let mut props = entry.clone();
            props.insert(service::STATE.into(), state::IDLE.into());
            props.insert(service::VISIBLE.into(), false.into());
            props
        })
    }
}

struct Shared {
    queue: TaskQueue,
    state: Mutex<FakeState>,
}

impl Shared {
    /// Post a property-change notification carrying `value` as it is now
    fn post_change(
        self: &Arc<Self>,
        kind: EntityKind,
        path: &str,
        key: &str,
        value: PropertyValue,
    ) {
        let shared = Arc::downgrade(self);
        let path = path.to_string();
        let key = key.to_string();
        self.queue.post(move || {
            if let Some(shared) = shared.upgrade() {
                shared.deliver(kind, &path, &key, &value);
            }
        });
    }

    fn post_manager_change(self: &Arc<Self>, state: &FakeState, key: &str) {
        if let Some(value) = state.manager_property(key) {
            self.post_change(EntityKind::Manager, keys::MANAGER_PATH, key, value);
        }
    }

    fn deliver(&self, kind: EntityKind, path: &str, key: &str, value: &PropertyValue) {
        let listeners: Vec<Arc<dyn PropertyChangedListener>> = self
            .state
            .lock()
            .listeners
            .iter()
            .filter_map(|(_, listener)| listener.upgrade())
            .collect();
        for listener in listeners {
            listener.on_property_changed(kind, path, key, value);
        }
    }

    fn post_result(&self, callback: ResultCallback, result: Result<(), ServiceError>) {
        self.queue.post(move || callback(result));
    }

    /// Move connected services ahead of the rest and pick the default
    fn sort_services(self: &Arc<Self>, state: &mut FakeState) {
        let before = state.services.clone();
        let props = &state.service_props;
        state.services.sort_by_key(|path| {
            !is_connected_state(props.get(path).and_then(|p| p.get(service::STATE)))
        });
        if state.services != before {
            self.post_manager_change(state, manager::SERVICES);
        }

        let default_service = state
            .services
            .first()
            .filter(|path| {
                is_connected_state(
                    state
                        .service_props
                        .get(path.as_str())
                        .and_then(|p| p.get(service::STATE)),
                )
            })
            .cloned()
            .unwrap_or_default();
        if default_service != state.default_service {
            debug!(
                from = %state.default_service,
                to = %default_service,
                "fake default service changed"
            );
            state.default_service = default_service;
            self.post_manager_change(state, manager::DEFAULT_SERVICE);
        }
    }

    fn set_service_property(
        self: &Arc<Self>,
        state: &mut FakeState,
        path: &str,
        key: &str,
        value: PropertyValue,
    ) -> bool {
        let Some(props) = state.service_props.get_mut(path) else {
            return false;
        };
        let was_connected = is_connected_state(props.get(service::STATE));
        props.insert(key.to_string(), value.clone());
        let now_connected = is_connected_state(props.get(service::STATE));

        if key == service::GUID {
            for profile in state.profiles.values_mut() {
                if let Some(entry) = profile.entries.get_mut(path) {
                    entry.insert(key.to_string(), value.clone());
                }
            }
        }

        self.post_change(EntityKind::Service, path, key, value);
        if key == service::STATE && was_connected != now_connected {
            self.sort_services(state);
        }
        true
    }

    fn set_manager_property(
        self: &Arc<Self>,
        state: &mut FakeState,
        key: &str,
        value: PropertyValue,
    ) {
        match key {
            manager::DEFAULT_SERVICE => {
                let path = value.as_str().unwrap_or_default();
                state.default_service = if path == keys::NO_SERVICE_PATH {
                    String::new()
                } else {
                    path.to_string()
                };
            }
            manager::CHECK_PORTAL_LIST => {
                state.check_portal_list = value.as_str().unwrap_or_default().to_string();
            }
            _ => {
                debug!(key, "fake manager ignoring property");
                return;
            }
        }
        self.post_change(EntityKind::Manager, keys::MANAGER_PATH, key, value);
    }

    fn set_device_property(
        self: &Arc<Self>,
        state: &mut FakeState,
        path: &str,
        key: &str,
        value: PropertyValue,
    ) -> bool {
        let Some(props) = state.devices.get_mut(path) else {
            return false;
        };
        props.insert(key.to_string(), value.clone());
        self.post_change(EntityKind::Device, path, key, value);
        true
    }

    fn set_technology_enabled(
        self: &Arc<Self>,
        technology: &str,
        enabled: bool,
        callback: ResultCallback,
    ) {
        let mut state = self.state.lock();
        if let Some(err) = state.pending_failure.take() {
            drop(state);
            self.post_result(callback, Err(err));
            return;
        }
        if enabled {
            insert_unique(&mut state.enabled, technology);
        } else {
            remove_item(&mut state.enabled, technology);
        }
        // The enabled list is reported even when it did not change
        self.post_manager_change(&state, manager::ENABLED_TECHNOLOGIES);
        drop(state);
        self.post_result(callback, Ok(()));
    }

    fn device_paths_of_type(state: &FakeState, technology: &str) -> Vec<String> {
        state
            .devices
            .iter()
            .filter(|(_, props)| {
                technology.is_empty()
                    || props.get(device::TYPE).and_then(PropertyValue::as_str) == Some(technology)
            })
            .map(|(path, _)| path.clone())
            .collect()
    }
}

// ============================================================================
// FakeNetworkService - public test interface
// ============================================================================

/// In-process network service for tests and demos
///
/// Clones share the same model and queue.
///
/// # Example
///
/// ```rust
/// use network_service::{FakeNetworkService, TaskQueue};
///
/// let queue = TaskQueue::new();
/// let service = FakeNetworkService::with_default_environment(queue.clone());
/// queue.run_until_idle();
///
/// assert_eq!(service.visible_services().len(), 4);
/// assert_eq!(service.default_service(), "eth1");
/// ```
#[derive(Clone)]
pub struct FakeNetworkService {
    shared: Arc<Shared>,
}

impl FakeNetworkService {
    /// Create an empty service posting to `queue`
    pub fn new(queue: TaskQueue) -> Self {
        Self {
            shared: Arc::new(Shared {
                queue,
                state: Mutex::new(FakeState::default()),
            }),
        }
    }

    /// Create a service populated with the stub environment
    pub fn with_default_environment(queue: TaskQueue) -> Self {
        let service = Self::new(queue);
        service.setup_default_environment();
        service
    }

    /// Reset to the stub environment
    ///
    /// Technologies ethernet, wifi, wimax and cellular are available and
    /// enabled; two devices (wifi, cellular); services `eth1` (online),
    /// `wifi1` (online), `wifi2` (idle) and `cellular1` (idle).
    pub fn setup_default_environment(&self) {
        self.clear_technologies();
        for technology in [types::ETHERNET, types::WIFI, types::WIMAX, types::CELLULAR] {
            self.add_technology(technology, true);
        }

        self.clear_devices();
        self.add_device(STUB_WIFI_DEVICE, types::WIFI, "stub_wifi_device1");
        self.add_device(STUB_CELLULAR_DEVICE, types::CELLULAR, "stub_cellular_device1");

        self.clear_services();
        self.add_service(STUB_ETHERNET, STUB_ETHERNET, types::ETHERNET, state::ONLINE, true);
        self.add_service(STUB_WIFI1, STUB_WIFI1, types::WIFI, state::ONLINE, true);
        self.add_service(STUB_WIFI2, STUB_WIFI2, types::WIFI, state::IDLE, true);
        self.add_service(STUB_CELLULAR, STUB_CELLULAR, types::CELLULAR, state::IDLE, true);
        info!("fake network service populated with stub environment");
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.shared.queue
    }

    // ------------------------------------------------------------------
    // Technologies
    // ------------------------------------------------------------------

    pub fn add_technology(&self, technology: &str, enabled: bool) {
        let mut state = self.shared.state.lock();
        if insert_unique(&mut state.available, technology) {
            self.shared.post_manager_change(&state, manager::AVAILABLE_TECHNOLOGIES);
        }
        if enabled && insert_unique(&mut state.enabled, technology) {
            self.shared.post_manager_change(&state, manager::ENABLED_TECHNOLOGIES);
        }
    }

    pub fn remove_technology(&self, technology: &str) {
        let mut state = self.shared.state.lock();
        if remove_item(&mut state.available, technology) {
            self.shared.post_manager_change(&state, manager::AVAILABLE_TECHNOLOGIES);
        }
        if remove_item(&mut state.enabled, technology) {
            self.shared.post_manager_change(&state, manager::ENABLED_TECHNOLOGIES);
        }
        if remove_item(&mut state.uninitialized, technology) {
            self.shared.post_manager_change(&state, manager::UNINITIALIZED_TECHNOLOGIES);
        }
    }

    pub fn set_technology_initializing(&self, technology: &str, initializing: bool) {
        let mut state = self.shared.state.lock();
        let changed = if initializing {
            insert_unique(&mut state.uninitialized, technology)
        } else {
            remove_item(&mut state.uninitialized, technology)
        };
        if changed {
            self.shared.post_manager_change(&state, manager::UNINITIALIZED_TECHNOLOGIES);
        }
    }

    pub fn clear_technologies(&self) {
        let mut state = self.shared.state.lock();
        state.available.clear();
        state.enabled.clear();
        state.uninitialized.clear();
        for key in [
            manager::AVAILABLE_TECHNOLOGIES,
            manager::ENABLED_TECHNOLOGIES,
            manager::UNINITIALIZED_TECHNOLOGIES,
        ] {
            self.shared.post_manager_change(&state, key);
        }
    }

    pub fn enabled_technologies(&self) -> Vec<String> {
        self.shared.state.lock().enabled.clone()
    }

    // ------------------------------------------------------------------
    // Devices
    // ------------------------------------------------------------------

    pub fn add_device(&self, path: &str, device_type: &str, name: &str) {
        let mut state = self.shared.state.lock();
        let mut props = PropertyMap::new();
        props.insert(device::TYPE.into(), device_type.into());
        props.insert(device::NAME.into(), name.into());
        props.insert(device::INTERFACE.into(), name.into());
        props.insert(device::POWERED.into(), true.into());
        props.insert(device::SCANNING.into(), false.into());
        state.devices.insert(path.to_string(), props);
        self.shared.post_manager_change(&state, manager::DEVICES);
    }

    pub fn remove_device(&self, path: &str) {
        let mut state = self.shared.state.lock();
        if state.devices.shift_remove(path).is_some() {
            self.shared.post_manager_change(&state, manager::DEVICES);
        }
    }

    pub fn clear_devices(&self) {
        let mut state = self.shared.state.lock();
        state.devices.clear();
        self.shared.post_manager_change(&state, manager::DEVICES);
    }

    /// Set a device property and notify; returns `false` for an unknown device
    pub fn set_device_property(
        &self,
        path: &str,
        key: &str,
        value: impl Into<PropertyValue>,
    ) -> bool {
        let mut state = self.shared.state.lock();
        self.shared.set_device_property(&mut state, path, key, value.into())
    }

    // ------------------------------------------------------------------
    // Services
    // ------------------------------------------------------------------

    /// Add a service; GUID and profile persisted by a profile entry carry over
    pub fn add_service(
        &self,
        path: &str,
        name: &str,
        service_type: &str,
        state: &str,
        visible: bool,
    ) {
        self.add_service_with_guid(path, "", name, service_type, state, visible);
    }

    /// Add a service with an explicit GUID (empty for none)
    pub fn add_service_with_guid(
        &self,
        path: &str,
        guid: &str,
        name: &str,
        service_type: &str,
        connection_state: &str,
        visible: bool,
    ) {
        let mut state = self.shared.state.lock();

        let mut props = PropertyMap::new();
        props.insert(service::TYPE.into(), service_type.into());
        props.insert(service::NAME.into(), name.into());
        props.insert(service::STATE.into(), connection_state.into());
        props.insert(service::VISIBLE.into(), visible.into());
        props.insert(service::CONNECTABLE.into(), true.into());
        if !guid.is_empty() {
            props.insert(service::GUID.into(), guid.into());
        }
        if let Some(entry) = state.profile_entry(path) {
            for key in [service::GUID, service::PROFILE] {
                if let Some(value) = entry.get(key) {
                    props.insert(key.to_string(), value.clone());
                }
            }
        }
        state.service_props.insert(path.to_string(), props);

        if visible && insert_unique(&mut state.services, path) {
            self.shared.post_manager_change(&state, manager::SERVICES);
        }
        if insert_unique(&mut state.complete, path) {
            self.shared.post_manager_change(&state, manager::SERVICE_COMPLETE_LIST);
        }
        self.shared.sort_services(&mut state);
    }

    /// Remove a live service
    ///
    /// A service persisted in a profile stays in the complete list.
    pub fn remove_service(&self, path: &str) {
        let mut state = self.shared.state.lock();
        state.service_props.shift_remove(path);
        if remove_item(&mut state.services, path) {
            self.shared.post_manager_change(&state, manager::SERVICES);
        }
        if state.profile_entry(path).is_none() && remove_item(&mut state.complete, path) {
            self.shared.post_manager_change(&state, manager::SERVICE_COMPLETE_LIST);
        }
        if state.default_service == path {
            self.shared.sort_services(&mut state);
        }
    }

    pub fn clear_services(&self) {
        let mut state = self.shared.state.lock();
        state.service_props.clear();
        state.services.clear();
        state.complete.clear();
        state.default_service.clear();
        for key in [
            manager::SERVICES,
            manager::SERVICE_COMPLETE_LIST,
            manager::DEFAULT_SERVICE,
        ] {
            self.shared.post_manager_change(&state, key);
        }
    }

    /// Set a service property and notify, even when the value is unchanged
    ///
    /// A state change across connected/disconnected re-sorts the service list
    /// and may move the default service. Returns `false` for an unknown
    /// service.
    pub fn set_service_property(
        &self,
        path: &str,
        key: &str,
        value: impl Into<PropertyValue>,
    ) -> bool {
        let mut state = self.shared.state.lock();
        self.shared.set_service_property(&mut state, path, key, value.into())
    }

    /// Drop a key from a service's dictionary without notifying
    ///
    /// Later fetches return the dictionary without it. Returns `false` if the
    /// service or key is unknown.
    pub fn remove_service_property(&self, path: &str, key: &str) -> bool {
        self.shared
            .state
            .lock()
            .service_props
            .get_mut(path)
            .is_some_and(|props| props.remove(key).is_some())
    }

    pub fn service_properties(&self, path: &str) -> Option<PropertyMap> {
        self.shared.state.lock().service_properties(path)
    }

    pub fn visible_services(&self) -> Vec<String> {
        self.shared.state.lock().services.clone()
    }

    pub fn default_service(&self) -> String {
        self.shared.state.lock().default_service.clone()
    }

    /// Service that [`NetworkServiceClient::connect_to_best_services`] brings online
    pub fn set_best_service_to_connect(&self, path: &str) {
        self.shared.state.lock().best_service = Some(path.to_string());
    }

    // ------------------------------------------------------------------
    // Manager and profiles
    // ------------------------------------------------------------------

    /// Set a scalar manager property (`DefaultService`, `CheckPortalList`) and notify
    pub fn set_manager_property(&self, key: &str, value: impl Into<PropertyValue>) {
        let mut state = self.shared.state.lock();
        self.shared.set_manager_property(&mut state, key, value.into());
    }

    pub fn add_profile(&self, path: &str, user_hash: &str) {
        let mut state = self.shared.state.lock();
        state.profiles.insert(
            path.to_string(),
            FakeProfile {
                user_hash: user_hash.to_string(),
                entries: IndexMap::new(),
            },
        );
        self.shared.post_manager_change(&state, manager::PROFILES);
    }

    /// Persist a live service in a profile
    ///
    /// The service's `Profile` property is updated and notified. Returns
    /// `false` if either the profile or the service is unknown.
    pub fn add_service_to_profile(&self, profile_path: &str, service_path: &str) -> bool {
        let mut state = self.shared.state.lock();
        let Some(mut entry) = state.service_props.get(service_path).cloned() else {
            return false;
        };
        let Some(profile) = state.profiles.get_mut(profile_path) else {
            return false;
        };
        entry.insert(service::PROFILE.into(), profile_path.into());
        entry.remove(service::STATE);
        entry.remove(service::VISIBLE);
        profile.entries.insert(service_path.to_string(), entry);

        self.shared
            .set_service_property(&mut state, service_path, service::PROFILE, profile_path.into())
    }

    // ------------------------------------------------------------------
    // Request behavior
    // ------------------------------------------------------------------

    /// Make the next data-less request (set, enable, disable, scan, connect) fail
    pub fn fail_next_request(&self, error: ServiceError) {
        self.shared.state.lock().pending_failure = Some(error);
    }

    /// Number of subscribed listeners still alive
    pub fn listener_count(&self) -> usize {
        self.shared
            .state
            .lock()
            .listeners
            .iter()
            .filter(|(_, listener)| listener.strong_count() > 0)
            .count()
    }
}

impl std::fmt::Debug for FakeNetworkService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("FakeNetworkService")
            .field("services", &state.services)
            .field("devices", &state.devices.len())
            .field("default_service", &state.default_service)
            .finish()
    }
}

// ============================================================================
// NetworkServiceClient implementation
// ============================================================================

impl NetworkServiceClient for FakeNetworkService {
    fn get_manager_properties(&self, callback: PropertiesCallback) {
        let shared = Arc::downgrade(&self.shared);
        self.shared.queue.post(move || {
            let Some(shared) = shared.upgrade() else {
                return;
            };
            let props = shared.state.lock().manager_properties();
            callback(Ok(props));
        });
    }

    fn get_properties(&self, kind: EntityKind, path: &str, callback: PropertiesCallback) {
        let shared = Arc::downgrade(&self.shared);
        let path = path.to_string();
        self.shared.queue.post(move || {
            let Some(shared) = shared.upgrade() else {
                return;
            };
            let props = {
                let state = shared.state.lock();
                match kind {
                    EntityKind::Manager => Some(state.manager_properties()),
                    EntityKind::Service => state.service_properties(&path),
                    EntityKind::Device => state.devices.get(&path).cloned(),
                    EntityKind::Profile => state.profiles.get(&path).map(|p| {
                        let entries: Vec<String> = p.entries.keys().cloned().collect();
                        let mut props = PropertyMap::new();
                        props.insert(profile::USER_HASH.into(), p.user_hash.as_str().into());
                        props.insert(profile::ENTRIES.into(), entries.into());
                        props
                    }),
                }
            };
            callback(props.ok_or_else(|| ServiceError::unknown_object(&path)));
        });
    }

    fn set_property(
        &self,
        kind: EntityKind,
        path: &str,
        key: &str,
        value: PropertyValue,
        callback: ResultCallback,
    ) {
        let shared = Arc::downgrade(&self.shared);
        let path = path.to_string();
        let key = key.to_string();
        self.shared.queue.post(move || {
            let Some(shared) = shared.upgrade() else {
                return;
            };
            let mut state = shared.state.lock();
            if let Some(err) = state.pending_failure.take() {
                drop(state);
                callback(Err(err));
                return;
            }
            let found = match kind {
                EntityKind::Manager => {
                    shared.set_manager_property(&mut state, &key, value);
                    true
                }
                EntityKind::Service => shared.set_service_property(&mut state, &path, &key, value),
                EntityKind::Device => shared.set_device_property(&mut state, &path, &key, value),
                EntityKind::Profile => false,
            };
            drop(state);
            if found {
                shared.post_result(callback, Ok(()));
            } else {
                shared.post_result(callback, Err(ServiceError::unknown_object(&path)));
            }
        });
    }

    fn enable_technology(&self, technology: &str, callback: ResultCallback) {
        let shared = Arc::downgrade(&self.shared);
        let technology = technology.to_string();
        self.shared.queue.post(move || {
            if let Some(shared) = shared.upgrade() {
                shared.set_technology_enabled(&technology, true, callback);
            }
        });
    }

    fn disable_technology(&self, technology: &str, callback: ResultCallback) {
        let shared = Arc::downgrade(&self.shared);
        let technology = technology.to_string();
        self.shared.queue.post(move || {
            if let Some(shared) = shared.upgrade() {
                shared.set_technology_enabled(&technology, false, callback);
            }
        });
    }

    fn request_scan(&self, technology: &str, callback: ResultCallback) {
        let shared = Arc::downgrade(&self.shared);
        let technology = technology.to_string();
        self.shared.queue.post(move || {
            let Some(shared) = shared.upgrade() else {
                return;
            };
            let mut state = shared.state.lock();
            if let Some(err) = state.pending_failure.take() {
                drop(state);
                callback(Err(err));
                return;
            }
            let paths = Shared::device_paths_of_type(&state, &technology);
            for path in &paths {
                shared.set_device_property(&mut state, path, device::SCANNING, true.into());
            }
            drop(state);

            // Scan results land one turn later
            let finished = Arc::downgrade(&shared);
            shared.queue.post(move || {
                let Some(shared) = finished.upgrade() else {
                    return;
                };
                let mut state = shared.state.lock();
                for path in &paths {
                    shared.set_device_property(&mut state, path, device::SCANNING, false.into());
                }
                drop(state);
                callback(Ok(()));
            });
        });
    }

    fn connect_to_best_services(&self, callback: ResultCallback) {
        let shared = Arc::downgrade(&self.shared);
        self.shared.queue.post(move || {
            let Some(shared) = shared.upgrade() else {
                return;
            };
            let mut state = shared.state.lock();
            if let Some(err) = state.pending_failure.take() {
                drop(state);
                callback(Err(err));
                return;
            }
            if let Some(path) = state.best_service.clone() {
                shared.set_service_property(
                    &mut state,
                    &path,
                    service::STATE,
                    state::ONLINE.into(),
                );
            }
            drop(state);
            shared.post_result(callback, Ok(()));
        });
    }

    fn subscribe(&self, listener: Weak<dyn PropertyChangedListener>) -> SubscriptionId {
        let mut state = self.shared.state.lock();
        state.next_subscription += 1;
        let id = SubscriptionId(state.next_subscription);
        state.listeners.push((id, listener));
        debug!(id = id.0, "listener subscribed to fake network service");
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        let mut state = self.shared.state.lock();
        state.listeners.retain(|(existing, _)| *existing != id);
        debug!(id = id.0, "listener unsubscribed from fake network service");
    }
}
