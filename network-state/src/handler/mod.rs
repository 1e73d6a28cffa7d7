//! Network state aggregation
//!
//! `NetworkStateHandler` owns the typed model of networks, favorites, devices
//! and technologies. It is fed by the network service (fetch responses and
//! property-change notifications) and answers synchronous queries.
//!
//! # Architecture
//!
//! ```text
//! NetworkServiceClient ──► ingest (diff, derive) ──► NotificationBatch
//!        ▲                        │                        │
//!        └──── fetches ◄──────────┘                        ▼
//!                                                   ObserverList
//! ```
//!
//! All state sits behind one lock. Every entry point collects a [`Round`] of
//! follow-up fetches and notifications while holding it, releases it, then
//! issues the fetches and dispatches the notifications.

mod guid;
mod ingest;

use std::collections::{BTreeMap, HashMap};
use std::panic::Location;
use std::sync::{Arc, Weak};

use network_service::keys::{manager, MANAGER_PATH};
use network_service::{
    EntityKind, NetworkServiceClient, PropertyChangedListener, PropertyMap, PropertyValue,
    ServiceError, SubscriptionId,
};
use parking_lot::{Mutex, RwLock};
use property_store::PropertyStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::HandlerConfig;
use crate::error::{ErrorCallback, NetworkError};
use crate::model::{DeviceState, FavoriteState, NetworkState, NetworkTypePattern};
use crate::observer::{Notification, NotificationBatch, NetworkStateObserver, ObserverList};
use crate::requests::{ManagedType, RequestTracker};
use crate::technology::{FailureOutcome, TechnologyState, TechnologyStateTracker};

/// Everything the handler knows, guarded by one lock
pub(crate) struct HandlerState {
    networks: PropertyStore<NetworkState>,
    favorites: PropertyStore<FavoriteState>,
    devices: PropertyStore<DeviceState>,
    technologies: TechnologyStateTracker,
    requests: RequestTracker,
    /// Path of the default network; empty when there is none
    default_network_path: String,
    /// Observers have been told about `default_network_path`
    default_announced: bool,
    /// Locally assigned GUIDs of unconfigured networks, by specifier
    specifier_guids: HashMap<String, String>,
    check_portal_list: String,
    shutting_down: bool,
}

impl HandlerState {
    fn new(config: &HandlerConfig) -> Self {
        Self {
            networks: PropertyStore::new(),
            favorites: PropertyStore::new(),
            devices: PropertyStore::new(),
            technologies: TechnologyStateTracker::new(),
            requests: RequestTracker::new(config.max_observed),
            default_network_path: String::new(),
            default_announced: true,
            specifier_guids: HashMap::new(),
            check_portal_list: String::new(),
            shutting_down: false,
        }
    }
}

/// Follow-up work collected while the state lock is held
#[derive(Default)]
pub(crate) struct Round {
    notifications: NotificationBatch,
    fetches: Vec<(ManagedType, String)>,
}

impl Round {
    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }
}

/// Point-in-time copy of the handler's model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerSnapshot {
    pub default_network: Option<String>,
    pub networks: Vec<NetworkState>,
    pub favorites: Vec<FavoriteState>,
    pub devices: Vec<DeviceState>,
    pub technologies: BTreeMap<String, TechnologyState>,
    pub check_portal_list: String,
}

/// Observable aggregate of network, device and technology state
///
/// Created with [`NetworkStateHandler::new`] and started with
/// [`NetworkStateHandler::init_property_handler`]. Responses and
/// notifications are processed on whatever thread the service delivers them.
///
/// # Example
///
/// ```rust
/// use network_service::{FakeNetworkService, TaskQueue};
/// use network_state::{HandlerConfig, NetworkStateHandler, NetworkTypePattern};
/// use std::sync::Arc;
///
/// let queue = TaskQueue::new();
/// let service = FakeNetworkService::with_default_environment(queue.clone());
/// queue.run_until_idle();
///
/// let handler = NetworkStateHandler::new(Arc::new(service), HandlerConfig::default());
/// handler.init_property_handler();
/// queue.run_until_idle();
///
/// let wifi = handler.connected_network_by_type(NetworkTypePattern::WIFI).unwrap();
/// assert_eq!(wifi.path, "wifi1");
/// assert_eq!(handler.default_network().unwrap().path, "eth1");
/// ```
pub struct NetworkStateHandler {
    client: Arc<dyn NetworkServiceClient>,
    config: HandlerConfig,
    state: RwLock<HandlerState>,
    observers: ObserverList<dyn NetworkStateObserver>,
    subscription: Mutex<Option<SubscriptionId>>,
    weak_self: Weak<NetworkStateHandler>,
}

impl NetworkStateHandler {
    /// Create a handler; nothing is requested until `init_property_handler`
    pub fn new(client: Arc<dyn NetworkServiceClient>, config: HandlerConfig) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            client,
            state: RwLock::new(HandlerState::new(&config)),
            config,
            observers: ObserverList::new(),
            subscription: Mutex::new(None),
            weak_self: weak_self.clone(),
        })
    }

    /// Subscribe to the service and request the manager's properties
    pub fn init_property_handler(&self) {
        {
            let mut subscription = self.subscription.lock();
            if subscription.is_none() {
                let listener: Weak<dyn PropertyChangedListener> = self.weak_self.clone();
                *subscription = Some(self.client.subscribe(listener));
            }
        }
        info!(max_observed = self.config.max_observed, "network state handler initializing");
        self.update_manager_properties();

        if let Some(list) = &self.config.check_portal_list {
            self.set_check_portal_list(list);
        }
    }

    /// Notify observers, drop them, and stop listening to the service
    pub fn shutdown(&self) {
        {
            let mut state = self.state.write();
            if state.shutting_down {
                return;
            }
            state.shutting_down = true;
        }
        info!("network state handler shutting down");

        let mut batch = NotificationBatch::new();
        batch.push(Notification::ShuttingDown);
        self.observers.dispatch(&batch);
        self.observers.clear();

        if let Some(id) = self.subscription.lock().take() {
            self.client.unsubscribe(id);
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.state.read().shutting_down
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    // ========================================================================
    // Observers
    // ========================================================================

    /// Register an observer; the caller's location is kept for diagnostics
    #[track_caller]
    pub fn add_observer(&self, observer: Arc<dyn NetworkStateObserver>) {
        self.observers.add(observer, Location::caller());
    }

    #[track_caller]
    pub fn remove_observer(&self, observer: &Arc<dyn NetworkStateObserver>) {
        self.observers.remove(observer, Location::caller());
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    // ========================================================================
    // Networks
    // ========================================================================

    /// Look up a listed network by path
    ///
    /// Networks whose properties have not arrived, or arrived malformed, are
    /// not returned.
    pub fn get_network_state(&self, path: &str) -> Option<NetworkState> {
        self.state.read().networks.get_received(path).cloned()
    }

    /// Look up a network, optionally only if it is configured in a profile
    pub fn get_network_state_from_service_path(
        &self,
        path: &str,
        configured_only: bool,
    ) -> Option<NetworkState> {
        self.get_network_state(path)
            .filter(|network| !configured_only || network.is_in_profile())
    }

    /// The default network, if one is set and listed
    pub fn default_network(&self) -> Option<NetworkState> {
        let state = self.state.read();
        if state.default_network_path.is_empty() {
            return None;
        }
        state.networks.get_received(&state.default_network_path).cloned()
    }

    /// Networks matching `pattern`, in the service's priority order
    pub fn get_network_list(&self, pattern: NetworkTypePattern) -> Vec<NetworkState> {
        self.state
            .read()
            .networks
            .iter_received()
            .filter(|network| network.matches(pattern))
            .cloned()
            .collect()
    }

    pub fn connected_network_by_type(&self, pattern: NetworkTypePattern) -> Option<NetworkState> {
        self.find_network(|network| network.is_connected_state() && network.matches(pattern))
    }

    pub fn connecting_network_by_type(&self, pattern: NetworkTypePattern) -> Option<NetworkState> {
        self.find_network(|network| network.is_connecting_state() && network.matches(pattern))
    }

    pub fn first_network_by_type(&self, pattern: NetworkTypePattern) -> Option<NetworkState> {
        self.find_network(|network| network.matches(pattern))
    }

    fn find_network(&self, predicate: impl Fn(&NetworkState) -> bool) -> Option<NetworkState> {
        self.state
            .read()
            .networks
            .iter_received()
            .find(|network| predicate(network))
            .cloned()
    }

    /// Refetch one network; observers get `network_properties_updated` for
    /// it even if nothing changed
    pub fn request_update_for_network(&self, path: &str) {
        let mut round = Round::default();
        {
            let mut state = self.state.write();
            self.request_update_locked(&mut state, &mut round, path);
        }
        self.finish(round);
    }

    /// Refetch the manager's properties and everything they list
    pub fn update_manager_properties(&self) {
        let weak = self.weak_self.clone();
        self.client
            .get_manager_properties(Box::new(move |result: Result<PropertyMap, ServiceError>| {
                if let Some(handler) = weak.upgrade() {
                    handler.manager_properties_received(result);
                }
            }));
    }

    // ========================================================================
    // Favorites
    // ========================================================================

    /// Visible and profile-only entries matching `pattern`
    pub fn get_favorite_list(&self, pattern: NetworkTypePattern) -> Vec<FavoriteState> {
        self.state
            .read()
            .favorites
            .iter_received()
            .filter(|favorite| favorite.matches(pattern))
            .cloned()
            .collect()
    }

    /// Only entries configured in a profile
    pub fn get_configured_favorite_list(&self, pattern: NetworkTypePattern) -> Vec<FavoriteState> {
        self.get_favorite_list(pattern)
            .into_iter()
            .filter(FavoriteState::is_in_profile)
            .collect()
    }

    pub fn get_favorite_state_from_service_path(
        &self,
        path: &str,
        configured_only: bool,
    ) -> Option<FavoriteState> {
        self.state
            .read()
            .favorites
            .get(path)
            .filter(|favorite| !configured_only || favorite.is_in_profile())
            .cloned()
    }

    pub fn get_favorite_state_from_guid(&self, guid: &str) -> Option<FavoriteState> {
        if guid.is_empty() {
            return None;
        }
        self.state
            .read()
            .favorites
            .iter()
            .find(|favorite| favorite.guid == guid)
            .cloned()
    }

    // ========================================================================
    // Devices
    // ========================================================================

    pub fn get_device_state(&self, path: &str) -> Option<DeviceState> {
        self.state.read().devices.get_received(path).cloned()
    }

    pub fn get_device_list(&self, pattern: NetworkTypePattern) -> Vec<DeviceState> {
        self.state
            .read()
            .devices
            .iter_received()
            .filter(|device| device.matches(pattern))
            .cloned()
            .collect()
    }

    pub fn get_device_state_by_type(&self, pattern: NetworkTypePattern) -> Option<DeviceState> {
        self.state
            .read()
            .devices
            .iter_received()
            .find(|device| device.matches(pattern))
            .cloned()
    }

    /// Whether any device matching `pattern` is scanning
    pub fn get_scanning_by_type(&self, pattern: NetworkTypePattern) -> bool {
        self.state
            .read()
            .devices
            .iter_received()
            .any(|device| device.matches(pattern) && device.scanning)
    }

    /// Ask every device to scan; completion is reported via `scan_completed`
    pub fn request_scan(&self) {
        info!("requesting network scan");
        self.client.request_scan(
            "",
            Box::new(|result: Result<(), ServiceError>| {
                if let Err(err) = result {
                    warn!(%err, "scan request failed");
                }
            }),
        );
    }

    // ========================================================================
    // Technologies
    // ========================================================================

    /// Technology a pattern refers to for state queries
    ///
    /// WiMAX is only chosen for a broader pattern when it is available, so
    /// "mobile" falls back to cellular.
    fn technology_for_pattern(
        technologies: &TechnologyStateTracker,
        pattern: NetworkTypePattern,
    ) -> Option<&'static str> {
        use network_service::keys::types;

        if pattern.matches_pattern(NetworkTypePattern::ETHERNET) {
            Some(types::ETHERNET)
        } else if pattern.matches_pattern(NetworkTypePattern::WIFI) {
            Some(types::WIFI)
        } else if pattern == NetworkTypePattern::WIMAX
            || (pattern.matches_pattern(NetworkTypePattern::WIMAX)
                && technologies.is_available(types::WIMAX))
        {
            Some(types::WIMAX)
        } else if pattern.matches_pattern(NetworkTypePattern::CELLULAR) {
            Some(types::CELLULAR)
        } else if pattern.matches_pattern(NetworkTypePattern::BLUETOOTH) {
            Some(types::BLUETOOTH)
        } else if pattern.matches_pattern(NetworkTypePattern::VPN) {
            Some(types::VPN)
        } else {
            None
        }
    }

    pub fn get_technology_state(&self, pattern: NetworkTypePattern) -> TechnologyState {
        let state = self.state.read();
        match Self::technology_for_pattern(&state.technologies, pattern) {
            Some(technology) => state.technologies.state(technology),
            None => TechnologyState::Unavailable,
        }
    }

    pub fn is_technology_available(&self, pattern: NetworkTypePattern) -> bool {
        let state = self.state.read();
        Self::technology_for_pattern(&state.technologies, pattern)
            .map(|technology| state.technologies.is_available(technology))
            .unwrap_or(false)
    }

    pub fn is_technology_enabled(&self, pattern: NetworkTypePattern) -> bool {
        let state = self.state.read();
        Self::technology_for_pattern(&state.technologies, pattern)
            .map(|technology| state.technologies.is_enabled(technology))
            .unwrap_or(false)
    }

    pub fn is_technology_enabling(&self, pattern: NetworkTypePattern) -> bool {
        let state = self.state.read();
        Self::technology_for_pattern(&state.technologies, pattern)
            .map(|technology| state.technologies.is_enabling(technology))
            .unwrap_or(false)
    }

    /// Enable or disable every available technology in `pattern`
    ///
    /// The local state changes immediately and observers get one
    /// `device_list_changed`; the service confirms later. With no available
    /// technology in the pattern, `error_callback` receives
    /// [`NetworkError::TechnologyNotFound`] and nothing else happens.
    pub fn set_technology_enabled(
        &self,
        pattern: NetworkTypePattern,
        enabled: bool,
        error_callback: Option<ErrorCallback>,
    ) {
        let mut round = Round::default();
        let mut requests = Vec::new();
        {
            let mut state = self.state.write();
            for technology in pattern.technologies() {
                if !state.technologies.is_available(technology) {
                    continue;
                }
                let sequence = if enabled {
                    state.technologies.begin_enable(technology)
                } else {
                    state.technologies.begin_disable(technology)
                };
                info!(technology, enabled, sequence, "setting technology enabled");
                requests.push((technology, sequence));
            }
            if !requests.is_empty() {
                round.notify(Notification::DeviceListChanged);
            }
        }

        if requests.is_empty() {
            warn!(%pattern, "no available technology to set enabled");
            if let Some(callback) = error_callback {
                callback(NetworkError::TechnologyNotFound {
                    pattern: pattern.to_string(),
                });
            }
            return;
        }

        for (technology, sequence) in requests {
            let weak = self.weak_self.clone();
            let callback = error_callback.clone();
            let on_result = Box::new(move |result: Result<(), ServiceError>| {
                if let (Err(err), Some(handler)) = (result, weak.upgrade()) {
                    handler.technology_request_failed(technology, sequence, enabled, err, callback);
                }
            });
            if enabled {
                self.client.enable_technology(technology, on_result);
            } else {
                self.client.disable_technology(technology, on_result);
            }
        }
        self.finish(round);
    }

    fn technology_request_failed(
        &self,
        technology: &str,
        sequence: u64,
        enabling: bool,
        err: ServiceError,
        error_callback: Option<ErrorCallback>,
    ) {
        warn!(technology, enabling, %err, "technology request failed");
        let discard_stale = self.config.discard_stale_technology_responses;
        let mut round = Round::default();
        let outcome = {
            let mut state = self.state.write();
            let outcome = if enabling {
                state.technologies.enable_failed(technology, sequence, discard_stale)
            } else {
                state.technologies.disable_failed(technology, sequence, discard_stale)
            };
            if outcome == FailureOutcome::Cleared {
                round.notify(Notification::DeviceListChanged);
            }
            outcome
        };
        if outcome == FailureOutcome::Stale {
            debug!(technology, sequence, "ignoring failure of a superseded request");
        }
        self.finish(round);

        // The disable was applied locally; resync with the service's lists
        if !enabling && outcome != FailureOutcome::Stale {
            self.update_manager_properties();
        }
        if let Some(callback) = error_callback {
            callback(NetworkError::from(err));
        }
    }

    // ========================================================================
    // Manager settings
    // ========================================================================

    /// Technologies for which captive-portal checks run
    pub fn check_portal_list(&self) -> String {
        self.state.read().check_portal_list.clone()
    }

    /// Push a new portal-check list to the service
    pub fn set_check_portal_list(&self, list: &str) {
        info!(list, "setting check portal list");
        self.client.set_property(
            EntityKind::Manager,
            MANAGER_PATH,
            manager::CHECK_PORTAL_LIST,
            PropertyValue::from(list),
            Box::new(|result: Result<(), ServiceError>| {
                if let Err(err) = result {
                    warn!(%err, "failed to set check portal list");
                }
            }),
        );
    }

    /// Ask the service to connect to the best available services
    pub fn connect_to_best_services(&self, error_callback: Option<ErrorCallback>) {
        info!("connecting to best services");
        self.client
            .connect_to_best_services(Box::new(move |result: Result<(), ServiceError>| {
                if let Err(err) = result {
                    warn!(%err, "connect to best services failed");
                    if let Some(callback) = error_callback {
                        callback(NetworkError::from(err));
                    }
                }
            }));
    }

    // ========================================================================
    // Export
    // ========================================================================

    pub fn snapshot(&self) -> HandlerSnapshot {
        let state = self.state.read();
        let technologies = state
            .technologies
            .available_technologies()
            .into_iter()
            .map(|technology| {
                let technology_state = state.technologies.state(&technology);
                (technology, technology_state)
            })
            .collect();
        HandlerSnapshot {
            default_network: Some(state.default_network_path.clone()).filter(|p| !p.is_empty()),
            networks: state.networks.iter_received().cloned().collect(),
            favorites: state.favorites.iter_received().cloned().collect(),
            devices: state.devices.iter_received().cloned().collect(),
            technologies,
            check_portal_list: state.check_portal_list.clone(),
        }
    }

    /// Pretty-printed JSON of [`NetworkStateHandler::snapshot`]
    pub fn snapshot_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }

    // ========================================================================
    // Round plumbing
    // ========================================================================

    /// Issue collected fetches, then deliver collected notifications
    fn finish(&self, round: Round) {
        for (managed_type, path) in round.fetches {
            self.fetch_properties(managed_type, path);
        }
        if !round.notifications.is_empty() {
            self.observers.dispatch(&round.notifications);
        }
    }

    fn fetch_properties(&self, managed_type: ManagedType, path: String) {
        debug!(%managed_type, path, "requesting properties");
        let weak = self.weak_self.clone();
        let kind = managed_type.entity_kind();
        let request_path = path.clone();
        self.client.get_properties(
            kind,
            &request_path,
            Box::new(move |result: Result<PropertyMap, ServiceError>| {
                if let Some(handler) = weak.upgrade() {
                    handler.properties_received(managed_type, &path, result);
                }
            }),
        );
    }
}

impl std::fmt::Debug for NetworkStateHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("NetworkStateHandler")
            .field("networks", &state.networks.len())
            .field("favorites", &state.favorites.len())
            .field("devices", &state.devices.len())
            .field("default_network", &state.default_network_path)
            .field("observers", &self.observers.len())
            .finish()
    }
}
