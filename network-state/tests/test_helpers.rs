//! Test helpers for network-state integration tests.
//!
//! - `TestObserver` records every notification it receives
//! - `Harness` wires a handler to a fake service running the stub environment

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use network_service::{FakeNetworkService, TaskQueue};
use network_state::{
    ConnectionState, DeviceState, ErrorCallback, HandlerConfig, NetworkError, NetworkState,
    NetworkStateHandler, NetworkStateObserver, NetworkTypePattern,
};
use parking_lot::Mutex;

#[derive(Default)]
struct Counts {
    device_list_changed: usize,
    network_list_changed: usize,
    default_network_changed: usize,
    network_count: usize,
    favorite_count: usize,
    default_network: String,
    default_network_connection_state: Option<ConnectionState>,
    connection_state_changes: HashMap<String, usize>,
    connection_states: HashMap<String, ConnectionState>,
    property_updates: HashMap<String, usize>,
    scans_completed: Vec<String>,
    shutting_down: bool,
}

/// Observer that counts notifications the way the assertions need them
///
/// Per-network counters survive `reset_change_counts`; the list and default
/// counters do not.
pub struct TestObserver {
    handler: Weak<NetworkStateHandler>,
    counts: Mutex<Counts>,
}

impl TestObserver {
    pub fn new(handler: &Arc<NetworkStateHandler>) -> Arc<Self> {
        Arc::new(Self {
            handler: Arc::downgrade(handler),
            counts: Mutex::new(Counts::default()),
        })
    }

    pub fn reset_change_counts(&self) {
        let mut counts = self.counts.lock();
        counts.device_list_changed = 0;
        counts.network_list_changed = 0;
        counts.default_network_changed = 0;
    }

    pub fn device_list_changed_count(&self) -> usize {
        self.counts.lock().device_list_changed
    }

    pub fn network_list_changed_count(&self) -> usize {
        self.counts.lock().network_list_changed
    }

    pub fn default_network_change_count(&self) -> usize {
        self.counts.lock().default_network_changed
    }

    /// Networks listed at the last list change
    pub fn network_count(&self) -> usize {
        self.counts.lock().network_count
    }

    /// Configured favorites at the last list change
    pub fn favorite_count(&self) -> usize {
        self.counts.lock().favorite_count
    }

    pub fn default_network(&self) -> String {
        self.counts.lock().default_network.clone()
    }

    pub fn default_network_connection_state(&self) -> Option<ConnectionState> {
        self.counts.lock().default_network_connection_state
    }

    pub fn connection_state_changes_for(&self, path: &str) -> usize {
        self.counts
            .lock()
            .connection_state_changes
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    pub fn connection_state_for(&self, path: &str) -> Option<ConnectionState> {
        self.counts.lock().connection_states.get(path).copied()
    }

    pub fn property_updates_for(&self, path: &str) -> usize {
        self.counts
            .lock()
            .property_updates
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    pub fn scans_completed(&self) -> Vec<String> {
        self.counts.lock().scans_completed.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.counts.lock().shutting_down
    }
}

impl NetworkStateObserver for TestObserver {
    fn network_list_changed(&self) {
        // Observers may query the handler during delivery
        let (networks, favorites) = match self.handler.upgrade() {
            Some(handler) => (
                handler.get_network_list(NetworkTypePattern::DEFAULT).len(),
                handler
                    .get_configured_favorite_list(NetworkTypePattern::DEFAULT)
                    .len(),
            ),
            None => (0, 0),
        };
        let mut counts = self.counts.lock();
        counts.network_list_changed += 1;
        counts.network_count = networks;
        counts.favorite_count = favorites;
    }

    fn device_list_changed(&self) {
        self.counts.lock().device_list_changed += 1;
    }

    fn default_network_changed(&self, network: Option<&NetworkState>) {
        let mut counts = self.counts.lock();
        counts.default_network_changed += 1;
        counts.default_network = network.map(|n| n.path.clone()).unwrap_or_default();
        counts.default_network_connection_state = network.map(NetworkState::connection_state);
    }

    fn network_connection_state_changed(&self, network: &NetworkState) {
        let mut counts = self.counts.lock();
        *counts
            .connection_state_changes
            .entry(network.path.clone())
            .or_default() += 1;
        counts
            .connection_states
            .insert(network.path.clone(), network.connection_state());
    }

    fn network_properties_updated(&self, network: &NetworkState) {
        *self
            .counts
            .lock()
            .property_updates
            .entry(network.path.clone())
            .or_default() += 1;
    }

    fn scan_completed(&self, device: &DeviceState) {
        self.counts.lock().scans_completed.push(device.path.clone());
    }

    fn is_shutting_down(&self) {
        self.counts.lock().shutting_down = true;
    }
}

/// Collects errors delivered to an [`ErrorCallback`]
#[derive(Clone, Default)]
pub struct ErrorRecorder {
    errors: Arc<Mutex<Vec<NetworkError>>>,
}

impl ErrorRecorder {
    pub fn callback(&self) -> ErrorCallback {
        let errors = Arc::clone(&self.errors);
        Arc::new(move |err: NetworkError| errors.lock().push(err))
    }

    pub fn errors(&self) -> Vec<NetworkError> {
        self.errors.lock().clone()
    }
}

/// A handler initialized against the stub environment
pub struct Harness {
    pub queue: TaskQueue,
    pub service: FakeNetworkService,
    pub handler: Arc<NetworkStateHandler>,
    pub observer: Arc<TestObserver>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(HandlerConfig::default())
    }

    pub fn with_config(config: HandlerConfig) -> Self {
        let queue = TaskQueue::new();
        let service = FakeNetworkService::with_default_environment(queue.clone());
        queue.run_until_idle();

        let handler = NetworkStateHandler::new(Arc::new(service.clone()), config);
        let observer = TestObserver::new(&handler);
        handler.add_observer(observer.clone());
        handler.init_property_handler();
        queue.run_until_idle();
        observer.reset_change_counts();

        Self {
            queue,
            service,
            handler,
            observer,
        }
    }

    pub fn run(&self) {
        self.queue.run_until_idle();
    }

    /// Refetch everything from the manager and settle
    pub fn update_manager_properties(&self) {
        self.run();
        self.handler.update_manager_properties();
        self.run();
    }
}
