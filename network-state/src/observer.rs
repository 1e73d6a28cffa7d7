//! Observer registration and notification fan-out
//!
//! Mutations collect [`Notification`]s while the handler's state is locked.
//! The lock is released before delivery, so observers may call back into the
//! handler. Each notification is delivered to a snapshot of the observer
//! list; adding or removing observers during delivery affects only later
//! notifications.

use std::panic::Location;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{trace, warn};

use crate::model::{DeviceState, NetworkState};

/// Receiver of network-state notifications
///
/// Every method has an empty default so observers implement only what they
/// need.
pub trait NetworkStateObserver: Send + Sync {
    /// Membership or order of the network or favorite lists changed
    fn network_list_changed(&self) {}

    /// Membership of the device list or any technology state changed
    fn device_list_changed(&self) {}

    /// The default network changed, or its state or an interesting property did
    fn default_network_changed(&self, _network: Option<&NetworkState>) {}

    /// A network's connection state changed
    fn network_connection_state_changed(&self, _network: &NetworkState) {}

    /// A network's properties changed or an explicit refresh completed
    fn network_properties_updated(&self, _network: &NetworkState) {}

    /// A device finished scanning
    fn scan_completed(&self, _device: &DeviceState) {}

    /// The handler is shutting down; no further notifications follow
    fn is_shutting_down(&self) {}
}

/// A notification captured during a mutation
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    NetworkListChanged,
    DeviceListChanged,
    DefaultNetworkChanged(Option<NetworkState>),
    NetworkConnectionStateChanged(NetworkState),
    NetworkPropertiesUpdated(NetworkState),
    ScanCompleted(DeviceState),
    ShuttingDown,
}

impl Notification {
    pub fn deliver(&self, observer: &dyn NetworkStateObserver) {
        match self {
            Notification::NetworkListChanged => observer.network_list_changed(),
            Notification::DeviceListChanged => observer.device_list_changed(),
            Notification::DefaultNetworkChanged(network) => {
                observer.default_network_changed(network.as_ref())
            }
            Notification::NetworkConnectionStateChanged(network) => {
                observer.network_connection_state_changed(network)
            }
            Notification::NetworkPropertiesUpdated(network) => {
                observer.network_properties_updated(network)
            }
            Notification::ScanCompleted(device) => observer.scan_completed(device),
            Notification::ShuttingDown => observer.is_shutting_down(),
        }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Notification::NetworkListChanged => "NetworkListChanged",
            Notification::DeviceListChanged => "DeviceListChanged",
            Notification::DefaultNetworkChanged(_) => "DefaultNetworkChanged",
            Notification::NetworkConnectionStateChanged(_) => "NetworkConnectionStateChanged",
            Notification::NetworkPropertiesUpdated(_) => "NetworkPropertiesUpdated",
            Notification::ScanCompleted(_) => "ScanCompleted",
            Notification::ShuttingDown => "ShuttingDown",
        }
    }
}

/// Notifications gathered during one round of processing
///
/// List-change notifications are coalesced: a round delivers at most one
/// `NetworkListChanged` and one `DeviceListChanged`, at the position of the
/// first request.
#[derive(Debug, Default)]
pub struct NotificationBatch {
    notifications: Vec<Notification>,
}

impl NotificationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notification: Notification) {
        let coalesce = matches!(
            notification,
            Notification::NetworkListChanged | Notification::DeviceListChanged
        );
        if coalesce && self.notifications.contains(&notification) {
            return;
        }
        self.notifications.push(notification);
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }
}

struct ObserverEntry<O: ?Sized> {
    observer: Arc<O>,
    added_at: &'static Location<'static>,
}

/// Ordered list of observers with snapshot iteration
pub struct ObserverList<O: ?Sized> {
    entries: Mutex<Vec<ObserverEntry<O>>>,
}

fn same_observer<O: ?Sized>(a: &Arc<O>, b: &Arc<O>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

impl<O: ?Sized> ObserverList<O> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Append an observer; returns `false` if it is already registered
    pub fn add(&self, observer: Arc<O>, location: &'static Location<'static>) -> bool {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.iter().find(|e| same_observer(&e.observer, &observer)) {
            warn!(
                added_at = %existing.added_at,
                again_at = %location,
                "observer registered twice"
            );
            return false;
        }
        trace!(added_at = %location, "observer added");
        entries.push(ObserverEntry {
            observer,
            added_at: location,
        });
        true
    }

    /// Remove an observer; returns `false` if it was not registered
    pub fn remove(&self, observer: &Arc<O>, location: &'static Location<'static>) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|e| !same_observer(&e.observer, observer));
        let removed = entries.len() != before;
        if !removed {
            warn!(removed_at = %location, "removing an observer that was never added");
        }
        removed
    }

    /// Current observers in registration order
    pub fn snapshot(&self) -> Vec<Arc<O>> {
        self.entries
            .lock()
            .iter()
            .map(|e| Arc::clone(&e.observer))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl<O: ?Sized> Default for ObserverList<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl ObserverList<dyn NetworkStateObserver> {
    /// Deliver a batch, one snapshot per notification
    pub fn dispatch(&self, batch: &NotificationBatch) {
        for notification in batch.iter() {
            let observers = self.snapshot();
            trace!(
                notification = notification.name(),
                observers = observers.len(),
                "dispatching"
            );
            for observer in observers {
                notification.deliver(observer.as_ref());
            }
        }
    }
}
