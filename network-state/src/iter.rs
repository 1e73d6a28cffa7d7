//! Blocking iterator over network-state changes
//!
//! Provides various iteration patterns for consuming change events:
//! - Blocking: `recv()`, `for event in iter`
//! - Non-blocking: `try_recv()`, `try_iter()`
//! - Timeout: `recv_timeout()`, `timeout_iter()`
//!
//! The iterator registers an observer that forwards every notification into
//! an `std::sync::mpsc` channel. Dropping the iterator unregisters it.

use std::sync::{mpsc, Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::handler::NetworkStateHandler;
use crate::model::{DeviceState, NetworkState};
use crate::observer::NetworkStateObserver;

/// What kind of change an event reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    NetworkList,
    DeviceList,
    DefaultNetwork,
    ConnectionState,
    NetworkProperties,
    ScanCompleted,
    ShuttingDown,
}

/// One observed change
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// Network or device path; `None` for list changes, shutdown, and a
    /// cleared default network
    pub path: Option<String>,
    pub timestamp: Instant,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, path: Option<String>) -> Self {
        Self {
            kind,
            path,
            timestamp: Instant::now(),
        }
    }
}

/// Observer forwarding notifications into a channel
///
/// The sender is dropped on shutdown so receivers see the channel close.
struct ChannelObserver {
    tx: Mutex<Option<mpsc::Sender<ChangeEvent>>>,
}

impl ChannelObserver {
    fn send(&self, kind: ChangeKind, path: Option<&str>) {
        if let Some(tx) = self.tx.lock().as_ref() {
            // A closed receiver is cleaned up by the iterator's Drop
            let _ = tx.send(ChangeEvent::new(kind, path.map(str::to_string)));
        }
    }
}

impl NetworkStateObserver for ChannelObserver {
    fn network_list_changed(&self) {
        self.send(ChangeKind::NetworkList, None);
    }

    fn device_list_changed(&self) {
        self.send(ChangeKind::DeviceList, None);
    }

    fn default_network_changed(&self, network: Option<&NetworkState>) {
        self.send(ChangeKind::DefaultNetwork, network.map(|n| n.path.as_str()));
    }

    fn network_connection_state_changed(&self, network: &NetworkState) {
        self.send(ChangeKind::ConnectionState, Some(&network.path));
    }

    fn network_properties_updated(&self, network: &NetworkState) {
        self.send(ChangeKind::NetworkProperties, Some(&network.path));
    }

    fn scan_completed(&self, device: &DeviceState) {
        self.send(ChangeKind::ScanCompleted, Some(&device.path));
    }

    fn is_shutting_down(&self) {
        self.send(ChangeKind::ShuttingDown, None);
        self.tx.lock().take();
    }
}

/// Blocking iterator over change events
///
/// # Example
///
/// ```rust
/// use network_service::{FakeNetworkService, TaskQueue};
/// use network_state::{ChangeKind, HandlerConfig, NetworkStateHandler};
/// use std::sync::Arc;
///
/// let queue = TaskQueue::new();
/// let service = FakeNetworkService::with_default_environment(queue.clone());
/// queue.run_until_idle();
///
/// let handler = NetworkStateHandler::new(Arc::new(service), HandlerConfig::default());
/// let changes = handler.changes();
/// handler.init_property_handler();
/// queue.run_until_idle();
///
/// let kinds: Vec<ChangeKind> = changes.try_iter().map(|event| event.kind).collect();
/// assert!(kinds.contains(&ChangeKind::NetworkList));
/// ```
pub struct ChangeIterator {
    rx: mpsc::Receiver<ChangeEvent>,
    handler: Weak<NetworkStateHandler>,
    observer: Arc<dyn NetworkStateObserver>,
}

impl ChangeIterator {
    /// Block until the next event is available
    ///
    /// Returns `None` once the handler has shut down and all events are read.
    pub fn recv(&self) -> Option<ChangeEvent> {
        self.rx.recv().ok()
    }

    /// Block until the next event or timeout expires
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ChangeEvent> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }

    /// Non-blocking iterator over currently queued events
    pub fn try_iter(&self) -> TryIter<'_> {
        TryIter { inner: self }
    }

    /// Blocking iterator that stops after `timeout` passes without an event
    pub fn timeout_iter(&self, timeout: Duration) -> TimeoutIter<'_> {
        TimeoutIter {
            inner: self,
            timeout,
        }
    }
}

impl Iterator for ChangeIterator {
    type Item = ChangeEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv()
    }
}

impl Drop for ChangeIterator {
    fn drop(&mut self) {
        match self.handler.upgrade() {
            Some(handler) if !handler.is_shutting_down() => handler.remove_observer(&self.observer),
            _ => {}
        }
    }
}

/// Non-blocking iterator over currently available events
pub struct TryIter<'a> {
    inner: &'a ChangeIterator,
}

impl Iterator for TryIter<'_> {
    type Item = ChangeEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.try_recv()
    }
}

/// Blocking iterator with timeout
pub struct TimeoutIter<'a> {
    inner: &'a ChangeIterator,
    timeout: Duration,
}

impl Iterator for TimeoutIter<'_> {
    type Item = ChangeEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.recv_timeout(self.timeout)
    }
}

impl NetworkStateHandler {
    /// Subscribe to changes through a blocking iterator
    #[track_caller]
    pub fn changes(self: &Arc<Self>) -> ChangeIterator {
        let (tx, rx) = mpsc::channel();
        let observer: Arc<dyn NetworkStateObserver> = Arc::new(ChannelObserver {
            tx: Mutex::new(Some(tx)),
        });
        self.add_observer(Arc::clone(&observer));
        ChangeIterator {
            rx,
            handler: Arc::downgrade(self),
            observer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HandlerConfig;
    use network_service::{FakeNetworkService, TaskQueue};

    fn started() -> (TaskQueue, FakeNetworkService, Arc<NetworkStateHandler>) {
        let queue = TaskQueue::new();
        let service = FakeNetworkService::with_default_environment(queue.clone());
        queue.run_until_idle();
        let handler = NetworkStateHandler::new(Arc::new(service.clone()), HandlerConfig::default());
        handler.init_property_handler();
        queue.run_until_idle();
        (queue, service, handler)
    }

    #[test]
    fn test_try_recv_empty() {
        let (_queue, _service, handler) = started();
        let changes = handler.changes();
        assert!(changes.try_recv().is_none());
    }

    #[test]
    fn test_connection_change_is_forwarded() {
        let (queue, service, handler) = started();
        let changes = handler.changes();

        service.set_service_property("wifi2", "State", "online");
        queue.run_until_idle();

        let events: Vec<ChangeEvent> = changes.try_iter().collect();
        assert!(events
            .iter()
            .any(|e| e.kind == ChangeKind::ConnectionState && e.path.as_deref() == Some("wifi2")));
    }

    #[test]
    fn test_recv_timeout_without_events() {
        let (_queue, _service, handler) = started();
        let changes = handler.changes();

        let start = Instant::now();
        assert!(changes.recv_timeout(Duration::from_millis(50)).is_none());
        assert!(start.elapsed() >= Duration::from_millis(45));
    }

    #[test]
    fn test_drop_unregisters() {
        let (_queue, _service, handler) = started();
        let before = handler.observer_count();
        let changes = handler.changes();
        assert_eq!(handler.observer_count(), before + 1);
        drop(changes);
        assert_eq!(handler.observer_count(), before);
    }

    #[test]
    fn test_shutdown_closes_channel() {
        let (_queue, _service, handler) = started();
        let changes = handler.changes();

        handler.shutdown();

        let event = changes.recv().expect("shutdown event");
        assert_eq!(event.kind, ChangeKind::ShuttingDown);
        assert!(changes.recv().is_none());
    }
}
