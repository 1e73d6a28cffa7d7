//! Network Service Boundary
//!
//! The request/notification surface between a network-state aggregator and
//! the connection manager underneath it.
//!
//! # Features
//!
//! - **Client Trait**: `NetworkServiceClient` for property fetches, property
//!   sets, technology control, scans and change subscriptions
//! - **Posted Callbacks**: `TaskQueue` runs responses in FIFO order on the
//!   thread that drains it
//! - **Fake Service**: `FakeNetworkService` models technologies, services,
//!   devices and profiles in-process for tests and demos
//!
//! # Quick Start
//!
//! ```rust
//! use network_service::{
//!     keys, FakeNetworkService, NetworkServiceClient, PropertyMap, ServiceError, TaskQueue,
//! };
//! use std::sync::{Arc, Mutex};
//!
//! let queue = TaskQueue::new();
//! let service = FakeNetworkService::with_default_environment(queue.clone());
//!
//! let services = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&services);
//! service.get_manager_properties(Box::new(move |result: Result<PropertyMap, ServiceError>| {
//!     if let Ok(props) = result {
//!         if let Some(list) = props[keys::manager::SERVICES].as_str_list() {
//!             sink.lock().unwrap().extend(list.iter().cloned());
//!         }
//!     }
//! }));
//!
//! // Nothing happens until the queue is drained
//! assert!(services.lock().unwrap().is_empty());
//! queue.run_until_idle();
//! assert_eq!(services.lock().unwrap().len(), 4);
//! ```

// Modules
pub mod client;
pub mod error;
pub mod fake;
pub mod keys;
pub mod queue;

// Re-exports - Public API
pub use client::{
    EntityKind, NetworkServiceClient, PropertiesCallback, PropertyChangedListener, ResultCallback,
    SubscriptionId,
};
pub use error::{Result, ServiceError};
pub use fake::FakeNetworkService;
pub use queue::TaskQueue;

// Re-export the wire value types so clients need only this crate
pub use property_store::{PropertyMap, PropertyValue};
