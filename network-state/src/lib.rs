//! Network State Aggregation
//!
//! An observable model of networks, devices and technologies built from the
//! property dictionaries and change notifications of a connection manager.
//!
//! # Features
//!
//! - **Typed Model**: `NetworkState`, `FavoriteState` and `DeviceState` built
//!   from wire dictionaries, with identical updates suppressed
//! - **Derived State**: default network, technology enablement, stable GUIDs
//! - **Observers**: ordered fan-out with list-change coalescing per round
//! - **Change Iterator**: blocking/try/timeout iteration over changes
//! - **Explicit Lifecycle**: `NetworkHandler` owns initialize and shutdown
//!
//! # Quick Start
//!
//! ```rust
//! use network_service::{FakeNetworkService, TaskQueue};
//! use network_state::prelude::*;
//! use std::sync::Arc;
//!
//! let queue = TaskQueue::new();
//! let service = FakeNetworkService::with_default_environment(queue.clone());
//! queue.run_until_idle();
//!
//! let context = NetworkHandler::new(Arc::new(service), HandlerConfig::default());
//! let handler = context.initialize()?;
//! queue.run_until_idle();
//!
//! let default = handler.default_network().expect("default network");
//! assert_eq!(default.path, "eth1");
//! assert_eq!(default.connection_state(), ConnectionState::Online);
//!
//! let mobile = handler.first_network_by_type(NetworkTypePattern::MOBILE).expect("mobile");
//! assert_eq!(mobile.path, "cellular1");
//! assert_eq!(
//!     handler.get_technology_state(NetworkTypePattern::WIFI),
//!     TechnologyState::Enabled
//! );
//! # Ok::<(), network_state::HandlerError>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! NetworkServiceClient ──► NetworkStateHandler ──► ObserverList ──► observers
//!   (fetch, notify)          │                                   └─► ChangeIterator
//!                            ├── PropertyStore<NetworkState>
//!                            ├── PropertyStore<FavoriteState>
//!                            ├── PropertyStore<DeviceState>
//!                            ├── TechnologyStateTracker
//!                            └── RequestTracker
//! ```

// Modules
pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod iter;
pub mod logging;
pub mod model;
pub mod observer;
pub mod requests;
pub mod technology;

// Re-exports - Public API
pub use config::HandlerConfig;
pub use context::NetworkHandler;
pub use error::{ErrorCallback, HandlerError, NetworkError, Result};
pub use handler::{HandlerSnapshot, NetworkStateHandler};
pub use iter::{ChangeEvent, ChangeIterator, ChangeKind};
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};
pub use model::{ConnectionState, DeviceState, FavoriteState, NetworkState, NetworkTypePattern};
pub use observer::{Notification, NetworkStateObserver};
pub use technology::TechnologyState;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ChangeEvent, ChangeKind, ConnectionState, DeviceState, ErrorCallback, FavoriteState,
        HandlerConfig, NetworkError, NetworkHandler, NetworkState, NetworkStateHandler,
        NetworkStateObserver, NetworkTypePattern, TechnologyState,
    };
}
