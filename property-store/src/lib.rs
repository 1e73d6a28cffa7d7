//! Path-keyed Entity Store
//!
//! Ordered storage for the entities a network service reports, with per-key
//! change detection so that identical resubmissions are no-ops.
//!
//! # Features
//!
//! - **Wire Values**: `PropertyValue` models the service's dictionary values
//! - **Typed Entities**: `Entity` maps dictionary keys onto struct fields
//! - **Change Detection**: updates report exactly which keys changed
//! - **Ordered Membership**: lists keep the service's priority order
//!
//! # Quick Start
//!
//! ```rust
//! use property_store::{property_map, update_string, Entity, PropertyStore, PropertyValue};
//!
//! #[derive(Clone, Debug)]
//! struct Service {
//!     path: String,
//!     kind: String,
//!     state: String,
//! }
//!
//! impl Entity for Service {
//!     const KIND: &'static str = "service";
//!     const REQUIRED_KEYS: &'static [&'static str] = &["Type"];
//!     const CONNECTION_STATE_KEY: Option<&'static str> = Some("State");
//!
//!     fn new(path: &str) -> Self {
//!         Service { path: path.to_string(), kind: String::new(), state: String::new() }
//!     }
//!
//!     fn path(&self) -> &str {
//!         &self.path
//!     }
//!
//!     fn property_changed(&mut self, key: &str, value: &PropertyValue) -> bool {
//!         match key {
//!             "Type" => update_string(&mut self.kind, value),
//!             "State" => update_string(&mut self.state, value),
//!             _ => false,
//!         }
//!     }
//! }
//!
//! let mut store = PropertyStore::<Service>::new();
//! store.update_list(&["/service/eth1"]);
//!
//! let props = property_map([
//!     ("Type", PropertyValue::from("ethernet")),
//!     ("State", PropertyValue::from("online")),
//! ]);
//! let result = store.apply_update("/service/eth1", &props).unwrap();
//! assert!(result.changed_connection_state);
//!
//! // Same dictionary again changes nothing
//! let result = store.apply_update("/service/eth1", &props).unwrap();
//! assert!(!result.changed);
//! ```
//!
//! # Architecture
//!
//! ```text
//! PropertyStore<E: Entity>
//!     │
//!     └── slots: IndexMap<path, Slot<E>>   (service list order)
//!             │
//!             ├── entity: E                (typed fields)
//!             ├── update_received: bool
//!             └── update_requested: bool
//! ```

// Modules
pub mod entity;
pub mod error;
pub mod event;
pub mod store;
pub mod value;

// Re-exports - Public API
pub use entity::{update_bool, update_int, update_str_list, update_string, Entity};
pub use error::{Result, StoreError};
pub use event::{ListUpdate, UpdateResult};
pub use store::PropertyStore;
pub use value::{property_map, PropertyMap, PropertyValue};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::entity::Entity;
    pub use crate::event::{ListUpdate, UpdateResult};
    pub use crate::store::PropertyStore;
    pub use crate::value::{PropertyMap, PropertyValue};
}
