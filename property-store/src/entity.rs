//! Entity trait for typed views over property dictionaries
//!
//! An entity is the strongly typed projection of one object the network
//! service reports (a service, a device, a profile entry). The store owns the
//! entities and feeds them one key at a time; the entity decides whether the
//! key changed anything it tracks.
//!
//! # Example
//!
//! ```rust
//! use property_store::{Entity, PropertyValue};
//!
//! #[derive(Clone, Debug)]
//! struct Sensor {
//!     path: String,
//!     kind: String,
//!     level: i64,
//! }
//!
//! impl Entity for Sensor {
//!     const KIND: &'static str = "sensor";
//!     const REQUIRED_KEYS: &'static [&'static str] = &["Type"];
//!
//!     fn new(path: &str) -> Self {
//!         Sensor { path: path.to_string(), kind: String::new(), level: 0 }
//!     }
//!
//!     fn path(&self) -> &str {
//!         &self.path
//!     }
//!
//!     fn property_changed(&mut self, key: &str, value: &PropertyValue) -> bool {
//!         match key {
//!             "Type" => property_store::update_string(&mut self.kind, value),
//!             "Level" => property_store::update_int(&mut self.level, value),
//!             _ => false,
//!         }
//!     }
//! }
//! ```

use tracing::debug;

use crate::value::{PropertyMap, PropertyValue};

/// A typed entity populated from a property dictionary
///
/// Implementations must only report `true` from [`Entity::property_changed`]
/// when a tracked field actually took a new value; that is what makes
/// identical resubmissions no-ops.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Short name of the entity family, used in logs and errors
    const KIND: &'static str;

    /// Keys that must be present in a full property dictionary
    const REQUIRED_KEYS: &'static [&'static str];

    /// Key whose change is surfaced separately as a connection-state change
    const CONNECTION_STATE_KEY: Option<&'static str> = None;

    /// Create an empty entity for a newly listed path
    fn new(path: &str) -> Self;

    /// Path identifying this entity
    fn path(&self) -> &str;

    /// Apply one key, returning whether a tracked field changed
    ///
    /// Unknown keys return `false`.
    fn property_changed(&mut self, key: &str, value: &PropertyValue) -> bool;

    /// Hook run after a full dictionary has been applied key by key
    ///
    /// Returns `true` if derived fields changed.
    fn initial_properties_received(&mut self, _properties: &PropertyMap) -> bool {
        false
    }
}

// ============================================================================
// Field helpers - shared conversion used by entity implementations
// ============================================================================

/// Update a string field; a value of another shape resets it to empty
pub fn update_string(field: &mut String, value: &PropertyValue) -> bool {
    let next = match value.as_str() {
        Some(s) => s,
        None => {
            debug!(found = value.type_name(), "expected string property");
            ""
        }
    };
    if field != next {
        *field = next.to_string();
        true
    } else {
        false
    }
}

/// Update an integer field; a value of another shape resets it to zero
pub fn update_int(field: &mut i64, value: &PropertyValue) -> bool {
    let next = value.as_int().unwrap_or_else(|| {
        debug!(found = value.type_name(), "expected integer property");
        0
    });
    if *field != next {
        *field = next;
        true
    } else {
        false
    }
}

/// Update a boolean field; a value of another shape resets it to `false`
pub fn update_bool(field: &mut bool, value: &PropertyValue) -> bool {
    let next = value.as_bool().unwrap_or_else(|| {
        debug!(found = value.type_name(), "expected boolean property");
        false
    });
    if *field != next {
        *field = next;
        true
    } else {
        false
    }
}

/// Update a string-list field; a value of another shape resets it to empty
pub fn update_str_list(field: &mut Vec<String>, value: &PropertyValue) -> bool {
    let next = value.as_str_list().unwrap_or_else(|| {
        debug!(found = value.type_name(), "expected string list property");
        &[]
    });
    if field.as_slice() != next {
        *field = next.to_vec();
        true
    } else {
        false
    }
}
