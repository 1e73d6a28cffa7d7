//! The boundary between the aggregator and the network service
//!
//! Every request returns immediately. Results arrive later through the boxed
//! callback, and unsolicited changes arrive through the subscribed
//! [`PropertyChangedListener`]. Implementations decide where callbacks run;
//! the in-process fake posts them to a [`crate::TaskQueue`].

use std::fmt;
use std::sync::Weak;

use property_store::{PropertyMap, PropertyValue};

use crate::error::Result;

/// Which kind of object a path or notification refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Manager,
    Service,
    Device,
    Profile,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Manager => "manager",
            EntityKind::Service => "service",
            EntityKind::Device => "device",
            EntityKind::Profile => "profile",
        };
        f.write_str(name)
    }
}

/// Receives a property dictionary or the service's error
pub type PropertiesCallback = Box<dyn FnOnce(Result<PropertyMap>) + Send>;

/// Receives the outcome of a request that returns no data
pub type ResultCallback = Box<dyn FnOnce(Result<()>) + Send>;

/// Handle returned by [`NetworkServiceClient::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Receiver for unsolicited property changes
///
/// Manager changes arrive with [`EntityKind::Manager`] and the manager path.
pub trait PropertyChangedListener: Send + Sync {
    fn on_property_changed(&self, kind: EntityKind, path: &str, key: &str, value: &PropertyValue);
}

/// Requests the aggregator issues against the network service
pub trait NetworkServiceClient: Send + Sync {
    /// Fetch the manager's full property dictionary
    fn get_manager_properties(&self, callback: PropertiesCallback);

    /// Fetch the full property dictionary of one object
    fn get_properties(&self, kind: EntityKind, path: &str, callback: PropertiesCallback);

    /// Change one property of an object
    fn set_property(
        &self,
        kind: EntityKind,
        path: &str,
        key: &str,
        value: PropertyValue,
        callback: ResultCallback,
    );

    fn enable_technology(&self, technology: &str, callback: ResultCallback);

    fn disable_technology(&self, technology: &str, callback: ResultCallback);

    /// Ask devices of a technology to scan; an empty technology scans all
    fn request_scan(&self, technology: &str, callback: ResultCallback);

    fn connect_to_best_services(&self, callback: ResultCallback);

    /// Register for property changes on every object
    ///
    /// The listener is held weakly; a dropped listener is skipped.
    fn subscribe(&self, listener: Weak<dyn PropertyChangedListener>) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_display() {
        assert_eq!(EntityKind::Manager.to_string(), "manager");
        assert_eq!(EntityKind::Service.to_string(), "service");
        assert_eq!(EntityKind::Device.to_string(), "device");
        assert_eq!(EntityKind::Profile.to_string(), "profile");
    }
}
