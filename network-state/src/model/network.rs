//! Typed view of a live network service

use network_service::keys::service;
use property_store::{update_bool, update_int, update_string, Entity, PropertyValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ConnectionState, NetworkTypePattern};

/// State of one visible network service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkState {
    /// Service path
    pub path: String,
    /// Display name
    pub name: String,
    /// Wire type name ("ethernet", "wifi", ...)
    #[serde(rename = "type")]
    pub network_type: String,
    /// Last reported connection state; `None` before the first report
    pub connection_state: Option<ConnectionState>,
    /// Security class; empty when unset
    pub security: String,
    /// Signal strength, 0-100
    pub signal_strength: i64,
    /// Stable identifier, assigned locally when the service has none
    pub guid: String,
    /// Profile holding this service's configuration; empty if unconfigured
    pub profile_path: String,
    /// Device carrying this service
    pub device_path: String,
    /// Last connection error
    pub error: String,
    pub visible: bool,
    pub connectable: bool,
    pub auto_connect: bool,
}

impl NetworkState {
    /// Connection state, `Idle` before the first report
    pub fn connection_state(&self) -> ConnectionState {
        self.connection_state.unwrap_or(ConnectionState::Idle)
    }

    pub fn is_connected_state(&self) -> bool {
        self.connection_state().is_connected()
    }

    pub fn is_connecting_state(&self) -> bool {
        self.connection_state().is_connecting()
    }

    /// Whether the connection state moved from `previous` in a way observers
    /// care about
    ///
    /// The very first report of `Idle` is not a change.
    pub fn connection_state_changed_from(&self, previous: Option<ConnectionState>) -> bool {
        self.connection_state != previous
            && (self.connection_state != Some(ConnectionState::Idle) || previous.is_some())
    }

    /// Name and type, used to recognize an unconfigured network seen again
    pub fn specifier(&self) -> String {
        format!("{}_{}", self.name, self.network_type)
    }

    pub fn matches(&self, pattern: NetworkTypePattern) -> bool {
        pattern.matches_type(&self.network_type)
    }

    pub fn is_in_profile(&self) -> bool {
        !self.profile_path.is_empty()
    }
}

impl Entity for NetworkState {
    const KIND: &'static str = "network";
    const REQUIRED_KEYS: &'static [&'static str] = &[service::TYPE];
    const CONNECTION_STATE_KEY: Option<&'static str> = Some(service::STATE);

    fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            name: String::new(),
            network_type: String::new(),
            connection_state: None,
            security: String::new(),
            signal_strength: 0,
            guid: String::new(),
            profile_path: String::new(),
            device_path: String::new(),
            error: String::new(),
            visible: false,
            connectable: false,
            auto_connect: false,
        }
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn property_changed(&mut self, key: &str, value: &PropertyValue) -> bool {
        match key {
            service::NAME => update_string(&mut self.name, value),
            service::TYPE => update_string(&mut self.network_type, value),
            service::STATE => {
                let next = match value.as_str() {
                    Some(state) => ConnectionState::from_wire(state),
                    None => {
                        debug!(path = %self.path, found = value.type_name(), "malformed state");
                        ConnectionState::Idle
                    }
                };
                if self.connection_state != Some(next) {
                    self.connection_state = Some(next);
                    true
                } else {
                    false
                }
            }
            service::SECURITY => update_string(&mut self.security, value),
            service::SIGNAL_STRENGTH => match value.as_int() {
                Some(strength) => update_int(
                    &mut self.signal_strength,
                    &PropertyValue::Int(strength.clamp(0, 100)),
                ),
                None => update_int(&mut self.signal_strength, value),
            },
            service::GUID => update_string(&mut self.guid, value),
            service::PROFILE => update_string(&mut self.profile_path, value),
            service::DEVICE => update_string(&mut self.device_path, value),
            service::ERROR => update_string(&mut self.error, value),
            service::VISIBLE => update_bool(&mut self.visible, value),
            service::CONNECTABLE => update_bool(&mut self.connectable, value),
            service::AUTO_CONNECT => update_bool(&mut self.auto_connect, value),
            _ => false,
        }
    }
}
