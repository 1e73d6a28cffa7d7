//! Typed view of a network device

use network_service::keys::device;
use property_store::{update_bool, update_string, Entity, PropertyValue};
use serde::{Deserialize, Serialize};

use super::NetworkTypePattern;

/// State of one network device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    /// Device path
    pub path: String,
    pub name: String,
    /// Wire type name
    #[serde(rename = "type")]
    pub device_type: String,
    /// Kernel interface name
    pub interface: String,
    /// Hardware address
    pub mac_address: String,
    pub powered: bool,
    /// A scan is in progress
    pub scanning: bool,
}

impl DeviceState {
    pub fn matches(&self, pattern: NetworkTypePattern) -> bool {
        pattern.matches_type(&self.device_type)
    }
}

impl Entity for DeviceState {
    const KIND: &'static str = "device";
    const REQUIRED_KEYS: &'static [&'static str] = &[device::TYPE];

    fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            name: String::new(),
            device_type: String::new(),
            interface: String::new(),
            mac_address: String::new(),
            powered: false,
            scanning: false,
        }
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn property_changed(&mut self, key: &str, value: &PropertyValue) -> bool {
        match key {
            device::NAME => update_string(&mut self.name, value),
            device::TYPE => update_string(&mut self.device_type, value),
            device::INTERFACE => update_string(&mut self.interface, value),
            device::ADDRESS => update_string(&mut self.mac_address, value),
            device::POWERED => update_bool(&mut self.powered, value),
            device::SCANNING => update_bool(&mut self.scanning, value),
            _ => false,
        }
    }
}
