//! Typed view of a configured or visible service entry

use network_service::keys::service;
use property_store::{update_bool, update_string, Entity, PropertyValue};
use serde::{Deserialize, Serialize};

use super::NetworkTypePattern;

/// An entry of the manager's complete service list
///
/// Either a visible service, a service persisted in a profile, or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteState {
    /// Service path
    pub path: String,
    pub name: String,
    #[serde(rename = "type")]
    pub network_type: String,
    pub guid: String,
    /// Profile holding this entry; empty for visible-only services
    pub profile_path: String,
    pub security: String,
    pub auto_connect: bool,
}

impl FavoriteState {
    pub fn is_in_profile(&self) -> bool {
        !self.profile_path.is_empty()
    }

    /// Name and type, used to recognize an unconfigured network seen again
    pub fn specifier(&self) -> String {
        format!("{}_{}", self.name, self.network_type)
    }

    pub fn matches(&self, pattern: NetworkTypePattern) -> bool {
        pattern.matches_type(&self.network_type)
    }
}

impl Entity for FavoriteState {
    const KIND: &'static str = "favorite";
    const REQUIRED_KEYS: &'static [&'static str] = &[service::TYPE];

    fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            name: String::new(),
            network_type: String::new(),
            guid: String::new(),
            profile_path: String::new(),
            security: String::new(),
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
            service::GUID => update_string(&mut self.guid, value),
            service::PROFILE => update_string(&mut self.profile_path, value),
            service::SECURITY => update_string(&mut self.security, value),
            service::AUTO_CONNECT => update_bool(&mut self.auto_connect, value),
            _ => false,
        }
    }
}
