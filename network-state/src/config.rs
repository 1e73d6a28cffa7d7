//! Configuration for the network-state handler
//!
//! Controls how many entities are watched, how technology responses are
//! reconciled, and which logging mode the context installs.

use crate::error::{HandlerError, Result};
use crate::logging::{self, LoggingMode};

/// Configuration for [`crate::NetworkStateHandler`] and [`crate::NetworkHandler`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Maximum number of services and of devices subscribed for per-entity
    /// property changes; changes for entities past the limit are ignored
    /// Default: 100
    pub max_observed: usize,

    /// Ignore a failed enable response when a newer request for the same
    /// technology has been issued since
    /// Default: false (last response wins)
    pub discard_stale_technology_responses: bool,

    /// Portal-check technology list pushed to the service on initialization
    /// Default: None (keep the service's list)
    pub check_portal_list: Option<String>,

    /// Logging mode installed by [`crate::NetworkHandler::initialize`]
    /// Default: Silent
    pub log_mode: LoggingMode,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            max_observed: 100,
            discard_stale_technology_responses: false,
            check_portal_list: None,
            log_mode: LoggingMode::Silent,
        }
    }
}

impl HandlerConfig {
    /// Create a HandlerConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a HandlerConfig that drops superseded technology failures
    pub fn strict_technology() -> Self {
        Self {
            discard_stale_technology_responses: true,
            ..Default::default()
        }
    }

    /// Create a HandlerConfig with verbose logging for development
    pub fn development() -> Self {
        Self {
            log_mode: LoggingMode::Development,
            ..Default::default()
        }
    }

    /// Build a configuration from environment variables
    ///
    /// - `NETSTATE_MAX_OBSERVED`: positive integer
    /// - `NETSTATE_DISCARD_STALE`: "1"/"true" or "0"/"false"
    /// - `NETSTATE_CHECK_PORTAL_LIST`: comma-separated technologies
    /// - `NETSTATE_LOG_MODE`: see [`logging::mode_from_env`]
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("NETSTATE_MAX_OBSERVED") {
            config.max_observed = value.trim().parse().map_err(|_| {
                HandlerError::InvalidConfig(format!("NETSTATE_MAX_OBSERVED={value}"))
            })?;
        }

        if let Ok(value) = std::env::var("NETSTATE_DISCARD_STALE") {
            config.discard_stale_technology_responses = match value.trim() {
                "1" | "true" => true,
                "0" | "false" => false,
                _ => {
                    return Err(HandlerError::InvalidConfig(format!(
                        "NETSTATE_DISCARD_STALE={value}"
                    )))
                }
            };
        }

        if let Ok(value) = std::env::var("NETSTATE_CHECK_PORTAL_LIST") {
            config.check_portal_list = Some(value);
        }

        config.log_mode = logging::mode_from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        if self.max_observed == 0 {
            return Err(HandlerError::InvalidConfig(
                "max_observed must be greater than 0".to_string(),
            ));
        }

        if let Some(list) = &self.check_portal_list {
            if list.split(',').any(|technology| technology.trim().is_empty()) && !list.is_empty() {
                return Err(HandlerError::InvalidConfig(format!(
                    "check_portal_list has an empty entry: {list:?}"
                )));
            }
        }

        Ok(())
    }

    // Builder pattern methods for fluent configuration

    pub fn with_max_observed(mut self, max_observed: usize) -> Self {
        self.max_observed = max_observed;
        self
    }

    pub fn with_discard_stale_technology_responses(mut self, discard: bool) -> Self {
        self.discard_stale_technology_responses = discard;
        self
    }

    pub fn with_check_portal_list(mut self, list: impl Into<String>) -> Self {
        self.check_portal_list = Some(list.into());
        self
    }

    pub fn with_log_mode(mut self, mode: LoggingMode) -> Self {
        self.log_mode = mode;
        self
    }
}
