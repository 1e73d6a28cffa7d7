//! Service connection states

use std::fmt;

use network_service::keys::state;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Connection state reported for a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Idle,
    Association,
    Configuration,
    Ready,
    Portal,
    Online,
    Failure,
    Disconnect,
}

impl ConnectionState {
    /// Parse a wire state; unrecognized values map to `Idle`
    pub fn from_wire(value: &str) -> Self {
        match value {
            state::IDLE => ConnectionState::Idle,
            state::ASSOCIATION => ConnectionState::Association,
            state::CONFIGURATION => ConnectionState::Configuration,
            state::READY => ConnectionState::Ready,
            state::PORTAL => ConnectionState::Portal,
            state::ONLINE => ConnectionState::Online,
            state::FAILURE => ConnectionState::Failure,
            state::DISCONNECT => ConnectionState::Disconnect,
            other => {
                debug!(state = other, "unrecognized connection state, treating as idle");
                ConnectionState::Idle
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Idle => state::IDLE,
            ConnectionState::Association => state::ASSOCIATION,
            ConnectionState::Configuration => state::CONFIGURATION,
            ConnectionState::Ready => state::READY,
            ConnectionState::Portal => state::PORTAL,
            ConnectionState::Online => state::ONLINE,
            ConnectionState::Failure => state::FAILURE,
            ConnectionState::Disconnect => state::DISCONNECT,
        }
    }

    /// Ready, Portal and Online count as connected
    pub fn is_connected(&self) -> bool {
        matches!(
            self,
            ConnectionState::Ready | ConnectionState::Portal | ConnectionState::Online
        )
    }

    pub fn is_connecting(&self) -> bool {
        matches!(
            self,
            ConnectionState::Association | ConnectionState::Configuration
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
