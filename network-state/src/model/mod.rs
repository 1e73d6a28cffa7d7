//! Data model for network state

mod connection_state;
mod device;
mod favorite;
mod network;
mod type_pattern;

pub use connection_state::ConnectionState;
pub use device::DeviceState;
pub use favorite::FavoriteState;
pub use network::NetworkState;
pub use type_pattern::NetworkTypePattern;
