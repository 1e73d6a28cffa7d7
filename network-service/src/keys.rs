//! Property names and well-known values used on the wire

/// Keys on the manager object
pub mod manager {
    pub const AVAILABLE_TECHNOLOGIES: &str = "AvailableTechnologies";
    pub const ENABLED_TECHNOLOGIES: &str = "EnabledTechnologies";
    pub const UNINITIALIZED_TECHNOLOGIES: &str = "UninitializedTechnologies";
    pub const SERVICES: &str = "Services";
    pub const SERVICE_COMPLETE_LIST: &str = "ServiceCompleteList";
    pub const DEVICES: &str = "Devices";
    pub const PROFILES: &str = "Profiles";
    pub const DEFAULT_SERVICE: &str = "DefaultService";
    pub const CHECK_PORTAL_LIST: &str = "CheckPortalList";
}

/// Keys on service objects
pub mod service {
    pub const TYPE: &str = "Type";
    pub const NAME: &str = "Name";
    pub const STATE: &str = "State";
    pub const SECURITY: &str = "Security";
    pub const SIGNAL_STRENGTH: &str = "Strength";
    pub const GUID: &str = "GUID";
    pub const PROFILE: &str = "Profile";
    pub const DEVICE: &str = "Device";
    pub const ERROR: &str = "Error";
    pub const VISIBLE: &str = "Visible";
    pub const CONNECTABLE: &str = "Connectable";
    pub const AUTO_CONNECT: &str = "AutoConnect";
    pub const WIFI_FREQUENCY_LIST: &str = "WiFi.FrequencyList";
}

/// Keys on device objects
pub mod device {
    pub const TYPE: &str = "Type";
    pub const NAME: &str = "Name";
    pub const INTERFACE: &str = "Interface";
    pub const ADDRESS: &str = "Address";
    pub const POWERED: &str = "Powered";
    pub const SCANNING: &str = "Scanning";
}

/// Keys on profile objects
pub mod profile {
    pub const USER_HASH: &str = "UserHash";
    pub const ENTRIES: &str = "Entries";
}

/// Technology and service type names
pub mod types {
    pub const ETHERNET: &str = "ethernet";
    pub const WIFI: &str = "wifi";
    pub const WIMAX: &str = "wimax";
    pub const CELLULAR: &str = "cellular";
    pub const BLUETOOTH: &str = "bluetooth";
    pub const VPN: &str = "vpn";
}

/// Service connection states
pub mod state {
    pub const IDLE: &str = "idle";
    pub const ASSOCIATION: &str = "association";
    pub const CONFIGURATION: &str = "configuration";
    pub const READY: &str = "ready";
    pub const PORTAL: &str = "portal";
    pub const ONLINE: &str = "online";
    pub const FAILURE: &str = "failure";
    pub const DISCONNECT: &str = "disconnect";
}

/// Path the manager reports when no default service exists
pub const NO_SERVICE_PATH: &str = "/";

/// Path of the manager object in property-change notifications
pub const MANAGER_PATH: &str = "/";
