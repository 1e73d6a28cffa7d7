//! Processing of fetch responses and property-change notifications

use network_service::keys::{device, manager, service, NO_SERVICE_PATH};
use network_service::{
    EntityKind, PropertyChangedListener, PropertyMap, PropertyValue, ServiceError,
};
use tracing::{debug, info, trace, warn};

use super::{HandlerState, NetworkStateHandler, Round};
use crate::model::ConnectionState;
use crate::observer::Notification;
use crate::requests::ManagedType;

fn string_list(key: &str, value: &PropertyValue) -> Option<Vec<String>> {
    match value.as_str_list() {
        Some(list) => Some(list.to_vec()),
        None => {
            warn!(key, found = value.type_name(), "expected a string list");
            None
        }
    }
}

impl NetworkStateHandler {
    // ========================================================================
    // Manager
    // ========================================================================

    pub(super) fn manager_properties_received(&self, result: Result<PropertyMap, ServiceError>) {
        let properties = match result {
            Ok(properties) => properties,
            Err(err) => {
                warn!(%err, "failed to fetch manager properties");
                return;
            }
        };
        debug!(keys = properties.len(), "manager properties received");

        let mut round = Round::default();
        {
            let mut state = self.state.write();
            if state.shutting_down {
                return;
            }

            // Service lists go last so technology and default-service state
            // is current when their entries are requested
            let mut services = None;
            let mut complete_list = None;
            for (key, value) in &properties {
                match key.as_str() {
                    manager::SERVICES => services = Some(value),
                    manager::SERVICE_COMPLETE_LIST => complete_list = Some(value),
                    _ => self.manager_property_changed(&mut state, &mut round, key, value),
                }
            }
            if let Some(value) = services {
                self.manager_property_changed(&mut state, &mut round, manager::SERVICES, value);
            }
            if let Some(value) = complete_list {
                self.manager_property_changed(
                    &mut state,
                    &mut round,
                    manager::SERVICE_COMPLETE_LIST,
                    value,
                );
            }
            self.check_pending_list_updates(&mut state, &mut round, None);
        }
        self.finish(round);
    }

    fn manager_property_changed(
        &self,
        state: &mut HandlerState,
        round: &mut Round,
        key: &str,
        value: &PropertyValue,
    ) {
        match key {
            manager::DEFAULT_SERVICE => match value.as_str() {
                Some(path) => self.default_service_changed(state, round, path),
                None => warn!(found = value.type_name(), "malformed default service"),
            },
            manager::SERVICES => {
                if let Some(paths) = string_list(key, value) {
                    self.update_managed_list(state, round, ManagedType::Network, &paths);
                }
            }
            manager::SERVICE_COMPLETE_LIST => {
                if let Some(paths) = string_list(key, value) {
                    self.update_managed_list(state, round, ManagedType::Favorite, &paths);
                }
            }
            manager::DEVICES => {
                if let Some(paths) = string_list(key, value) {
                    self.update_managed_list(state, round, ManagedType::Device, &paths);
                }
            }
            manager::AVAILABLE_TECHNOLOGIES => {
                if let Some(list) = string_list(key, value) {
                    state.technologies.update_available(&list);
                    round.notify(Notification::DeviceListChanged);
                }
            }
            manager::ENABLED_TECHNOLOGIES => {
                if let Some(list) = string_list(key, value) {
                    state.technologies.update_enabled(&list);
                    round.notify(Notification::DeviceListChanged);
                }
            }
            manager::UNINITIALIZED_TECHNOLOGIES => {
                if let Some(list) = string_list(key, value) {
                    state.technologies.update_uninitialized(&list);
                    round.notify(Notification::DeviceListChanged);
                }
            }
            manager::PROFILES => self.profile_list_changed(state, round),
            manager::CHECK_PORTAL_LIST => match value.as_str() {
                Some(list) => state.check_portal_list = list.to_string(),
                None => warn!(found = value.type_name(), "malformed check portal list"),
            },
            _ => trace!(key, "ignoring manager property"),
        }
    }

    /// Replace one managed list and request properties for new entries
    fn update_managed_list(
        &self,
        state: &mut HandlerState,
        round: &mut Round,
        managed_type: ManagedType,
        paths: &[String],
    ) {
        let update = match managed_type {
            ManagedType::Network => state.networks.update_list(paths),
            ManagedType::Favorite => state.favorites.update_list(paths),
            ManagedType::Device => state.devices.update_list(paths),
        };
        if update.is_changed() {
            info!(
                %managed_type,
                added = update.added.len(),
                removed = update.removed.len(),
                reordered = update.reordered,
                "list changed"
            );
        }

        for path in state.requests.update_requested(managed_type, paths) {
            Self::request_properties(state, round, managed_type, &path);
        }
        if managed_type != ManagedType::Favorite {
            state.requests.update_observed(managed_type, paths);
        }
        if managed_type == ManagedType::Network {
            Self::check_default_still_listed(state, round);
        }
    }

    fn request_properties(
        state: &mut HandlerState,
        round: &mut Round,
        managed_type: ManagedType,
        path: &str,
    ) {
        if state.requests.begin_request(managed_type, path) {
            round.fetches.push((managed_type, path.to_string()));
        } else {
            trace!(%managed_type, path, "properties already requested");
        }
    }

    pub(super) fn request_update_locked(
        &self,
        state: &mut HandlerState,
        round: &mut Round,
        path: &str,
    ) {
        if !state.networks.request_update(path) {
            debug!(path, "update requested for an unlisted network");
            return;
        }
        Self::request_properties(state, round, ManagedType::Network, path);
    }

    /// Profiles changed; any network may have moved in or out of one
    fn profile_list_changed(&self, state: &mut HandlerState, round: &mut Round) {
        info!(networks = state.networks.len(), "profile list changed; refreshing networks");
        let paths: Vec<String> = state.networks.paths().map(str::to_string).collect();
        for path in paths {
            Self::request_properties(state, round, ManagedType::Network, &path);
        }
    }

    /// Announce a list once every fetch it started has completed
    fn check_pending_list_updates(
        &self,
        state: &mut HandlerState,
        round: &mut Round,
        key: Option<&str>,
    ) {
        let networks_pending = state.requests.has_pending(ManagedType::Network);
        let favorites_pending = state.requests.has_pending(ManagedType::Favorite);
        let devices_pending = state.requests.has_pending(ManagedType::Device);

        if matches!(key, None | Some(manager::SERVICES)) && !networks_pending {
            self.managed_state_list_changed(state, round, ManagedType::Network);
        }
        if matches!(key, None | Some(manager::SERVICE_COMPLETE_LIST))
            && !networks_pending
            && !favorites_pending
        {
            self.managed_state_list_changed(state, round, ManagedType::Favorite);
        }
        if matches!(key, None | Some(manager::DEVICES)) && !devices_pending {
            self.managed_state_list_changed(state, round, ManagedType::Device);
        }
    }

    fn managed_state_list_changed(
        &self,
        state: &mut HandlerState,
        round: &mut Round,
        managed_type: ManagedType,
    ) {
        match managed_type {
            ManagedType::Network => {
                round.notify(Notification::NetworkListChanged);
                self.announce_default_if_ready(state, round);
            }
            ManagedType::Favorite => round.notify(Notification::NetworkListChanged),
            ManagedType::Device => round.notify(Notification::DeviceListChanged),
        }
    }

    // ========================================================================
    // Default network
    // ========================================================================

    fn default_service_changed(
        &self,
        state: &mut HandlerState,
        round: &mut Round,
        service_path: &str,
    ) {
        let path = if service_path == NO_SERVICE_PATH { "" } else { service_path };
        if path == state.default_network_path {
            return;
        }
        info!(from = %state.default_network_path, to = path, "default network changed");
        state.default_network_path = path.to_string();
        state.default_announced = false;

        if path.is_empty() {
            state.default_announced = true;
            round.notify(Notification::DefaultNetworkChanged(None));
            return;
        }
        match state.networks.get_received(path) {
            Some(network) => {
                if !network.is_connected_state() {
                    warn!(
                        path,
                        state = %network.connection_state(),
                        "default network is not connected"
                    );
                }
                round.notify(Notification::DefaultNetworkChanged(Some(network.clone())));
                state.default_announced = true;
            }
            None => debug!(path, "default network not received yet; deferring notification"),
        }
    }

    /// Announce a deferred default once its properties have arrived
    fn announce_default_if_ready(&self, state: &mut HandlerState, round: &mut Round) {
        if state.default_announced || state.default_network_path.is_empty() {
            return;
        }
        if let Some(network) = state.networks.get_received(&state.default_network_path) {
            round.notify(Notification::DefaultNetworkChanged(Some(network.clone())));
            state.default_announced = true;
        }
    }

    fn network_connection_state_changed(
        &self,
        state: &mut HandlerState,
        round: &mut Round,
        path: &str,
    ) {
        let Some(network) = state.networks.get(path).cloned() else {
            return;
        };
        debug!(path, state = %network.connection_state(), "connection state changed");

        let mut is_default = path == state.default_network_path;
        if is_default && !network.is_connected_state() {
            info!(path, "default network disconnected");
            state.default_network_path.clear();
            state.default_announced = true;
            round.notify(Notification::DefaultNetworkChanged(None));
            is_default = false;
        }

        round.notify(Notification::NetworkConnectionStateChanged(network.clone()));

        if is_default {
            round.notify(Notification::DefaultNetworkChanged(Some(network)));
            state.default_announced = true;
        }
        if state.default_network_path.is_empty() {
            Self::adopt_first_connected(state, round);
        }
    }

    /// An announced default that left the service list is dropped
    ///
    /// A default that has not been announced yet is kept; its entry may still
    /// be on its way.
    fn check_default_still_listed(state: &mut HandlerState, round: &mut Round) {
        if state.default_network_path.is_empty()
            || !state.default_announced
            || state.networks.contains(&state.default_network_path)
        {
            return;
        }
        info!(path = %state.default_network_path, "default network no longer listed");
        state.default_network_path.clear();
        round.notify(Notification::DefaultNetworkChanged(None));
        Self::adopt_first_connected(state, round);
    }

    /// With no default, the first connected network in priority order becomes it
    fn adopt_first_connected(state: &mut HandlerState, round: &mut Round) {
        let candidate = state
            .networks
            .iter_received()
            .find(|network| network.is_connected_state())
            .cloned();
        if let Some(network) = candidate {
            info!(path = %network.path, "adopting first connected network as default");
            state.default_network_path = network.path.clone();
            state.default_announced = true;
            round.notify(Notification::DefaultNetworkChanged(Some(network)));
        }
    }

    // ========================================================================
    // Entity properties
    // ========================================================================

    pub(super) fn properties_received(
        &self,
        managed_type: ManagedType,
        path: &str,
        result: Result<PropertyMap, ServiceError>,
    ) {
        let mut round = Round::default();
        {
            let mut state = self.state.write();
            state.requests.complete_request(managed_type, path);
            if state.shutting_down {
                return;
            }

            match result {
                Ok(properties) => match managed_type {
                    ManagedType::Network => {
                        // A network fetch carries the favorite's properties too
                        if state.favorites.contains(path) {
                            Self::update_favorite_properties(&mut state, path, &properties);
                        }
                        self.update_network_state_properties(
                            &mut state,
                            &mut round,
                            path,
                            &properties,
                        );
                    }
                    ManagedType::Favorite => {
                        Self::update_favorite_properties(&mut state, path, &properties);
                    }
                    ManagedType::Device => {
                        Self::update_device_properties(&mut state, path, &properties);
                    }
                },
                // The entity may be gone already; the list still gets announced
                Err(err) => debug!(%managed_type, path, %err, "failed to fetch properties"),
            }

            if !state.requests.has_pending(managed_type) {
                self.managed_state_list_changed(&mut state, &mut round, managed_type);
                if managed_type == ManagedType::Network
                    && !state.requests.has_pending(ManagedType::Favorite)
                {
                    self.managed_state_list_changed(
                        &mut state,
                        &mut round,
                        ManagedType::Favorite,
                    );
                }
            }
        }
        self.finish(round);
    }

    fn update_network_state_properties(
        &self,
        state: &mut HandlerState,
        round: &mut Round,
        path: &str,
        properties: &PropertyMap,
    ) {
        let previous: Option<ConnectionState> = match state.networks.get(path) {
            Some(network) => network.connection_state,
            None => {
                debug!(path, "properties for an unlisted network");
                return;
            }
        };
        let result = match state.networks.apply_update(path, properties) {
            Ok(result) => result,
            Err(err) => {
                warn!(%err, "dropping network properties");
                return;
            }
        };
        Self::update_network_guid(state, path);

        if result.needs_notify() {
            let connection_changed = state
                .networks
                .get(path)
                .map(|network| network.connection_state_changed_from(previous))
                .unwrap_or(false);
            if connection_changed {
                self.network_connection_state_changed(state, round, path);
            }
            if let Some(network) = state.networks.get(path) {
                round.notify(Notification::NetworkPropertiesUpdated(network.clone()));
            }
        }
        if path == state.default_network_path {
            self.announce_default_if_ready(state, round);
        }
    }

    fn update_favorite_properties(state: &mut HandlerState, path: &str, properties: &PropertyMap) {
        match state.favorites.apply_update(path, properties) {
            Ok(result) if result.changed => {
                trace!(path, keys = ?result.changed_keys, "favorite updated")
            }
            Ok(_) => {}
            Err(err) => {
                warn!(%err, "dropping favorite properties");
                return;
            }
        }
        Self::update_favorite_guid(state, path);
    }

    fn update_device_properties(state: &mut HandlerState, path: &str, properties: &PropertyMap) {
        if let Err(err) = state.devices.apply_update(path, properties) {
            warn!(%err, "dropping device properties");
        }
    }

    /// One key of an observed service changed
    fn update_network_service_property(
        &self,
        state: &mut HandlerState,
        round: &mut Round,
        path: &str,
        key: &str,
        value: &PropertyValue,
    ) {
        let mut changed = false;
        let mut favorite_list_changed = false;

        if state.favorites.contains(path) {
            if let Ok(result) = state.favorites.set_property(path, key, value) {
                if result.changed {
                    changed = true;
                    if key == service::PROFILE || key == service::GUID {
                        Self::update_favorite_guid(state, path);
                    }
                    favorite_list_changed = key == service::PROFILE;
                }
            }
        }

        let Some(previous) = state
            .networks
            .get(path)
            .map(|network| network.connection_state)
        else {
            if favorite_list_changed {
                self.managed_state_list_changed(state, round, ManagedType::Favorite);
            }
            return;
        };
        if let Ok(result) = state.networks.set_property(path, key, value) {
            changed |= result.changed;
        }
        if !changed {
            return;
        }

        if key == service::STATE {
            let connection_changed = state
                .networks
                .get(path)
                .map(|network| network.connection_state_changed_from(previous))
                .unwrap_or(false);
            if connection_changed {
                self.network_connection_state_changed(state, round, path);
                // Other properties often change alongside the state
                self.request_update_locked(state, round, path);
            }
        } else {
            let noisy = key == service::SIGNAL_STRENGTH
                || key == service::WIFI_FREQUENCY_LIST
                || (key == service::DEVICE && value.as_str() == Some(NO_SERVICE_PATH));
            if !noisy && path == state.default_network_path {
                if let Some(network) = state.networks.get(path) {
                    round.notify(Notification::DefaultNetworkChanged(Some(network.clone())));
                    state.default_announced = true;
                }
            }
        }

        if let Some(network) = state.networks.get(path) {
            round.notify(Notification::NetworkPropertiesUpdated(network.clone()));
        }
        if favorite_list_changed {
            self.managed_state_list_changed(state, round, ManagedType::Favorite);
        }
    }

    fn update_device_property(
        &self,
        state: &mut HandlerState,
        round: &mut Round,
        path: &str,
        key: &str,
        value: &PropertyValue,
    ) {
        let changed = match state.devices.set_property(path, key, value) {
            Ok(result) => result.changed,
            Err(err) => {
                debug!(%err, "property change for an unlisted device");
                return;
            }
        };
        if !changed {
            return;
        }
        round.notify(Notification::DeviceListChanged);

        if key == device::SCANNING {
            if let Some(device) = state.devices.get(path).filter(|device| !device.scanning) {
                debug!(path, "scan completed");
                round.notify(Notification::ScanCompleted(device.clone()));
            }
        }
    }
}

impl PropertyChangedListener for NetworkStateHandler {
    fn on_property_changed(&self, kind: EntityKind, path: &str, key: &str, value: &PropertyValue) {
        let mut round = Round::default();
        {
            let mut state = self.state.write();
            if state.shutting_down {
                return;
            }
            match kind {
                EntityKind::Manager => {
                    self.manager_property_changed(&mut state, &mut round, key, value);
                    self.check_pending_list_updates(&mut state, &mut round, Some(key));
                }
                EntityKind::Service => {
                    if !state.requests.is_observed(ManagedType::Network, path) {
                        trace!(path, key, "ignoring change for an unobserved service");
                        return;
                    }
                    self.update_network_service_property(&mut state, &mut round, path, key, value);
                }
                EntityKind::Device => {
                    if !state.requests.is_observed(ManagedType::Device, path) {
                        trace!(path, key, "ignoring change for an unobserved device");
                        return;
                    }
                    self.update_device_property(&mut state, &mut round, path, key, value);
                }
                EntityKind::Profile => trace!(path, key, "ignoring profile property"),
            }
        }
        self.finish(round);
    }
}
