//! Stable identifiers for networks
//!
//! Configured services carry a GUID from their profile. Unconfigured ones get
//! a locally generated GUID keyed by name and type, so a network that drops
//! out of range and comes back keeps its identifier.

use tracing::debug;
use uuid::Uuid;

use super::{HandlerState, NetworkStateHandler};

fn generate_guid() -> String {
    Uuid::new_v4().to_string()
}

impl NetworkStateHandler {
    /// Settle a favorite's GUID and share it with the matching network
    pub(super) fn update_favorite_guid(state: &mut HandlerState, path: &str) {
        let Some(favorite) = state.favorites.get(path) else {
            return;
        };
        let specifier = favorite.specifier();

        let guid = if !favorite.guid.is_empty() {
            let guid = favorite.guid.clone();
            if favorite.is_in_profile() {
                state.specifier_guids.remove(&specifier);
            } else {
                state.specifier_guids.insert(specifier, guid.clone());
            }
            guid
        } else {
            let guid = state
                .specifier_guids
                .entry(specifier)
                .or_insert_with(generate_guid)
                .clone();
            debug!(path, guid, "assigned local guid");
            if let Some(favorite) = state.favorites.get_mut(path) {
                favorite.guid = guid.clone();
            }
            guid
        };

        if let Some(network) = state.networks.get_mut(path) {
            if network.guid.is_empty() {
                network.guid = guid;
            }
        }
    }

    /// Give a network without a GUID its favorite's, or a local one
    pub(super) fn update_network_guid(state: &mut HandlerState, path: &str) {
        let Some(network) = state.networks.get(path) else {
            return;
        };
        if !network.guid.is_empty() {
            return;
        }

        let guid = match state.favorites.get(path).filter(|favorite| !favorite.guid.is_empty()) {
            Some(favorite) => favorite.guid.clone(),
            None => state
                .specifier_guids
                .entry(network.specifier())
                .or_insert_with(generate_guid)
                .clone(),
        };
        if let Some(network) = state.networks.get_mut(path) {
            network.guid = guid;
        }
    }
}
