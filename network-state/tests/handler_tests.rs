//! Integration tests for NetworkStateHandler against the fake service.
//!
//! These tests verify:
//! - The stub environment is aggregated into networks, favorites and devices
//! - Property and connection-state notifications are counted once per change
//! - Default network tracking across disconnects, reconnects and changes
//! - GUID stability for configured and unconfigured networks
//! - Scans, shutdown, snapshots and per-entity observation limits

mod test_helpers;

use network_service::fake::{
    STUB_CELLULAR, STUB_CELLULAR_DEVICE, STUB_ETHERNET, STUB_WIFI1, STUB_WIFI2, STUB_WIFI_DEVICE,
};
use network_service::keys::{manager, service, state, types, MANAGER_PATH};
use network_service::{EntityKind, PropertyChangedListener, PropertyValue};
use network_state::{ConnectionState, HandlerConfig, HandlerSnapshot, NetworkTypePattern};
use test_helpers::Harness;

#[test]
fn test_stub_environment() {
    let h = Harness::new();

    assert_eq!(h.observer.network_count(), 4);
    assert_eq!(
        h.handler
            .connected_network_by_type(NetworkTypePattern::ETHERNET)
            .map(|n| n.path),
        Some(STUB_ETHERNET.to_string())
    );
    assert_eq!(
        h.handler
            .connected_network_by_type(NetworkTypePattern::WIFI)
            .map(|n| n.path),
        Some(STUB_WIFI1.to_string())
    );
    assert_eq!(
        h.handler
            .first_network_by_type(NetworkTypePattern::MOBILE)
            .map(|n| n.path),
        Some(STUB_CELLULAR.to_string())
    );
    assert_eq!(h.observer.default_network(), STUB_ETHERNET);
    assert_eq!(
        h.observer.default_network_connection_state(),
        Some(ConnectionState::Online)
    );
}

#[test]
fn test_network_list_keeps_service_order() {
    let h = Harness::new();
    let paths: Vec<String> = h
        .handler
        .get_network_list(NetworkTypePattern::DEFAULT)
        .into_iter()
        .map(|n| n.path)
        .collect();
    assert_eq!(paths, vec![STUB_ETHERNET, STUB_WIFI1, STUB_WIFI2, STUB_CELLULAR]);

    let wifi: Vec<String> = h
        .handler
        .get_network_list(NetworkTypePattern::WIFI)
        .into_iter()
        .map(|n| n.path)
        .collect();
    assert_eq!(wifi, vec![STUB_WIFI1, STUB_WIFI2]);
}

#[test]
fn test_service_property_changed() {
    let h = Harness::new();

    let eth1 = h.handler.get_network_state(STUB_ETHERNET).unwrap();
    assert_eq!(eth1.security, "");
    assert_eq!(h.observer.property_updates_for(STUB_ETHERNET), 1);

    h.service
        .set_service_property(STUB_ETHERNET, service::SECURITY, "TestSecurity");
    h.run();
    assert_eq!(
        h.handler.get_network_state(STUB_ETHERNET).unwrap().security,
        "TestSecurity"
    );
    assert_eq!(h.observer.property_updates_for(STUB_ETHERNET), 2);

    // The same value again is not an update
    h.service
        .set_service_property(STUB_ETHERNET, service::SECURITY, "TestSecurity");
    h.run();
    assert_eq!(h.observer.property_updates_for(STUB_ETHERNET), 2);
}

#[test]
fn test_network_connection_state_changed() {
    let h = Harness::new();
    assert_eq!(h.observer.connection_state_changes_for(STUB_ETHERNET), 1);
    // The first report of Idle is not a change
    assert_eq!(h.observer.connection_state_changes_for(STUB_WIFI2), 0);

    h.service
        .set_service_property(STUB_ETHERNET, service::STATE, state::IDLE);
    h.run();
    assert_eq!(
        h.observer.connection_state_for(STUB_ETHERNET),
        Some(ConnectionState::Idle)
    );
    assert_eq!(h.observer.connection_state_changes_for(STUB_ETHERNET), 2);

    h.service
        .set_service_property(STUB_ETHERNET, service::STATE, state::IDLE);
    h.run();
    assert_eq!(h.observer.connection_state_changes_for(STUB_ETHERNET), 2);
}

#[test]
fn test_default_service_disconnected() {
    let h = Harness::new();

    h.service
        .set_service_property(STUB_ETHERNET, service::STATE, state::IDLE);
    h.run();
    // Cleared when eth1 drops, then wifi1 takes over
    assert_eq!(h.observer.default_network_change_count(), 2);
    assert_eq!(h.observer.default_network(), STUB_WIFI1);

    h.observer.reset_change_counts();
    h.service
        .set_service_property(STUB_WIFI1, service::STATE, state::IDLE);
    h.run();
    assert_eq!(h.observer.default_network_change_count(), 1);
    assert_eq!(h.observer.default_network(), "");
    assert!(h.handler.default_network().is_none());
}

#[test]
fn test_default_service_connected() {
    let h = Harness::new();

    h.service
        .set_service_property(STUB_ETHERNET, service::STATE, state::IDLE);
    h.service
        .set_service_property(STUB_WIFI1, service::STATE, state::IDLE);
    h.run();
    assert_eq!(h.observer.default_network(), "");

    h.observer.reset_change_counts();
    h.service
        .set_service_property(STUB_ETHERNET, service::STATE, state::READY);
    h.run();
    assert_eq!(h.observer.default_network(), STUB_ETHERNET);
    assert_eq!(
        h.observer.default_network_connection_state(),
        Some(ConnectionState::Ready)
    );
    assert_eq!(h.observer.default_network_change_count(), 1);
}

#[test]
fn test_default_service_changed() {
    let h = Harness::new();

    h.service
        .set_manager_property(manager::DEFAULT_SERVICE, STUB_WIFI1);
    h.run();
    assert_eq!(h.observer.default_network(), STUB_WIFI1);
    assert_eq!(h.observer.default_network_change_count(), 1);

    h.observer.reset_change_counts();
    h.service
        .set_service_property(STUB_WIFI1, service::STATE, state::READY);
    h.run();
    assert_eq!(
        h.observer.default_network_connection_state(),
        Some(ConnectionState::Ready)
    );
    assert_eq!(h.observer.default_network_change_count(), 1);

    // Interesting properties on the default network are announced
    h.observer.reset_change_counts();
    h.service
        .set_service_property(STUB_WIFI1, service::SECURITY, "TestSecurity");
    h.run();
    assert_eq!(h.observer.default_network_change_count(), 1);

    // Signal strength is not
    h.observer.reset_change_counts();
    h.service
        .set_service_property(STUB_WIFI1, service::SIGNAL_STRENGTH, 32);
    h.run();
    assert_eq!(h.observer.default_network_change_count(), 0);
}

#[test]
fn test_non_default_property_change_leaves_default_alone() {
    let h = Harness::new();
    h.service
        .set_service_property(STUB_WIFI2, service::SECURITY, "psk");
    h.run();
    assert_eq!(h.observer.default_network_change_count(), 0);
    assert_eq!(h.observer.property_updates_for(STUB_WIFI2), 2);
}

#[test]
fn test_no_default_service_reported_as_root_path() {
    let h = Harness::new();
    h.service.set_manager_property(manager::DEFAULT_SERVICE, "/");
    h.run();
    assert_eq!(h.observer.default_network_change_count(), 1);
    assert_eq!(h.observer.default_network(), "");
    assert!(h.handler.default_network().is_none());
}

#[test]
fn test_default_service_removed() {
    let h = Harness::new();

    h.service.remove_service(STUB_ETHERNET);
    h.run();
    // Cleared when eth1 leaves the list, then wifi1 takes over
    assert_eq!(h.observer.default_network_change_count(), 2);
    assert_eq!(h.observer.default_network(), STUB_WIFI1);
    assert_eq!(
        h.handler.default_network().map(|n| n.path),
        Some(STUB_WIFI1.to_string())
    );
}

#[test]
fn test_default_dropped_from_list_without_new_default() {
    let h = Harness::new();

    // The manager lists services without eth1 but keeps reporting it as default
    let services = PropertyValue::from(vec![STUB_WIFI1, STUB_WIFI2, STUB_CELLULAR]);
    h.handler.on_property_changed(
        EntityKind::Manager,
        MANAGER_PATH,
        manager::SERVICES,
        &services,
    );
    h.run();

    assert_eq!(h.observer.default_network_change_count(), 2);
    assert_eq!(h.observer.default_network(), STUB_WIFI1);
    assert_eq!(
        h.handler.snapshot().default_network,
        Some(STUB_WIFI1.to_string())
    );
    assert_eq!(
        h.handler.default_network().map(|n| n.path),
        Some(STUB_WIFI1.to_string())
    );
}

#[test]
fn test_service_without_type_is_omitted() {
    let h = Harness::new();
    let path = "/service/broken";

    h.service
        .add_service(path, "broken", types::WIFI, state::IDLE, true);
    assert!(h.service.remove_service_property(path, service::TYPE));
    h.run();

    assert!(h.handler.get_network_state(path).is_none());
    assert_eq!(h.handler.get_network_list(NetworkTypePattern::DEFAULT).len(), 4);
    assert_eq!(h.observer.network_count(), 4);
}

#[test]
fn test_malformed_refetch_keeps_last_good_state() {
    let h = Harness::new();
    let updates = h.observer.property_updates_for(STUB_WIFI2);

    assert!(h.service.remove_service_property(STUB_WIFI2, service::TYPE));
    h.handler.request_update_for_network(STUB_WIFI2);
    h.run();

    let wifi2 = h.handler.get_network_state(STUB_WIFI2).expect("wifi2");
    assert_eq!(wifi2.network_type, types::WIFI);
    assert_eq!(wifi2.connection_state(), ConnectionState::Idle);
    assert_eq!(h.observer.property_updates_for(STUB_WIFI2), updates);
    assert_eq!(h.handler.get_network_list(NetworkTypePattern::DEFAULT).len(), 4);
}

#[test]
fn test_request_update() {
    let h = Harness::new();
    assert_eq!(h.observer.property_updates_for(STUB_WIFI1), 1);

    h.handler.request_update_for_network(STUB_WIFI1);
    h.run();
    assert_eq!(h.observer.property_updates_for(STUB_WIFI1), 2);
}

#[test]
fn test_request_update_unknown_network_is_ignored() {
    let h = Harness::new();
    h.handler.request_update_for_network("/service/none");
    h.run();
    assert!(h.queue.is_idle());
    assert_eq!(h.observer.network_list_changed_count(), 0);
}

#[test]
fn test_get_state() {
    let h = Harness::new();
    let profile = "/profile/profile1";

    h.service.add_profile(profile, "");
    assert!(h.service.add_service_to_profile(profile, STUB_WIFI1));
    h.update_manager_properties();

    let network = h
        .handler
        .get_network_state_from_service_path(STUB_WIFI1, true)
        .expect("configured network");
    let favorite = h
        .handler
        .get_favorite_state_from_service_path(STUB_WIFI1, true)
        .expect("configured favorite");
    assert_eq!(network.path, favorite.path);

    assert!(!favorite.guid.is_empty());
    assert_eq!(h.observer.favorite_count(), 1);
    assert_eq!(
        h.handler.get_favorite_state_from_guid(&favorite.guid),
        Some(favorite.clone())
    );

    h.service.remove_service(STUB_WIFI1);
    h.update_manager_properties();
    assert!(h.handler.get_network_state(STUB_WIFI1).is_none());
    // The profile keeps the favorite
    assert!(h
        .handler
        .get_favorite_state_from_service_path(STUB_WIFI1, true)
        .is_some());
}

#[test]
fn test_network_guid_in_profile() {
    let h = Harness::new();
    let profile = "/profile/profile1";
    let wifi_path = "/service/wifi_with_guid";
    let wifi_guid = "WIFI_GUID";

    h.service.add_profile(profile, "");
    h.service.add_service_with_guid(
        wifi_path,
        wifi_guid,
        "WifiWithGuid",
        types::WIFI,
        state::ONLINE,
        true,
    );
    assert!(h.service.add_service_to_profile(profile, wifi_path));
    h.update_manager_properties();

    let favorite = h
        .handler
        .get_favorite_state_from_service_path(wifi_path, true)
        .expect("favorite");
    assert_eq!(favorite.guid, wifi_guid);
    let network = h
        .handler
        .get_network_state_from_service_path(wifi_path, true)
        .expect("network");
    assert_eq!(network.guid, wifi_guid);

    h.service.remove_service(wifi_path);
    h.update_manager_properties();
    assert!(h.handler.get_network_state(wifi_path).is_none());

    h.service
        .add_service(wifi_path, "WifiWithGuid", types::WIFI, state::ONLINE, true);
    h.update_manager_properties();

    let network = h
        .handler
        .get_network_state_from_service_path(wifi_path, true)
        .expect("network back in range");
    assert_eq!(network.guid, wifi_guid);
    let favorite = h
        .handler
        .get_favorite_state_from_service_path(wifi_path, true)
        .expect("favorite");
    assert_eq!(favorite.guid, wifi_guid);
}

#[test]
fn test_network_guid_not_in_profile() {
    let h = Harness::new();
    let wifi_path = "/service/wifi_without_guid";
    let wifi_name = "WifiWithoutGuid";

    h.service
        .add_service(wifi_path, wifi_name, types::WIFI, state::ONLINE, true);
    h.run();

    let network = h.handler.get_network_state(wifi_path).expect("network");
    assert!(!network.guid.is_empty());
    let favorite = h
        .handler
        .get_favorite_state_from_service_path(wifi_path, false)
        .expect("favorite");
    assert_eq!(network.guid, favorite.guid);
    let guid = network.guid;

    h.service.remove_service(wifi_path);
    h.update_manager_properties();
    assert!(h.handler.get_network_state(wifi_path).is_none());
    assert!(h
        .handler
        .get_favorite_state_from_service_path(wifi_path, false)
        .is_none());

    h.service
        .add_service(wifi_path, wifi_name, types::WIFI, state::ONLINE, true);
    h.update_manager_properties();

    let network = h.handler.get_network_state(wifi_path).expect("network");
    assert_eq!(network.guid, guid);
    let favorite = h
        .handler
        .get_favorite_state_from_service_path(wifi_path, false)
        .expect("favorite");
    assert_eq!(favorite.guid, guid);
}

#[test]
fn test_favorite_lists() {
    let h = Harness::new();
    assert_eq!(h.handler.get_favorite_list(NetworkTypePattern::DEFAULT).len(), 4);
    assert!(h
        .handler
        .get_configured_favorite_list(NetworkTypePattern::DEFAULT)
        .is_empty());

    h.service.add_profile("/profile/default", "");
    h.service.add_service_to_profile("/profile/default", STUB_WIFI2);
    h.run();

    let configured = h
        .handler
        .get_configured_favorite_list(NetworkTypePattern::WIFI);
    assert_eq!(configured.len(), 1);
    assert_eq!(configured[0].path, STUB_WIFI2);
    assert_eq!(configured[0].profile_path, "/profile/default");
}

#[test]
fn test_device_queries() {
    let h = Harness::new();
    assert_eq!(h.handler.get_device_list(NetworkTypePattern::DEFAULT).len(), 2);
    assert_eq!(
        h.handler
            .get_device_state_by_type(NetworkTypePattern::WIFI)
            .map(|d| d.path),
        Some(STUB_WIFI_DEVICE.to_string())
    );
    assert_eq!(
        h.handler
            .get_device_state(STUB_CELLULAR_DEVICE)
            .map(|d| d.device_type),
        Some(types::CELLULAR.to_string())
    );
    assert!(!h.handler.get_scanning_by_type(NetworkTypePattern::DEFAULT));
}

#[test]
fn test_device_added_and_removed() {
    let h = Harness::new();

    h.service
        .add_device("/device/stub_eth_device", types::ETHERNET, "eth0");
    h.run();
    assert_eq!(h.handler.get_device_list(NetworkTypePattern::DEFAULT).len(), 3);
    assert!(h.observer.device_list_changed_count() >= 1);

    h.service.remove_device("/device/stub_eth_device");
    h.run();
    assert!(h.handler.get_device_state("/device/stub_eth_device").is_none());
}

#[test]
fn test_scan_completed() {
    let h = Harness::new();

    h.handler.request_scan();
    h.queue.run_one();
    h.queue.run_one();
    h.queue.run_one();
    assert!(h.handler.get_scanning_by_type(NetworkTypePattern::WIFI));

    h.run();
    assert!(!h.handler.get_scanning_by_type(NetworkTypePattern::DEFAULT));
    let mut scanned = h.observer.scans_completed();
    scanned.sort();
    assert_eq!(scanned, vec![STUB_CELLULAR_DEVICE, STUB_WIFI_DEVICE]);
}

#[test]
fn test_device_property_change_notifies_device_list() {
    let h = Harness::new();
    h.service
        .set_device_property(STUB_WIFI_DEVICE, "Powered", false);
    h.run();
    assert_eq!(h.observer.device_list_changed_count(), 1);
    assert!(!h.handler.get_device_state(STUB_WIFI_DEVICE).unwrap().powered);
}

#[test]
fn test_changes_past_observation_limit_are_ignored() {
    let h = Harness::with_config(HandlerConfig::default().with_max_observed(1));

    h.service
        .set_service_property(STUB_WIFI2, service::SECURITY, "psk");
    h.run();
    assert_eq!(h.handler.get_network_state(STUB_WIFI2).unwrap().security, "");

    h.service
        .set_service_property(STUB_ETHERNET, service::SECURITY, "802.1x");
    h.run();
    assert_eq!(
        h.handler.get_network_state(STUB_ETHERNET).unwrap().security,
        "802.1x"
    );
}

#[test]
fn test_list_change_announced_once_per_round() {
    let h = Harness::new();
    h.service
        .add_service("/service/wifi3", "wifi3", types::WIFI, state::IDLE, true);
    h.service
        .add_service("/service/wifi4", "wifi4", types::WIFI, state::IDLE, true);
    h.run();

    assert_eq!(h.observer.network_count(), 6);
    assert!(h.observer.network_list_changed_count() >= 1);
}

#[test]
fn test_check_portal_list() {
    let h = Harness::with_config(HandlerConfig::default().with_check_portal_list("ethernet,wifi"));
    assert_eq!(h.handler.check_portal_list(), "ethernet,wifi");

    h.handler.set_check_portal_list("ethernet");
    h.run();
    assert_eq!(h.handler.check_portal_list(), "ethernet");
}

#[test]
fn test_connect_to_best_services() {
    let h = Harness::new();
    h.service.set_best_service_to_connect(STUB_WIFI2);

    h.handler.connect_to_best_services(None);
    h.run();
    assert!(h
        .handler
        .get_network_state(STUB_WIFI2)
        .unwrap()
        .is_connected_state());
}

#[test]
fn test_shutdown() {
    let h = Harness::new();
    h.handler.shutdown();

    assert!(h.observer.is_shutting_down());
    assert_eq!(h.handler.observer_count(), 0);
    assert_eq!(h.service.listener_count(), 0);

    h.service
        .set_service_property(STUB_ETHERNET, service::SECURITY, "psk");
    h.run();
    assert_eq!(h.handler.get_network_state(STUB_ETHERNET).unwrap().security, "");
}

#[test]
fn test_snapshot_json() {
    let h = Harness::new();
    let json = h.handler.snapshot_json().unwrap();

    let snapshot: HandlerSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(snapshot.default_network.as_deref(), Some(STUB_ETHERNET));
    assert_eq!(snapshot.networks.len(), 4);
    assert_eq!(snapshot.devices.len(), 2);
    assert_eq!(snapshot, h.handler.snapshot());
}
