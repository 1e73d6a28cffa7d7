//! Property-based tests for the handler against the fake service.
//!
//! These tests verify:
//! - Re-sending an identical property value never produces an update
//! - Generated GUIDs survive a network disappearing and reappearing

mod test_helpers;

use network_service::fake::STUB_WIFI1;
use network_service::keys::{service, state, types};
use proptest::prelude::*;
use test_helpers::Harness;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn identical_updates_are_suppressed(strengths in prop::collection::vec(0i32..=100, 1..8)) {
        let h = Harness::new();
        let mut previous = h
            .handler
            .get_network_state(STUB_WIFI1)
            .map(|network| network.signal_strength)
            .unwrap_or_default();
        let before = h.observer.property_updates_for(STUB_WIFI1);

        let mut expected = 0;
        for strength in &strengths {
            if i64::from(*strength) != previous {
                expected += 1;
                previous = i64::from(*strength);
            }
            // Sent twice; the second one is a no-op
            h.service.set_service_property(STUB_WIFI1, service::SIGNAL_STRENGTH, *strength);
            h.service.set_service_property(STUB_WIFI1, service::SIGNAL_STRENGTH, *strength);
            h.run();
        }

        prop_assert_eq!(h.observer.property_updates_for(STUB_WIFI1) - before, expected);
        let network = h.handler.get_network_state(STUB_WIFI1).unwrap();
        prop_assert_eq!(network.signal_strength, previous);
    }

    #[test]
    fn generated_guid_is_stable(name in "[a-z]{1,8}") {
        let h = Harness::new();
        let path = format!("/service/{name}");

        h.service.add_service(&path, &name, types::WIFI, state::IDLE, true);
        h.run();
        let first = h.handler.get_network_state(&path).unwrap().guid;
        prop_assert!(!first.is_empty());

        h.service.remove_service(&path);
        h.run();
        prop_assert!(h.handler.get_network_state(&path).is_none());

        h.service.add_service(&path, &name, types::WIFI, state::IDLE, true);
        h.run();
        prop_assert_eq!(h.handler.get_network_state(&path).unwrap().guid, first);
    }
}
