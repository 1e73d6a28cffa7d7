//! Network type patterns
//!
//! A pattern is a set of primitive network types. Lookups such as "first
//! connected mobile network" take a pattern instead of a single type.

use std::fmt;

use bitflags::bitflags;
use network_service::keys::types;

bitflags! {
    /// Set of network types used to filter lookups
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NetworkTypePattern: u32 {
        const ETHERNET = 1 << 0;
        const WIFI = 1 << 1;
        const WIMAX = 1 << 2;
        const CELLULAR = 1 << 3;
        const BLUETOOTH = 1 << 4;
        const VPN = 1 << 5;

        /// Cellular and WiMAX
        const MOBILE = Self::CELLULAR.bits() | Self::WIMAX.bits();
        const WIRELESS = Self::WIFI.bits()
            | Self::WIMAX.bits()
            | Self::CELLULAR.bits()
            | Self::BLUETOOTH.bits();
        const NON_VIRTUAL = Self::ETHERNET.bits() | Self::WIRELESS.bits();
        /// Every type, including ones this crate has no name for
        const DEFAULT = !0;
    }
}

/// Primitive types in the order technology lookups consider them
const PRIMITIVES: [(NetworkTypePattern, &str); 6] = [
    (NetworkTypePattern::ETHERNET, types::ETHERNET),
    (NetworkTypePattern::WIFI, types::WIFI),
    (NetworkTypePattern::WIMAX, types::WIMAX),
    (NetworkTypePattern::CELLULAR, types::CELLULAR),
    (NetworkTypePattern::BLUETOOTH, types::BLUETOOTH),
    (NetworkTypePattern::VPN, types::VPN),
];

impl NetworkTypePattern {
    /// Pattern for a single wire type name; unknown names give the empty pattern
    pub fn primitive(type_name: &str) -> Self {
        PRIMITIVES
            .iter()
            .find(|(_, name)| *name == type_name)
            .map(|(pattern, _)| *pattern)
            .unwrap_or_else(Self::empty)
    }

    /// Whether a wire type name belongs to this pattern
    pub fn matches_type(&self, type_name: &str) -> bool {
        if *self == Self::DEFAULT {
            return true;
        }
        self.intersects(Self::primitive(type_name))
    }

    /// Whether two patterns share any type
    pub fn matches_pattern(&self, other: NetworkTypePattern) -> bool {
        self.intersects(other)
    }

    /// Technology names covered by this pattern, in lookup order
    pub fn technologies(&self) -> Vec<&'static str> {
        PRIMITIVES
            .iter()
            .filter(|(pattern, _)| self.contains(*pattern))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl fmt::Display for NetworkTypePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::DEFAULT {
            return f.write_str("default");
        }
        let names = self.technologies();
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(NetworkTypePattern::MOBILE, types::CELLULAR, true)]
    #[case(NetworkTypePattern::MOBILE, types::WIMAX, true)]
    #[case(NetworkTypePattern::MOBILE, types::WIFI, false)]
    #[case(NetworkTypePattern::WIRELESS, types::ETHERNET, false)]
    #[case(NetworkTypePattern::NON_VIRTUAL, types::VPN, false)]
    #[case(NetworkTypePattern::NON_VIRTUAL, types::BLUETOOTH, true)]
    #[case(NetworkTypePattern::DEFAULT, "gadget", true)]
    #[case(NetworkTypePattern::WIFI, "gadget", false)]
    fn test_matches_type(
        #[case] pattern: NetworkTypePattern,
        #[case] type_name: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(pattern.matches_type(type_name), expected);
    }

    #[test]
    fn test_primitive_lookup() {
        assert_eq!(NetworkTypePattern::primitive("wifi"), NetworkTypePattern::WIFI);
        assert!(NetworkTypePattern::primitive("unknown").is_empty());
    }

    #[test]
    fn test_technologies_in_lookup_order() {
        assert_eq!(NetworkTypePattern::MOBILE.technologies(), vec!["wimax", "cellular"]);
        assert_eq!(
            NetworkTypePattern::DEFAULT.technologies(),
            vec!["ethernet", "wifi", "wimax", "cellular", "bluetooth", "vpn"]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(NetworkTypePattern::MOBILE.to_string(), "wimax|cellular");
        assert_eq!(NetworkTypePattern::DEFAULT.to_string(), "default");
        assert_eq!(NetworkTypePattern::empty().to_string(), "none");
    }

    #[test]
    fn test_matches_pattern() {
        assert!(NetworkTypePattern::MOBILE.matches_pattern(NetworkTypePattern::WIMAX));
        assert!(!NetworkTypePattern::WIFI.matches_pattern(NetworkTypePattern::ETHERNET));
    }
}
