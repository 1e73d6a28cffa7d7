//! Wire values reported by the network service
//!
//! Every entity the service exposes is a bag of string keys mapped to a small
//! set of value shapes. [`PropertyValue`] models those shapes; entities convert
//! them into strongly typed fields through explicit key mapping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Property dictionary for one entity, ordered by key.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// A single property value as reported by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Str(String),
    StrList(Vec<String>),
    Dict(PropertyMap),
}

impl PropertyValue {
    /// Name of the variant, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Int(_) => "int",
            PropertyValue::Str(_) => "string",
            PropertyValue::StrList(_) => "string list",
            PropertyValue::Dict(_) => "dictionary",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str_list(&self) -> Option<&[String]> {
        match self {
            PropertyValue::StrList(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&PropertyMap> {
        match self {
            PropertyValue::Dict(value) => Some(value),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Int(i64::from(value))
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Str(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Str(value)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(value: Vec<String>) -> Self {
        PropertyValue::StrList(value)
    }
}

impl From<Vec<&str>> for PropertyValue {
    fn from(value: Vec<&str>) -> Self {
        PropertyValue::StrList(value.into_iter().map(str::to_string).collect())
    }
}

impl From<PropertyMap> for PropertyValue {
    fn from(value: PropertyMap) -> Self {
        PropertyValue::Dict(value)
    }
}

/// Build a [`PropertyMap`] from key/value pairs
///
/// ```rust
/// use property_store::{property_map, PropertyValue};
///
/// let props = property_map([("Type", PropertyValue::from("wifi")), ("Strength", 40.into())]);
/// assert_eq!(props["Type"].as_str(), Some("wifi"));
/// ```
pub fn property_map<K, I>(pairs: I) -> PropertyMap
where
    K: Into<String>,
    I: IntoIterator<Item = (K, PropertyValue)>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
