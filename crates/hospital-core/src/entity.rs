//! Entity records.
//!
//! Every screen in this crate is generic over [`Entity`]: a statically
//! declared record whose identifier is absent until the backend has
//! persisted it. [`Hospital`] is the one entity the admin screens manage.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A record managed through the CRUD screens.
///
/// `Default` must produce the blank record shown by the "new" route: no
/// identifier and default field values.
pub trait Entity:
    Clone + Default + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Identifier type, parsed from route parameters.
    type Id: Clone
        + fmt::Debug
        + fmt::Display
        + FromStr
        + PartialEq
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;

    /// Singular name used in route paths and page titles (`"hospital"`).
    const NAME: &'static str;

    /// REST collection name (`"hospitals"`).
    const RESOURCE: &'static str;

    /// The identifier, or `None` if the record has never been persisted.
    fn id(&self) -> Option<&Self::Id>;

    /// Whether the record has been persisted.
    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }
}

/// Opaque hospital identifier as it appears in routes and JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HospitalId(String);

impl HospitalId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HospitalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for HospitalId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for HospitalId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A hospital record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    /// Backend identifier; `None` until created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<HospitalId>,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Postal address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Switchboard phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Hospital {
    /// A persisted hospital with the given identifier and name.
    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(HospitalId::new(id)),
            name: name.into(),
            ..Self::default()
        }
    }

    /// A new, unsaved hospital with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Entity for Hospital {
    type Id = HospitalId;

    const NAME: &'static str = "hospital";
    const RESOURCE: &'static str = "hospitals";

    fn id(&self) -> Option<&HospitalId> {
        self.id.as_ref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_hospital() {
        let blank = Hospital::default();
        assert!(blank.id.is_none());
        assert_eq!(blank.name, "");
        assert!(!blank.is_persisted());
    }

    #[test]
    fn test_persisted_hospital() {
        let h = Hospital::with_id("H-1", "General");
        assert_eq!(h.id().map(HospitalId::as_str), Some("H-1"));
        assert!(h.is_persisted());
    }

    #[test]
    fn test_json_shape_omits_missing_id() {
        let json = serde_json::to_value(Hospital::named("St. Mary")).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "St. Mary" }));
    }

    #[test]
    fn test_json_accepts_sparse_payload() {
        let h: Hospital = serde_json::from_str(r#"{"id":"42","name":"St. Mary"}"#).unwrap();
        assert_eq!(h, Hospital::with_id("42", "St. Mary"));
    }

    #[test]
    fn test_id_parses_from_route_param() {
        let id: HospitalId = "42".parse().unwrap();
        assert_eq!(id.to_string(), "42");
    }
}
