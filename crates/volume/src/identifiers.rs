//! Newtype identifiers.
//!
//! Volume IDs and namespaces are both plain strings on the wire. Wrapping them
//! keeps a caller from passing a namespace where a volume ID is expected.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display, and a
// Deserialize that goes through new().
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident, valid = $valid:expr
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is not
            /// acceptable (empty values never are).
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                let valid: fn(&str) -> bool = $valid;
                if v.is_empty() || !valid(&v) { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value.clone())
                    .ok_or_else(|| format!("invalid {}: '{}'", stringify!($name), value))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id! {
    /// Identifies a CSI volume (the `ID` field of the volume specification).
    ///
    /// Appears as a path segment in `volume/csi/{id}`. The transport
    /// percent-encodes it, but `.` and `..` would be resolved away as dot
    /// segments and address a different resource, so they are rejected.
    VolumeId, valid = |v| v != "." && v != ".."
}

string_id! {
    /// A Nomad namespace (e.g. `"default"`, `"prod"`, or `"*"` for all).
    Namespace, valid = |_| true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_identifiers_are_rejected() {
        assert!(VolumeId::new("").is_none());
        assert!(Namespace::new(String::new()).is_none());
    }

    #[test]
    fn identifiers_display_their_value() {
        let id = VolumeId::new("mysql-data[0]").unwrap();
        assert_eq!(id.as_str(), "mysql-data[0]");
        assert_eq!(id.to_string(), "mysql-data[0]");
    }

    #[test]
    fn dot_segments_are_not_volume_ids() {
        assert!(VolumeId::new(".").is_none());
        assert!(VolumeId::new("..").is_none());
        assert!(VolumeId::new("...").is_some());
        assert!(VolumeId::new("a..b").is_some());
    }

    #[test]
    fn deserialization_applies_the_same_checks() {
        assert!(serde_json::from_str::<VolumeId>(r#""..""#).is_err());
        assert!(serde_json::from_str::<VolumeId>(r#""""#).is_err());
        assert!(serde_json::from_str::<Namespace>(r#""""#).is_err());

        let id: VolumeId = serde_json::from_str(r#""db""#).unwrap();
        assert_eq!(id.as_str(), "db");
    }

    #[test]
    fn identifiers_serialize_transparently_as_strings() {
        let ns = Namespace::new("prod").unwrap();
        assert_eq!(serde_json::to_value(&ns).unwrap(), serde_json::json!("prod"));
    }
}
