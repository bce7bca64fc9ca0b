//! Identity newtypes
//!
//! Every entity is keyed by a random UUID. External entities (sites, agents)
//! are referenced by identity only; their lifecycle is owned elsewhere.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::HiveError;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identity
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = HiveError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self).map_err(|e| {
                    HiveError::InvalidArgument(format!("malformed {} id '{}': {}", $label, s, e))
                })
            }
        }
    };
}

entity_id!(
    /// Hive identity
    HiveId,
    "hive"
);
entity_id!(
    /// Extension identity, unique across all hives
    ExtensionId,
    "extension"
);
entity_id!(
    /// Frame identity, unique across all hives
    FrameId,
    "frame"
);
entity_id!(
    /// Sensor reading identity
    ReadingId,
    "reading"
);
entity_id!(
    /// Weak reference to an apiary site
    SiteId,
    "site"
);
entity_id!(
    /// Weak reference to the agent currently responsible for a hive
    AgentId,
    "agent"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(HiveId::new(), HiveId::new());
    }

    #[test]
    fn test_parse_round_trips_display() {
        let id = FrameId::new();
        let parsed: FrameId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_malformed_id_is_invalid_argument() {
        let err = "not-a-uuid".parse::<HiveId>().unwrap_err();
        match err {
            HiveError::InvalidArgument(msg) => assert!(msg.contains("hive")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
