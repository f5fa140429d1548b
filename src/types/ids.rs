//! Identifier types for topology entities.
//!
//! All identifiers are 16-bit, matching the width used by the domain
//! plugins that register entities. They implement `Ord` so that every
//! map keyed by them iterates deterministically.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! topology_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u16);

        impl $name {
            /// Create a new identifier from its raw value.
            pub const fn new(raw: u16) -> Self {
                Self(raw)
            }

            /// Get the raw value.
            pub const fn get(self) -> u16 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl From<u16> for $name {
            fn from(raw: u16) -> Self {
                Self(raw)
            }
        }
    };
}

topology_id!(
    /// Identifier of an audio domain (one independently addressable subsystem).
    DomainId,
    "domain:"
);

topology_id!(
    /// Identifier of a source endpoint.
    SourceId,
    "source:"
);

topology_id!(
    /// Identifier of a sink endpoint.
    SinkId,
    "sink:"
);

topology_id!(
    /// Identifier of a cross-domain gateway.
    GatewayId,
    "gateway:"
);

topology_id!(
    /// Identifier of a same-domain converter.
    ConverterId,
    "converter:"
);

topology_id!(
    /// Identifier of a live connection.
    ConnectionId,
    "connection:"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(DomainId::new(3).to_string(), "domain:3");
        assert_eq!(SinkId::new(12).to_string(), "sink:12");
        assert_eq!(GatewayId::from(7).to_string(), "gateway:7");
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&SourceId::new(42)).unwrap();
        assert_eq!(json, "42");
        let back: SourceId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(), 42);
    }
}
