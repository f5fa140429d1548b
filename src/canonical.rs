//! Canonical serialization for topology fingerprints.
//!
//! ## Determinism Guarantees
//!
//! - Stable field order: Struct fields serialize in declaration order
//! - Stable Vec order: Vectors serialize in index order
//! - No HashMap allowed: Use BTreeMap for maps in hashed data
//!
//! Store enumerations are ordered by ID, so two stores holding the same
//! entities yield the same fingerprint.

use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes for hashing.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(value)
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<u64, serde_json::Error> {
    let bytes = to_canonical_bytes(value)?;
    Ok(xxh64(&bytes, 0))
}

/// Fingerprint of the topology one graph generation was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopologyFingerprint(u64);

impl TopologyFingerprint {
    /// Fingerprint of any serializable topology view.
    pub fn of<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        canonical_hash(value).map(Self)
    }

    /// Raw hash value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TopologyFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct TestStruct {
        name: String,
        value: i32,
    }

    #[test]
    fn test_determinism() {
        let s = TestStruct {
            name: "test".to_string(),
            value: 42,
        };

        let h1 = canonical_hash(&s).unwrap();
        let h2 = canonical_hash(&s).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_fingerprint_hex() {
        let fp = TopologyFingerprint::of(&vec![1u16, 2, 3]).unwrap();
        assert_eq!(fp.to_string().len(), 16);
        assert_ne!(fp, TopologyFingerprint::of(&vec![1u16, 2]).unwrap());
    }
}
