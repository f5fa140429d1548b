//! Connection formats.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Encoding identifier negotiated per hop of a route.
///
/// Values below [`ConnectionFormat::CUSTOM_BASE`] are the well-known formats;
/// product-specific codecs use values from that base upwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionFormat(u16);

impl ConnectionFormat {
    /// Not yet negotiated. Every edge and routing element starts here.
    pub const UNKNOWN: Self = Self(0);
    /// Mono stream.
    pub const MONO: Self = Self(1);
    /// Stereo stream.
    pub const STEREO: Self = Self(2);
    /// Analog connection.
    pub const ANALOG: Self = Self(3);
    /// Format picked automatically by the domain.
    pub const AUTO: Self = Self(4);
    /// First value available to product-specific formats.
    pub const CUSTOM_BASE: u16 = 0x100;

    /// Create a format from its raw value.
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Whether this is the unresolved placeholder.
    pub fn is_unknown(self) -> bool {
        self == Self::UNKNOWN
    }
}

impl Default for ConnectionFormat {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl fmt::Display for ConnectionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::UNKNOWN => write!(f, "unknown"),
            Self::MONO => write!(f, "mono"),
            Self::STEREO => write!(f, "stereo"),
            Self::ANALOG => write!(f, "analog"),
            Self::AUTO => write!(f, "auto"),
            Self(raw) => write!(f, "cf:{raw}"),
        }
    }
}

/// Formats both sides of a hop accept.
///
/// Result is sorted ascending and free of duplicates regardless of the
/// order or duplication of the inputs.
pub fn intersect_formats(a: &[ConnectionFormat], b: &[ConnectionFormat]) -> Vec<ConnectionFormat> {
    let left: BTreeSet<_> = a.iter().copied().collect();
    let right: BTreeSet<_> = b.iter().copied().collect();
    left.intersection(&right).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PCM: ConnectionFormat = ConnectionFormat::new(0x100);
    const MP3: ConnectionFormat = ConnectionFormat::new(0x101);

    #[test]
    fn test_intersection_sorted_and_deduplicated() {
        let a = [MP3, ConnectionFormat::STEREO, PCM, MP3];
        let b = [PCM, MP3, ConnectionFormat::MONO, PCM];
        assert_eq!(intersect_formats(&a, &b), vec![PCM, MP3]);
    }

    #[test]
    fn test_intersection_empty() {
        assert!(intersect_formats(&[PCM], &[MP3]).is_empty());
        assert!(intersect_formats(&[], &[MP3]).is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(ConnectionFormat::STEREO.to_string(), "stereo");
        assert_eq!(PCM.to_string(), "cf:256");
        assert!(ConnectionFormat::default().is_unknown());
    }
}
