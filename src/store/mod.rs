//! Topology storage backends.
//!
//! The router only reads from a store. Every enumeration returns the
//! current state, so calling it again after a mutation yields the new
//! snapshot.

pub mod memory;

use crate::types::{Connection, Converter, Gateway, Sink, SinkId, Source, SourceId};

/// Read access to the authoritative audio topology.
///
/// Implementations must return enumerations in a stable order (by
/// identifier) so that graph builds, and therefore routes, are
/// deterministic for a given topology.
pub trait TopologyStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// All registered sources.
    fn sources(&self) -> Result<Vec<Source>, Self::Error>;

    /// All registered sinks.
    fn sinks(&self) -> Result<Vec<Sink>, Self::Error>;

    /// All registered gateways.
    fn gateways(&self) -> Result<Vec<Gateway>, Self::Error>;

    /// All registered converters.
    fn converters(&self) -> Result<Vec<Converter>, Self::Error>;

    /// All live connections.
    fn connections(&self) -> Result<Vec<Connection>, Self::Error>;

    /// Fetch a source by ID.
    fn source(&self, id: SourceId) -> Result<Option<Source>, Self::Error>;

    /// Fetch a sink by ID.
    fn sink(&self, id: SinkId) -> Result<Option<Sink>, Self::Error>;

    /// Whether a live connection occupies either terminal of a bridge.
    fn is_bridge_connected(&self, bridge_sink: SinkId, bridge_source: SourceId) -> Result<bool, Self::Error> {
        Ok(self
            .connections()?
            .iter()
            .any(|c| c.occupies(bridge_sink, bridge_source)))
    }
}

pub use memory::InMemoryTopologyStore;
