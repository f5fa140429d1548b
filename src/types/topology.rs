//! Topology records as registered by the audio domains.
//!
//! These are the read-only inputs of the graph builder. The router copies
//! what it needs into graph nodes at build time and never writes back.

use serde::{Deserialize, Serialize};

use super::format::ConnectionFormat;
use super::ids::{ConnectionId, ConverterId, DomainId, GatewayId, SinkId, SourceId};
use super::matrix::ConversionMatrix;

/// An audio signal origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Source identifier.
    pub source_id: SourceId,
    /// Owning domain.
    pub domain_id: DomainId,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Formats the source can produce.
    pub connection_formats: Vec<ConnectionFormat>,
}

impl Source {
    /// Create a new source record.
    pub fn new(
        source_id: SourceId,
        domain_id: DomainId,
        name: impl Into<String>,
        connection_formats: Vec<ConnectionFormat>,
    ) -> Self {
        Self {
            source_id,
            domain_id,
            name: name.into(),
            connection_formats,
        }
    }
}

/// An audio signal destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sink {
    /// Sink identifier.
    pub sink_id: SinkId,
    /// Owning domain.
    pub domain_id: DomainId,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Formats the sink accepts.
    pub connection_formats: Vec<ConnectionFormat>,
}

impl Sink {
    /// Create a new sink record.
    pub fn new(
        sink_id: SinkId,
        domain_id: DomainId,
        name: impl Into<String>,
        connection_formats: Vec<ConnectionFormat>,
    ) -> Self {
        Self {
            sink_id,
            domain_id,
            name: name.into(),
            connection_formats,
        }
    }
}

/// Cross-domain bridge.
///
/// Audio enters through the hidden sink `sink_id` (in `domain_sink_id`) and
/// leaves through the hidden source `source_id` (in `domain_source_id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gateway {
    /// Gateway identifier.
    pub gateway_id: GatewayId,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Hidden sink terminal.
    pub sink_id: SinkId,
    /// Hidden source terminal.
    pub source_id: SourceId,
    /// Domain of the hidden sink.
    pub domain_sink_id: DomainId,
    /// Domain of the hidden source.
    pub domain_source_id: DomainId,
    /// Domain that controls the gateway.
    pub control_domain_id: DomainId,
    /// Conversion rules between the two terminals.
    pub conversion: ConversionMatrix,
}

/// Same-domain format-converting bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Converter {
    /// Converter identifier.
    pub converter_id: ConverterId,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Hidden sink terminal.
    pub sink_id: SinkId,
    /// Hidden source terminal.
    pub source_id: SourceId,
    /// Domain of both terminals.
    pub domain_id: DomainId,
    /// Conversion rules between the two terminals.
    pub conversion: ConversionMatrix,
}

/// A live connection between a source and a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Connection identifier.
    pub connection_id: ConnectionId,
    /// Connected source.
    pub source_id: SourceId,
    /// Connected sink.
    pub sink_id: SinkId,
    /// Negotiated format.
    pub connection_format: ConnectionFormat,
}

impl Connection {
    /// Create a new connection record.
    pub fn new(
        connection_id: ConnectionId,
        source_id: SourceId,
        sink_id: SinkId,
        connection_format: ConnectionFormat,
    ) -> Self {
        Self {
            connection_id,
            source_id,
            sink_id,
            connection_format,
        }
    }

    /// Whether this connection occupies one of a bridge's terminals.
    pub fn occupies(&self, bridge_sink: SinkId, bridge_source: SourceId) -> bool {
        self.sink_id == bridge_sink || self.source_id == bridge_source
    }
}

/// Full topology at one point in time.
///
/// Used as the serialized fixture format of the in-memory store and as the
/// input of topology fingerprints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    /// All sources.
    #[serde(default)]
    pub sources: Vec<Source>,
    /// All sinks.
    #[serde(default)]
    pub sinks: Vec<Sink>,
    /// All gateways.
    #[serde(default)]
    pub gateways: Vec<Gateway>,
    /// All converters.
    #[serde(default)]
    pub converters: Vec<Converter>,
    /// Live connections.
    #[serde(default)]
    pub connections: Vec<Connection>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_occupies_bridge_terminals() {
        let conn = Connection::new(
            ConnectionId::new(1),
            SourceId::new(10),
            SinkId::new(20),
            ConnectionFormat::STEREO,
        );
        assert!(conn.occupies(SinkId::new(20), SourceId::new(99)));
        assert!(conn.occupies(SinkId::new(99), SourceId::new(10)));
        assert!(!conn.occupies(SinkId::new(99), SourceId::new(99)));
    }

    #[test]
    fn test_snapshot_json_defaults() {
        let snapshot: TopologySnapshot = serde_json::from_str(
            r#"{"sources":[{"source_id":1,"domain_id":1,"connection_formats":[2]}]}"#,
        )
        .unwrap();
        assert_eq!(snapshot.sources.len(), 1);
        assert!(snapshot.sources[0].name.is_empty());
        assert!(snapshot.gateways.is_empty());
    }
}
