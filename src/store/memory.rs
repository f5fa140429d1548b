//! In-memory topology store.

use std::collections::BTreeMap;
use std::convert::Infallible;

use parking_lot::RwLock;

use super::TopologyStore;
use crate::types::{
    Connection, ConnectionId, Converter, ConverterId, Gateway, GatewayId, Sink, SinkId, Source,
    SourceId, TopologySnapshot,
};

#[derive(Debug, Default)]
struct Tables {
    sources: BTreeMap<SourceId, Source>,
    sinks: BTreeMap<SinkId, Sink>,
    gateways: BTreeMap<GatewayId, Gateway>,
    converters: BTreeMap<ConverterId, Converter>,
    connections: BTreeMap<ConnectionId, Connection>,
}

/// In-memory topology store.
///
/// Uses BTreeMap for deterministic iteration order. Mutators take `&self`
/// so the store can be shared with a running engine; callers must notify
/// the engine after structural changes (sources, sinks, gateways,
/// converters). Connection changes need no notification.
#[derive(Debug, Default)]
pub struct InMemoryTopologyStore {
    tables: RwLock<Tables>,
}

impl InMemoryTopologyStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with a snapshot.
    pub fn from_snapshot(snapshot: TopologySnapshot) -> Self {
        let store = Self::new();
        {
            let mut t = store.tables.write();
            t.sources = snapshot.sources.into_iter().map(|s| (s.source_id, s)).collect();
            t.sinks = snapshot.sinks.into_iter().map(|s| (s.sink_id, s)).collect();
            t.gateways = snapshot.gateways.into_iter().map(|g| (g.gateway_id, g)).collect();
            t.converters = snapshot.converters.into_iter().map(|c| (c.converter_id, c)).collect();
            t.connections = snapshot.connections.into_iter().map(|c| (c.connection_id, c)).collect();
        }
        store
    }

    /// Load a store from a JSON-encoded [`TopologySnapshot`].
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::from_snapshot(serde_json::from_str(json)?))
    }

    /// Copy of the current contents, ordered by ID.
    pub fn snapshot(&self) -> TopologySnapshot {
        let t = self.tables.read();
        TopologySnapshot {
            sources: t.sources.values().cloned().collect(),
            sinks: t.sinks.values().cloned().collect(),
            gateways: t.gateways.values().cloned().collect(),
            converters: t.converters.values().cloned().collect(),
            connections: t.connections.values().cloned().collect(),
        }
    }

    /// Add or replace a source.
    pub fn add_source(&self, source: Source) -> Option<Source> {
        self.tables.write().sources.insert(source.source_id, source)
    }

    /// Remove a source.
    pub fn remove_source(&self, id: SourceId) -> Option<Source> {
        self.tables.write().sources.remove(&id)
    }

    /// Add or replace a sink.
    pub fn add_sink(&self, sink: Sink) -> Option<Sink> {
        self.tables.write().sinks.insert(sink.sink_id, sink)
    }

    /// Remove a sink.
    pub fn remove_sink(&self, id: SinkId) -> Option<Sink> {
        self.tables.write().sinks.remove(&id)
    }

    /// Add or replace a gateway.
    pub fn add_gateway(&self, gateway: Gateway) -> Option<Gateway> {
        self.tables.write().gateways.insert(gateway.gateway_id, gateway)
    }

    /// Remove a gateway.
    pub fn remove_gateway(&self, id: GatewayId) -> Option<Gateway> {
        self.tables.write().gateways.remove(&id)
    }

    /// Add or replace a converter.
    pub fn add_converter(&self, converter: Converter) -> Option<Converter> {
        self.tables.write().converters.insert(converter.converter_id, converter)
    }

    /// Remove a converter.
    pub fn remove_converter(&self, id: ConverterId) -> Option<Converter> {
        self.tables.write().converters.remove(&id)
    }

    /// Add or replace a live connection.
    pub fn add_connection(&self, connection: Connection) -> Option<Connection> {
        self.tables.write().connections.insert(connection.connection_id, connection)
    }

    /// Remove a live connection.
    pub fn remove_connection(&self, id: ConnectionId) -> Option<Connection> {
        self.tables.write().connections.remove(&id)
    }
}

impl TopologyStore for InMemoryTopologyStore {
    type Error = Infallible;

    fn sources(&self) -> Result<Vec<Source>, Self::Error> {
        Ok(self.tables.read().sources.values().cloned().collect())
    }

    fn sinks(&self) -> Result<Vec<Sink>, Self::Error> {
        Ok(self.tables.read().sinks.values().cloned().collect())
    }

    fn gateways(&self) -> Result<Vec<Gateway>, Self::Error> {
        Ok(self.tables.read().gateways.values().cloned().collect())
    }

    fn converters(&self) -> Result<Vec<Converter>, Self::Error> {
        Ok(self.tables.read().converters.values().cloned().collect())
    }

    fn connections(&self) -> Result<Vec<Connection>, Self::Error> {
        Ok(self.tables.read().connections.values().cloned().collect())
    }

    fn source(&self, id: SourceId) -> Result<Option<Source>, Self::Error> {
        Ok(self.tables.read().sources.get(&id).cloned())
    }

    fn sink(&self, id: SinkId) -> Result<Option<Sink>, Self::Error> {
        Ok(self.tables.read().sinks.get(&id).cloned())
    }

    fn is_bridge_connected(&self, bridge_sink: SinkId, bridge_source: SourceId) -> Result<bool, Self::Error> {
        Ok(self
            .tables
            .read()
            .connections
            .values()
            .any(|c| c.occupies(bridge_sink, bridge_source)))
    }
}
