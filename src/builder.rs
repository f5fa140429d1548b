//! Routing graph construction.
//!
//! Translates a topology snapshot into a [`RoutingGraph`] of
//! [`RoutingNode`]s. Sources, sinks, gateways and converters each become one
//! node; a bridge's hidden sink and hidden source are the ordinary sink and
//! source nodes it references, so a wired bridge always forms the chain
//!
//! ```text
//! hidden sink → bridge → hidden source
//! ```
//!
//! ## Edge rules
//!
//! - source → sink: same domain and a non-empty format intersection
//! - hidden sink → gateway → hidden source: both terminals resolved in
//!   their declared domains and a usable conversion matrix
//! - hidden sink → converter → hidden source: as for gateways, with both
//!   terminals in the converter's domain
//!
//! A bridge whose terminals cannot be resolved gets no edges. It stays in
//! the graph but is unreachable until the next build.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::canonical::TopologyFingerprint;
use crate::error::RoutingError;
use crate::graph::{NodeHandle, RoutingGraph};
use crate::store::TopologyStore;
use crate::types::{
    intersect_formats, ConnectionFormat, ConversionMatrix, Converter, DomainId, Gateway, Sink,
    SinkId, Source, SourceId,
};

/// Edge weight used for every hop.
pub const HOP_WEIGHT: u16 = 1;

/// Graph vertex. Carries a copy of the topology record it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingNode {
    /// Source endpoint.
    Source(Source),
    /// Sink endpoint.
    Sink(Sink),
    /// Cross-domain bridge.
    Gateway(Gateway),
    /// Same-domain bridge.
    Converter(Converter),
}

impl RoutingNode {
    /// Domain used for cycle counting. Gateways count in their control domain.
    pub fn domain_id(&self) -> DomainId {
        match self {
            Self::Source(s) => s.domain_id,
            Self::Sink(s) => s.domain_id,
            Self::Gateway(g) => g.control_domain_id,
            Self::Converter(c) => c.domain_id,
        }
    }

    /// Whether this is a gateway or converter.
    pub fn is_bridge(&self) -> bool {
        matches!(self, Self::Gateway(_) | Self::Converter(_))
    }

    /// Hidden `(sink, source)` terminals of a bridge.
    pub fn bridge_terminals(&self) -> Option<(SinkId, SourceId)> {
        match self {
            Self::Gateway(g) => Some((g.sink_id, g.source_id)),
            Self::Converter(c) => Some((c.sink_id, c.source_id)),
            _ => None,
        }
    }

    /// Conversion rules of a bridge.
    pub fn conversion(&self) -> Option<&ConversionMatrix> {
        match self {
            Self::Gateway(g) => Some(&g.conversion),
            Self::Converter(c) => Some(&c.conversion),
            _ => None,
        }
    }
}

impl std::fmt::Display for RoutingNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source(s) => write!(f, "[SOUR:{}:{}({})]", s.source_id.get(), s.name, s.domain_id.get()),
            Self::Sink(s) => write!(f, "[SINK:{}:{}({})]", s.sink_id.get(), s.name, s.domain_id.get()),
            Self::Gateway(g) => write!(f, "[GATE:{}:{}({})]", g.gateway_id.get(), g.name, g.control_domain_id.get()),
            Self::Converter(c) => write!(f, "[CONV:{}:{}({})]", c.converter_id.get(), c.name, c.domain_id.get()),
        }
    }
}

/// Structural part of a topology, the input of one graph build.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildInput {
    /// Sources ordered by ID.
    pub sources: Vec<Source>,
    /// Sinks ordered by ID.
    pub sinks: Vec<Sink>,
    /// Gateways ordered by ID.
    pub gateways: Vec<Gateway>,
    /// Converters ordered by ID.
    pub converters: Vec<Converter>,
}

impl BuildInput {
    /// Enumerate the structural records of a store.
    pub fn from_store<S: TopologyStore + ?Sized>(store: &S) -> Result<Self, RoutingError> {
        Ok(Self {
            sources: store.sources().map_err(RoutingError::from_store)?,
            sinks: store.sinks().map_err(RoutingError::from_store)?,
            gateways: store.gateways().map_err(RoutingError::from_store)?,
            converters: store.converters().map_err(RoutingError::from_store)?,
        })
    }
}

/// Counters of one build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Bridges with both hidden terminals wired.
    pub wired_bridges: usize,
    /// Bridges left without edges.
    pub unwired_bridges: usize,
}

/// One graph generation plus per-domain indices into it.
#[derive(Debug, Clone)]
pub struct RoutingTopology {
    graph: RoutingGraph<RoutingNode>,
    sources: BTreeMap<DomainId, Vec<NodeHandle>>,
    sinks: BTreeMap<DomainId, Vec<NodeHandle>>,
    gateways: BTreeMap<DomainId, Vec<NodeHandle>>,
    converters: BTreeMap<DomainId, Vec<NodeHandle>>,
    fingerprint: TopologyFingerprint,
    stats: BuildStats,
}

impl RoutingTopology {
    /// Build a graph generation from the current store contents.
    pub fn build<S: TopologyStore + ?Sized>(store: &S) -> Result<Self, RoutingError> {
        Self::from_input(BuildInput::from_store(store)?)
    }

    /// Build a graph generation from already enumerated records.
    pub fn from_input(input: BuildInput) -> Result<Self, RoutingError> {
        let fingerprint = TopologyFingerprint::of(&input)?;
        let mut topology = Self {
            graph: RoutingGraph::new(),
            sources: BTreeMap::new(),
            sinks: BTreeMap::new(),
            gateways: BTreeMap::new(),
            converters: BTreeMap::new(),
            fingerprint,
            stats: BuildStats::default(),
        };

        for source in input.sources {
            let domain = source.domain_id;
            let handle = topology.graph.add_node(RoutingNode::Source(source));
            topology.sources.entry(domain).or_default().push(handle);
        }
        for sink in input.sinks {
            let domain = sink.domain_id;
            let handle = topology.graph.add_node(RoutingNode::Sink(sink));
            topology.sinks.entry(domain).or_default().push(handle);
        }
        for gateway in input.gateways {
            let domain = gateway.control_domain_id;
            let handle = topology.graph.add_node(RoutingNode::Gateway(gateway));
            topology.gateways.entry(domain).or_default().push(handle);
        }
        for converter in input.converters {
            let domain = converter.domain_id;
            let handle = topology.graph.add_node(RoutingNode::Converter(converter));
            topology.converters.entry(domain).or_default().push(handle);
        }

        topology.connect_converters();
        topology.connect_gateways();
        topology.connect_sources_to_sinks();

        tracing::debug!(
            nodes = topology.graph.node_count(),
            edges = topology.graph.edge_count(),
            wired_bridges = topology.stats.wired_bridges,
            unwired_bridges = topology.stats.unwired_bridges,
            fingerprint = %topology.fingerprint,
            "Routing graph built"
        );

        Ok(topology)
    }

    fn connect_sources_to_sinks(&mut self) {
        for (domain, sources) in &self.sources {
            let Some(sinks) = self.sinks.get(domain) else {
                continue;
            };
            for &source in sources {
                for &sink in sinks {
                    let (Some(RoutingNode::Source(src)), Some(RoutingNode::Sink(snk))) =
                        (self.graph.node(source), self.graph.node(sink))
                    else {
                        continue;
                    };
                    if !intersect_formats(&src.connection_formats, &snk.connection_formats).is_empty() {
                        self.graph.connect_nodes(source, sink, ConnectionFormat::UNKNOWN, HOP_WEIGHT);
                    }
                }
            }
        }
    }

    fn connect_gateways(&mut self) {
        let bridges: Vec<NodeHandle> = self.gateways.values().flatten().copied().collect();
        for bridge in bridges {
            let Some(RoutingNode::Gateway(gateway)) = self.graph.node(bridge) else {
                continue;
            };
            let terminals = (
                self.sink_node_in(gateway.sink_id, gateway.domain_sink_id),
                self.source_node_in(gateway.source_id, gateway.domain_source_id),
            );
            let usable = gateway.conversion.is_usable();
            let gateway_id = gateway.gateway_id;
            self.wire_bridge(bridge, terminals, usable, &gateway_id);
        }
    }

    fn connect_converters(&mut self) {
        let bridges: Vec<NodeHandle> = self.converters.values().flatten().copied().collect();
        for bridge in bridges {
            let Some(RoutingNode::Converter(converter)) = self.graph.node(bridge) else {
                continue;
            };
            let terminals = (
                self.sink_node_in(converter.sink_id, converter.domain_id),
                self.source_node_in(converter.source_id, converter.domain_id),
            );
            let usable = converter.conversion.is_usable();
            let converter_id = converter.converter_id;
            self.wire_bridge(bridge, terminals, usable, &converter_id);
        }
    }

    fn wire_bridge(
        &mut self,
        bridge: NodeHandle,
        terminals: (Option<NodeHandle>, Option<NodeHandle>),
        usable: bool,
        id: &dyn std::fmt::Display,
    ) {
        match terminals {
            (Some(hidden_sink), Some(hidden_source)) if usable => {
                self.graph.connect_nodes(hidden_sink, bridge, ConnectionFormat::UNKNOWN, HOP_WEIGHT);
                self.graph.connect_nodes(bridge, hidden_source, ConnectionFormat::UNKNOWN, HOP_WEIGHT);
                self.stats.wired_bridges += 1;
            }
            (hidden_sink, hidden_source) => {
                tracing::warn!(
                    bridge = %id,
                    sink_resolved = hidden_sink.is_some(),
                    source_resolved = hidden_source.is_some(),
                    matrix_usable = usable,
                    "Bridge left unconnected"
                );
                self.stats.unwired_bridges += 1;
            }
        }
    }

    /// The graph of this generation.
    pub fn graph(&self) -> &RoutingGraph<RoutingNode> {
        &self.graph
    }

    /// Node payload.
    pub fn node(&self, handle: NodeHandle) -> Option<&RoutingNode> {
        self.graph.node(handle)
    }

    /// Fingerprint of the records this generation was built from.
    pub fn fingerprint(&self) -> TopologyFingerprint {
        self.fingerprint
    }

    /// Build counters.
    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Find a source node in any domain.
    pub fn source_node(&self, id: SourceId) -> Option<NodeHandle> {
        self.sources.keys().find_map(|&domain| self.source_node_in(id, domain))
    }

    /// Find a source node within one domain.
    pub fn source_node_in(&self, id: SourceId, domain: DomainId) -> Option<NodeHandle> {
        self.sources.get(&domain)?.iter().copied().find(|&h| {
            matches!(self.graph.node(h), Some(RoutingNode::Source(s)) if s.source_id == id)
        })
    }

    /// Find a sink node in any domain.
    pub fn sink_node(&self, id: SinkId) -> Option<NodeHandle> {
        self.sinks.keys().find_map(|&domain| self.sink_node_in(id, domain))
    }

    /// Find a sink node within one domain.
    pub fn sink_node_in(&self, id: SinkId, domain: DomainId) -> Option<NodeHandle> {
        self.sinks.get(&domain)?.iter().copied().find(|&h| {
            matches!(self.graph.node(h), Some(RoutingNode::Sink(s)) if s.sink_id == id)
        })
    }

    /// All bridge nodes, gateways first, each group ordered by domain.
    pub fn bridge_nodes(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.gateways
            .values()
            .chain(self.converters.values())
            .flatten()
            .copied()
    }
}
