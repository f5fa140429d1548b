//! Route types.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::format::ConnectionFormat;
use super::ids::{DomainId, SinkId, SourceId};

/// One source→sink hop of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoutingElement {
    /// Domain in which the hop is connected.
    pub domain_id: DomainId,
    /// Hop source.
    pub source_id: SourceId,
    /// Hop sink.
    pub sink_id: SinkId,
    /// Negotiated format, `UNKNOWN` until negotiation.
    pub connection_format: ConnectionFormat,
}

impl RoutingElement {
    /// Create an element with an unresolved format.
    pub fn unresolved(domain_id: DomainId, source_id: SourceId, sink_id: SinkId) -> Self {
        Self {
            domain_id,
            source_id,
            sink_id,
            connection_format: ConnectionFormat::UNKNOWN,
        }
    }

    /// Same hop with the given format.
    pub fn with_format(self, connection_format: ConnectionFormat) -> Self {
        Self {
            connection_format,
            ..self
        }
    }
}

impl fmt::Display for RoutingElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}->{} {} {}]",
            self.source_id, self.sink_id, self.connection_format, self.domain_id
        )
    }
}

/// Ordered sequence of hops connecting a source to a sink.
///
/// Bridges show up as two consecutive elements: the first ends in the
/// bridge's hidden sink, the next starts at its hidden source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    /// Route origin.
    pub source_id: SourceId,
    /// Route destination.
    pub sink_id: SinkId,
    /// Hops in travel order.
    pub elements: Vec<RoutingElement>,
}

impl Route {
    /// Create a route.
    pub fn new(source_id: SourceId, sink_id: SinkId, elements: Vec<RoutingElement>) -> Self {
        Self {
            source_id,
            sink_id,
            elements,
        }
    }

    /// Number of hops.
    pub fn hop_count(&self) -> usize {
        self.elements.len()
    }

    /// Whether every hop has a negotiated format.
    pub fn is_resolved(&self) -> bool {
        self.elements.iter().all(|e| !e.connection_format.is_unknown())
    }

    /// Domains in travel order, one entry per hop.
    pub fn domains(&self) -> impl Iterator<Item = DomainId> + '_ {
        self.elements.iter().map(|e| e.domain_id)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for element in &self.elements {
            write!(f, "{element}")?;
        }
        Ok(())
    }
}
