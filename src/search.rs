//! Candidate node-path search.
//!
//! Enumerates every simple path between a source node and a sink node of one
//! [`RoutingTopology`] generation and orders the results by hop count.
//!
//! ## Filters
//!
//! Two filters run inside the traversal, before a node is appended:
//!
//! 1. **Domain trail**: a stack of the domains along the current path.
//!    Entering the domain on top of the stack is free. Entering a domain
//!    that appears further down (the path left it and is coming back)
//!    spends one unit of the revisit budget. The spent units are returned
//!    when the traversal backs out of the node.
//! 2. **Busy bridges**: when only free routes are requested, gateways and
//!    converters already carrying a live connection are skipped.
//!
//! [`find_revisiting_candidates`] additionally drops every complete path
//! that never re-entered a domain. Those paths are exactly the ones a
//! zero-budget search already returned.
//!
//! ## Node-path layout
//!
//! Because of the builder's wiring rules every complete path has the shape
//!
//! ```text
//! Source, Sink, (Bridge, Source, Sink)*
//! ```
//!
//! [`split_hops`] checks that shape and cuts the path into hops.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::builder::{RoutingNode, RoutingTopology};
use crate::error::RoutingError;
use crate::graph::{NodeHandle, PathVisitor};
use crate::store::TopologyStore;
use crate::types::{ConversionMatrix, DomainId, Route, RoutingElement, Sink, Source};

/// Which search pass produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    /// Paths never return to a domain they left.
    Acyclic,
    /// Paths may return to a domain up to the configured budget.
    WithCycles,
}

/// Domains along the current traversal path.
#[derive(Debug, Clone)]
pub struct DomainTrail {
    /// `(domain, entered_as_revisit)` per path node.
    stack: Vec<(DomainId, bool)>,
    revisits: u32,
    budget: u32,
}

impl DomainTrail {
    /// Create an empty trail.
    pub fn new(budget: u32) -> Self {
        Self {
            stack: Vec::new(),
            revisits: 0,
            budget,
        }
    }

    /// Create a trail whose first node is in `origin`.
    pub fn starting_in(origin: DomainId, budget: u32) -> Self {
        let mut trail = Self::new(budget);
        trail.enter(origin);
        trail
    }

    /// Whether a node in `domain` may be appended.
    pub fn admits(&self, domain: DomainId) -> bool {
        if !self.is_revisit(domain) {
            return true;
        }
        self.revisits < self.budget
    }

    /// Append a node in `domain`.
    pub fn enter(&mut self, domain: DomainId) {
        let revisit = self.is_revisit(domain);
        if revisit {
            self.revisits += 1;
        }
        self.stack.push((domain, revisit));
    }

    /// Remove the last node.
    pub fn leave(&mut self) {
        if let Some((_, true)) = self.stack.pop() {
            self.revisits -= 1;
        }
    }

    /// Revisits spent by the current path.
    pub fn revisits(&self) -> u32 {
        self.revisits
    }

    /// Path depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn is_revisit(&self, domain: DomainId) -> bool {
        match self.stack.split_last() {
            None => false,
            Some((&(last, _), _)) if last == domain => false,
            Some((_, earlier)) => earlier.iter().any(|&(d, _)| d == domain),
        }
    }
}

/// Visitor collecting complete paths, shortest first.
struct CandidateCollector<'a> {
    trail: DomainTrail,
    busy: &'a BTreeSet<NodeHandle>,
    min_revisits: u32,
    candidates: Vec<Vec<NodeHandle>>,
}

impl PathVisitor<RoutingNode> for CandidateCollector<'_> {
    fn should_visit(&mut self, handle: NodeHandle, node: &RoutingNode) -> bool {
        if node.is_bridge() && self.busy.contains(&handle) {
            return false;
        }
        self.trail.admits(node.domain_id())
    }

    fn will_visit(&mut self, _handle: NodeHandle, node: &RoutingNode) {
        self.trail.enter(node.domain_id());
    }

    fn did_visit(&mut self, _handle: NodeHandle, _node: &RoutingNode) {
        self.trail.leave();
    }

    fn did_find_path(&mut self, path: &[NodeHandle]) {
        if self.trail.revisits() < self.min_revisits {
            return;
        }
        // after every path of equal length, so discovery order is kept among equals
        let at = self
            .candidates
            .iter()
            .position(|c| c.len() > path.len())
            .unwrap_or(self.candidates.len());
        self.candidates.insert(at, path.to_vec());
    }
}

/// All node-paths from `from` to `to` admitted by the filters, ordered by
/// ascending length.
pub fn find_candidates(
    topology: &RoutingTopology,
    from: NodeHandle,
    to: NodeHandle,
    budget: u32,
    busy: &BTreeSet<NodeHandle>,
) -> Vec<Vec<NodeHandle>> {
    collect(topology, from, to, budget, 0, busy)
}

/// Like [`find_candidates`], keeping only paths that spend at least one
/// revisit.
pub fn find_revisiting_candidates(
    topology: &RoutingTopology,
    from: NodeHandle,
    to: NodeHandle,
    budget: u32,
    busy: &BTreeSet<NodeHandle>,
) -> Vec<Vec<NodeHandle>> {
    if budget == 0 {
        return Vec::new();
    }
    collect(topology, from, to, budget, 1, busy)
}

fn collect(
    topology: &RoutingTopology,
    from: NodeHandle,
    to: NodeHandle,
    budget: u32,
    min_revisits: u32,
    busy: &BTreeSet<NodeHandle>,
) -> Vec<Vec<NodeHandle>> {
    let Some(origin) = topology.node(from) else {
        return Vec::new();
    };
    let mut collector = CandidateCollector {
        trail: DomainTrail::starting_in(origin.domain_id(), budget),
        busy,
        min_revisits,
        candidates: Vec::new(),
    };
    topology.graph().all_paths(from, to, &mut collector);
    collector.candidates
}

/// Bridges of a topology that currently carry a live connection.
pub fn busy_bridges<S: TopologyStore + ?Sized>(
    topology: &RoutingTopology,
    store: &S,
) -> Result<BTreeSet<NodeHandle>, RoutingError> {
    let mut busy = BTreeSet::new();
    for handle in topology.bridge_nodes() {
        let Some((sink, source)) = topology.node(handle).and_then(RoutingNode::bridge_terminals) else {
            continue;
        };
        if store
            .is_bridge_connected(sink, source)
            .map_err(RoutingError::from_store)?
        {
            busy.insert(handle);
        }
    }
    Ok(busy)
}

/// One source→sink hop of a node-path.
#[derive(Debug, Clone, Copy)]
pub struct PathHop<'t> {
    /// Hop source.
    pub source: &'t Source,
    /// Hop sink.
    pub sink: &'t Sink,
    /// Conversion rules of the bridge feeding this hop's source.
    pub via: Option<&'t ConversionMatrix>,
}

impl PathHop<'_> {
    /// Routing element of the hop, format unresolved.
    pub fn element(&self) -> RoutingElement {
        RoutingElement::unresolved(self.source.domain_id, self.source.source_id, self.sink.sink_id)
    }
}

/// Cut a node-path into hops.
///
/// Fails with [`RoutingError::MalformedPath`] when the path does not follow
/// the `Source, Sink, (Bridge, Source, Sink)*` layout.
pub fn split_hops<'t>(
    topology: &'t RoutingTopology,
    path: &[NodeHandle],
) -> Result<Vec<PathHop<'t>>, RoutingError> {
    let node_at = move |i: usize| path.get(i).and_then(|&h| topology.node(h));
    let malformed = move |i: usize, expected: &str| {
        let shown: Vec<String> = path
            .iter()
            .map(|&h| topology.node(h).map_or_else(|| h.to_string(), ToString::to_string))
            .collect();
        RoutingError::MalformedPath(format!(
            "expected {expected} at position {i} of [{}]",
            shown.join(", ")
        ))
    };

    let mut hops = Vec::new();
    let mut via = None;
    let mut cursor = 0;
    loop {
        let Some(RoutingNode::Source(source)) = node_at(cursor) else {
            return Err(malformed(cursor, "source"));
        };
        let Some(RoutingNode::Sink(sink)) = node_at(cursor + 1) else {
            return Err(malformed(cursor + 1, "sink"));
        };
        hops.push(PathHop { source, sink, via });

        cursor += 2;
        if cursor == path.len() {
            return Ok(hops);
        }
        match node_at(cursor) {
            Some(bridge) if bridge.is_bridge() => via = bridge.conversion(),
            _ => return Err(malformed(cursor, "bridge")),
        }
        cursor += 1;
    }
}

/// Route with every format left `UNKNOWN`, one element per hop.
pub fn route_skeleton(topology: &RoutingTopology, path: &[NodeHandle]) -> Result<Route, RoutingError> {
    let hops = split_hops(topology, path)?;
    let elements: Vec<RoutingElement> = hops.iter().map(PathHop::element).collect();
    match (hops.first(), hops.last()) {
        (Some(first), Some(last)) => Ok(Route::new(first.source.source_id, last.sink.sink_id, elements)),
        _ => Err(RoutingError::MalformedPath("empty node-path".into())),
    }
}
