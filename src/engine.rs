//! Routing engine.
//!
//! Owns the current graph generation and answers route queries against it.
//!
//! ## Query flow
//!
//! 1. Resolve the source and sink through the store (unknown ID: not found)
//! 2. Rebuild the graph if the topology changed since the last build
//! 3. Acyclic search: collect candidate node-paths with a revisit budget of 0
//! 4. Negotiate candidates shortest first until `max_routes` routes exist
//! 5. Only if step 4 produced nothing and the configured budget is above 0,
//!    repeat steps 3 and 4 with that budget, keeping only the node-paths
//!    that re-enter a domain (the others already failed in step 4)
//!
//! ## Freshness
//!
//! The engine never rebuilds on notification. [`RoutingEngine::invalidate`]
//! marks the generation stale and the next query (or an explicit
//! [`RoutingEngine::ensure_fresh`]) rebuilds it. Queries hold an `Arc` to
//! their generation, so a rebuild never pulls the graph out from under a
//! running search.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::builder::RoutingTopology;
use crate::canonical::TopologyFingerprint;
use crate::config::RouterConfig;
use crate::error::RoutingError;
use crate::graph::NodeHandle;
use crate::negotiate::negotiate;
use crate::policy::FormatPolicy;
use crate::search::{busy_bridges, find_candidates, find_revisiting_candidates, route_skeleton, SearchPhase};
use crate::store::TopologyStore;
use crate::types::{Route, SinkId, SourceId};

/// Successful answer to a route query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSet {
    /// Resolved routes, shortest first.
    pub routes: Vec<Route>,
    /// Search pass that produced the routes.
    pub phase: SearchPhase,
    /// Fingerprint of the topology the routes were computed on.
    pub fingerprint: TopologyFingerprint,
}

/// Audio routing engine.
pub struct RoutingEngine<S, P> {
    store: Arc<S>,
    policy: P,
    config: RouterConfig,
    dirty: AtomicBool,
    generation: Mutex<Option<Arc<RoutingTopology>>>,
    rebuilds: AtomicU64,
}

impl<S, P> RoutingEngine<S, P>
where
    S: TopologyStore,
    P: FormatPolicy,
{
    /// Create an engine. The first query builds the graph.
    pub fn new(store: Arc<S>, policy: P, config: RouterConfig) -> Self {
        Self {
            store,
            policy,
            config,
            dirty: AtomicBool::new(true),
            generation: Mutex::new(None),
            rebuilds: AtomicU64::new(0),
        }
    }

    /// The topology store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Active configuration.
    pub fn config(&self) -> RouterConfig {
        self.config
    }

    /// Number of graph builds so far.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds.load(Ordering::Relaxed)
    }

    /// Whether the next query will rebuild the graph.
    pub fn is_stale(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Mark the current graph generation stale.
    pub fn invalidate(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// A source, sink, gateway or converter was added or removed.
    ///
    /// Must be called before the next query after such a change. Live
    /// connection changes need no notification.
    pub fn on_topology_changed(&self) {
        tracing::trace!("Topology changed, graph marked stale");
        self.invalidate();
    }

    /// Current graph generation, rebuilt first if stale.
    pub fn ensure_fresh(&self) -> Result<Arc<RoutingTopology>, RoutingError> {
        let mut slot = self.generation.lock();
        let stale = self.dirty.swap(false, Ordering::AcqRel);
        if let (false, Some(current)) = (stale, slot.as_ref()) {
            return Ok(Arc::clone(current));
        }

        let built = match RoutingTopology::build(&*self.store) {
            Ok(topology) => Arc::new(topology),
            Err(e) => {
                self.dirty.store(true, Ordering::Release);
                return Err(e);
            }
        };
        *slot = Some(Arc::clone(&built));
        let generation = self.rebuilds.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(
            generation,
            nodes = built.graph().node_count(),
            edges = built.graph().edge_count(),
            fingerprint = %built.fingerprint(),
            "Routing graph rebuilt"
        );
        Ok(built)
    }

    /// Compute up to `max_routes` routes from `source_id` to `sink_id`.
    ///
    /// With `only_free`, gateways and converters that already carry a live
    /// connection are not used. A node-path that does not split into hops is
    /// logged and skipped, so the only error classes are not found and not
    /// possible.
    pub fn get_route(
        &self,
        only_free: bool,
        source_id: SourceId,
        sink_id: SinkId,
    ) -> Result<RouteSet, RoutingError> {
        let (topology, from, to) = self.resolve(source_id, sink_id)?;
        let busy = if only_free {
            busy_bridges(&topology, &*self.store)?
        } else {
            BTreeSet::new()
        };

        let routes = self.search(&topology, from, to, SearchPhase::Acyclic, 0, &busy);
        if !routes.is_empty() {
            return Ok(RouteSet {
                routes,
                phase: SearchPhase::Acyclic,
                fingerprint: topology.fingerprint(),
            });
        }

        let budget = self.config.max_domain_cycles();
        if budget > 0 {
            tracing::info!(%source_id, %sink_id, budget, "No acyclic route, searching with domain cycles");
            let routes = self.search(&topology, from, to, SearchPhase::WithCycles, budget, &busy);
            if !routes.is_empty() {
                return Ok(RouteSet {
                    routes,
                    phase: SearchPhase::WithCycles,
                    fingerprint: topology.fingerprint(),
                });
            }
        }

        Err(RoutingError::NoRoute { source_id, sink_id })
    }

    /// Shortest node-path as a route whose formats are all `UNKNOWN`.
    ///
    /// Ignores domain revisits and live connections. Fails with
    /// [`RoutingError::MalformedPath`] (status `Internal`) if the graph ever
    /// yields a path that does not split into hops.
    pub fn shortest_route(&self, source_id: SourceId, sink_id: SinkId) -> Result<Route, RoutingError> {
        let (topology, from, to) = self.resolve(source_id, sink_id)?;
        let path = topology
            .graph()
            .shortest_path(from, to)
            .ok_or(RoutingError::NoRoute { source_id, sink_id })?;
        route_skeleton(&topology, &path)
    }

    /// Look both endpoints up in the store, then locate them in a fresh graph.
    fn resolve(
        &self,
        source_id: SourceId,
        sink_id: SinkId,
    ) -> Result<(Arc<RoutingTopology>, NodeHandle, NodeHandle), RoutingError> {
        let source = self
            .store
            .source(source_id)
            .map_err(RoutingError::from_store)?
            .ok_or(RoutingError::SourceNotFound(source_id))?;
        let sink = self
            .store
            .sink(sink_id)
            .map_err(RoutingError::from_store)?
            .ok_or(RoutingError::SinkNotFound(sink_id))?;

        let topology = self.ensure_fresh()?;
        let from = topology
            .source_node_in(source_id, source.domain_id)
            .ok_or(RoutingError::SourceNotFound(source_id))?;
        let to = topology
            .sink_node_in(sink_id, sink.domain_id)
            .ok_or(RoutingError::SinkNotFound(sink_id))?;
        Ok((topology, from, to))
    }

    fn search(
        &self,
        topology: &RoutingTopology,
        from: NodeHandle,
        to: NodeHandle,
        phase: SearchPhase,
        budget: u32,
        busy: &BTreeSet<NodeHandle>,
    ) -> Vec<Route> {
        let candidates = match phase {
            SearchPhase::Acyclic => find_candidates(topology, from, to, budget, busy),
            SearchPhase::WithCycles => find_revisiting_candidates(topology, from, to, budget, busy),
        };
        tracing::debug!(?phase, budget, candidates = candidates.len(), "Candidate node-paths collected");
        negotiate_candidates(topology, &candidates, &self.policy, self.config.max_routes())
    }
}

/// Negotiate candidates in order until `cap` routes exist.
///
/// A candidate that does not split into hops is logged and skipped.
fn negotiate_candidates<P: FormatPolicy + ?Sized>(
    topology: &RoutingTopology,
    candidates: &[Vec<NodeHandle>],
    policy: &P,
    cap: usize,
) -> Vec<Route> {
    let mut routes = Vec::new();
    for path in candidates {
        if routes.len() >= cap {
            break;
        }
        let produced = match negotiate(topology, path, policy, cap - routes.len()) {
            Ok(produced) => produced,
            Err(e) => {
                tracing::error!(error = %e, "Graph produced a malformed node-path, skipped");
                continue;
            }
        };
        if produced.is_empty() {
            tracing::debug!(hops = (path.len() + 1) / 3, "Node-path rejected by negotiation");
        }
        routes.extend(produced);
    }
    routes
}

impl<S, P> std::fmt::Debug for RoutingEngine<S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingEngine")
            .field("config", &self.config)
            .field("stale", &self.dirty.load(Ordering::Relaxed))
            .field("rebuilds", &self.rebuilds.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
