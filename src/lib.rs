//! # audio-routing-kernel
//!
//! Route computation for multi-domain in-vehicle audio systems.
//!
//! The kernel answers one question:
//!
//! > Given a source and a sink, over which hops and in which formats can
//! > audio travel between them?
//!
//! ## Core Contract
//!
//! 1. Mirror the registered topology (sources, sinks, gateways, converters)
//!    into a directed routing graph, rebuilt lazily after every change
//! 2. Enumerate candidate node-paths, shortest first, without returning to a
//!    domain a path already left (or within a bounded number of returns)
//! 3. Negotiate a concrete connection format for every hop with a caller
//!    supplied policy
//!
//! ## Architecture
//!
//! ```text
//! TopologyStore → RoutingTopology → find_candidates → negotiate → RouteSet
//!                  (graph builder)     (path search)      ↑
//!                                                   FormatPolicy
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same topology + same policy → identical ordered route list
//! - Store enumeration is ordered by ID, so graph layout is stable
//! - Every graph generation carries a fingerprint of its topology

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod canonical;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod negotiate;
pub mod policy;
pub mod search;
pub mod store;
pub mod types;

// Re-exports
pub use types::{
    intersect_formats, Connection, ConnectionFormat, ConnectionId, ConversionMatrix, Converter,
    ConverterId, DomainId, Gateway, GatewayId, Route, RoutingElement, Sink, SinkId, Source,
    SourceId, TopologySnapshot,
};
pub use builder::{RoutingNode, RoutingTopology};
pub use canonical::{canonical_hash, to_canonical_bytes, TopologyFingerprint};
pub use config::{ConfigError, RouterConfig};
pub use engine::{RouteSet, RoutingEngine};
pub use error::{RouteStatus, RoutingError};
pub use graph::{NodeHandle, PathVisitor, RoutingGraph};
pub use policy::{AcceptAll, BoundedPolicy, FormatChoiceRequest, FormatPolicy, PreferenceOrder};
pub use search::SearchPhase;
pub use store::{InMemoryTopologyStore, TopologyStore};
