//! Error types for routing queries.

use serde::{Deserialize, Serialize};

use crate::types::{SinkId, SourceId};

/// Coarse outcome class of a failed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteStatus {
    /// The request named an unknown source or sink.
    NotFound,
    /// The request was valid but no route can currently be built.
    NotPossible,
    /// The router violated one of its own invariants.
    Internal,
}

/// Error type for routing operations.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    /// Source not registered.
    #[error("Source not found: {0}")]
    SourceNotFound(SourceId),
    /// Sink not registered.
    #[error("Sink not found: {0}")]
    SinkNotFound(SinkId),
    /// Search and negotiation exhausted all candidates.
    #[error("No route from {source_id} to {sink_id}")]
    NoRoute {
        /// Requested source.
        source_id: SourceId,
        /// Requested sink.
        sink_id: SinkId,
    },
    /// The topology store failed.
    #[error("Topology store error: {0}")]
    Topology(String),
    /// The topology could not be fingerprinted.
    #[error("Topology serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A node-path did not alternate node kinds as the builder guarantees.
    #[error("Malformed node-path: {0}")]
    MalformedPath(String),
}

impl RoutingError {
    /// Create a topology error from any store error.
    pub fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::Topology(e.to_string())
    }

    /// Status class of this error.
    pub fn status(&self) -> RouteStatus {
        match self {
            Self::SourceNotFound(_) | Self::SinkNotFound(_) => RouteStatus::NotFound,
            Self::NoRoute { .. } | Self::Topology(_) | Self::Serialization(_) => RouteStatus::NotPossible,
            Self::MalformedPath(_) => RouteStatus::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(RoutingError::SinkNotFound(SinkId::new(1)).status(), RouteStatus::NotFound);
        assert_eq!(
            RoutingError::NoRoute { source_id: SourceId::new(1), sink_id: SinkId::new(2) }.status(),
            RouteStatus::NotPossible
        );
        assert_eq!(RoutingError::Topology("down".into()).status(), RouteStatus::NotPossible);
        assert_eq!(RoutingError::MalformedPath("x".into()).status(), RouteStatus::Internal);
    }

    #[test]
    fn test_display() {
        let err = RoutingError::NoRoute { source_id: SourceId::new(1), sink_id: SinkId::new(2) };
        assert_eq!(err.to_string(), "No route from source:1 to sink:2");
    }
}
