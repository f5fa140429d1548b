//! Core types for the routing kernel.

pub mod format;
pub mod ids;
pub mod matrix;
pub mod route;
pub mod topology;

pub use format::{intersect_formats, ConnectionFormat};
pub use ids::{ConnectionId, ConverterId, DomainId, GatewayId, SinkId, SourceId};
pub use matrix::ConversionMatrix;
pub use route::{Route, RoutingElement};
pub use topology::{Connection, Converter, Gateway, Sink, Source, TopologySnapshot};
