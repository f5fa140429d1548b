//! Per-hop format negotiation.
//!
//! Turns one node-path into zero or more fully resolved routes. Hops are
//! decided in travel order:
//!
//! - first hop: candidates are the formats shared by the hop's source and sink
//! - hop behind a bridge: the shared formats are further restricted to what
//!   the bridge produces when fed the format chosen for the previous hop
//!
//! The policy ranks each candidate set. Every ranked format is tried in
//! order and each one that completes the path yields a route, so a single
//! node-path can produce several routes. A vetoed or empty hop only ends
//! its own branch.
//!
//! Partial routes are copied on every recursion; nothing is undone on the
//! way back.

use crate::builder::RoutingTopology;
use crate::error::RoutingError;
use crate::graph::NodeHandle;
use crate::policy::{FormatChoiceRequest, FormatPolicy};
use crate::search::{split_hops, PathHop};
use crate::types::{intersect_formats, ConnectionFormat, Route, RoutingElement, SinkId, SourceId};

/// Legal formats of a hop given the format chosen for the hop before it.
pub fn hop_candidates(hop: &PathHop<'_>, previous: Option<ConnectionFormat>) -> Vec<ConnectionFormat> {
    let direct = intersect_formats(&hop.source.connection_formats, &hop.sink.connection_formats);
    match (hop.via, previous) {
        (Some(matrix), Some(fed)) => intersect_formats(&direct, &matrix.outputs_for_input(fed)),
        _ => direct,
    }
}

struct Negotiation<'a, P: ?Sized> {
    hops: &'a [PathHop<'a>],
    policy: &'a P,
    source_id: SourceId,
    sink_id: SinkId,
    limit: usize,
    routes: Vec<Route>,
}

impl<P: FormatPolicy + ?Sized> Negotiation<'_, P> {
    fn extend(&mut self, resolved: &[RoutingElement], previous: Option<ConnectionFormat>) {
        let hops = self.hops;
        let Some(hop) = hops.get(resolved.len()) else {
            return;
        };
        let candidates = hop_candidates(hop, previous);
        if candidates.is_empty() {
            tracing::trace!(hop = resolved.len(), source = %hop.source.source_id, sink = %hop.sink.sink_id, "No legal format");
            return;
        }

        let partial = Route::new(self.source_id, self.sink_id, resolved.to_vec());
        let ranked = self.policy.choose_formats(&FormatChoiceRequest {
            source_id: hop.source.source_id,
            sink_id: hop.sink.sink_id,
            route: &partial,
            candidates: &candidates,
        });

        let mut tried: Vec<ConnectionFormat> = Vec::with_capacity(ranked.len());
        for format in ranked {
            if self.routes.len() >= self.limit {
                return;
            }
            if !candidates.contains(&format) || tried.contains(&format) {
                continue;
            }
            tried.push(format);

            let mut next = resolved.to_vec();
            next.push(hop.element().with_format(format));
            if next.len() == hops.len() {
                self.routes.push(Route::new(self.source_id, self.sink_id, next));
            } else {
                self.extend(&next, Some(format));
            }
        }
    }
}

/// Resolve every format of a node-path.
///
/// Returns at most `limit` routes, in the order the policy's rankings
/// produce them. An empty result means no combination survived. The only
/// error is [`RoutingError::MalformedPath`].
pub fn negotiate<P: FormatPolicy + ?Sized>(
    topology: &RoutingTopology,
    path: &[NodeHandle],
    policy: &P,
    limit: usize,
) -> Result<Vec<Route>, RoutingError> {
    let hops = split_hops(topology, path)?;
    let (Some(first), Some(last)) = (hops.first(), hops.last()) else {
        return Ok(Vec::new());
    };
    let mut negotiation = Negotiation {
        source_id: first.source.source_id,
        sink_id: last.sink.sink_id,
        hops: &hops,
        policy,
        limit,
        routes: Vec::new(),
    };
    negotiation.extend(&[], None);
    Ok(negotiation.routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BuildInput;
    use crate::policy::{from_fn, AcceptAll, PreferenceOrder};
    use crate::search::find_candidates;
    use crate::types::{ConversionMatrix, DomainId, Gateway, GatewayId, Sink, Source};
    use std::collections::BTreeSet;

    const PCM: ConnectionFormat = ConnectionFormat::new(0x100);
    const MP3: ConnectionFormat = ConnectionFormat::new(0x101);
    const AAC: ConnectionFormat = ConnectionFormat::new(0x102);

    /// Source 1 (A) → hidden sink 1 (A) → decoder gateway → hidden source 2 (B) → sink 2 (B).
    fn decoder_topology(matrix: ConversionMatrix) -> (RoutingTopology, Vec<NodeHandle>) {
        let a = DomainId::new(1);
        let b = DomainId::new(2);
        let topo = RoutingTopology::from_input(BuildInput {
            sources: vec![
                Source::new(SourceId::new(1), a, "tuner", vec![MP3, AAC]),
                Source::new(SourceId::new(2), b, "gw-out", vec![PCM, MP3]),
            ],
            sinks: vec![
                Sink::new(SinkId::new(1), a, "gw-in", vec![MP3, AAC]),
                Sink::new(SinkId::new(2), b, "amp", vec![PCM, MP3]),
            ],
            gateways: vec![Gateway {
                gateway_id: GatewayId::new(1),
                name: "decoder".into(),
                sink_id: SinkId::new(1),
                source_id: SourceId::new(2),
                domain_sink_id: a,
                domain_source_id: b,
                control_domain_id: a,
                conversion: matrix,
            }],
            ..Default::default()
        })
        .unwrap();
        let from = topo.source_node(SourceId::new(1)).unwrap();
        let to = topo.sink_node(SinkId::new(2)).unwrap();
        let path = find_candidates(&topo, from, to, 0, &BTreeSet::new()).remove(0);
        (topo, path)
    }

    /// MP3 in → PCM or MP3 out, AAC in → PCM out.
    fn decoder() -> ConversionMatrix {
        ConversionMatrix::from_pairs(vec![PCM, MP3], vec![MP3, AAC], &[(PCM, MP3), (MP3, MP3), (PCM, AAC)])
    }

    fn formats(route: &Route) -> Vec<ConnectionFormat> {
        route.elements.iter().map(|e| e.connection_format).collect()
    }

    #[test]
    fn test_every_combination_becomes_a_route() {
        let (topo, path) = decoder_topology(decoder());
        let routes = negotiate(&topo, &path, &AcceptAll, 10).unwrap();

        let combos: Vec<_> = routes.iter().map(formats).collect();
        assert_eq!(combos, vec![vec![MP3, PCM], vec![MP3, MP3], vec![AAC, PCM]]);
        assert!(routes.iter().all(Route::is_resolved));
    }

    #[test]
    fn test_limit_stops_negotiation() {
        let (topo, path) = decoder_topology(decoder());
        let routes = negotiate(&topo, &path, &AcceptAll, 2).unwrap();
        assert_eq!(routes.len(), 2);
    }

    #[test]
    fn test_veto_backtracks_to_next_format() {
        let (topo, path) = decoder_topology(decoder());
        // downstream refuses MP3, so only PCM outputs survive
        let policy = from_fn(|req: &FormatChoiceRequest<'_>| {
            req.candidates.iter().copied().filter(|&f| req.sink_id != SinkId::new(2) || f != MP3).collect()
        });
        let combos: Vec<_> = negotiate(&topo, &path, &policy, 10).unwrap().iter().map(formats).collect();
        assert_eq!(combos, vec![vec![MP3, PCM], vec![AAC, PCM]]);
    }

    #[test]
    fn test_policy_sees_route_so_far() {
        let (topo, path) = decoder_topology(decoder());
        let policy = from_fn(|req: &FormatChoiceRequest<'_>| {
            if req.route.elements.is_empty() {
                vec![AAC]
            } else {
                assert_eq!(req.route.elements[0].connection_format, AAC);
                assert_eq!(req.candidates, &[PCM]);
                req.candidates.to_vec()
            }
        });
        let routes = negotiate(&topo, &path, &policy, 10).unwrap();
        assert_eq!(routes.len(), 1);
    }

    #[test]
    fn test_policy_answer_is_filtered() {
        let (topo, path) = decoder_topology(decoder());
        let policy = from_fn(|_: &FormatChoiceRequest<'_>| vec![ConnectionFormat::STEREO, AAC, AAC, PCM]);
        let combos: Vec<_> = negotiate(&topo, &path, &policy, 10).unwrap().iter().map(formats).collect();
        assert_eq!(combos, vec![vec![AAC, PCM]]);
    }

    #[test]
    fn test_strict_preference_can_empty_a_path() {
        let (topo, path) = decoder_topology(decoder());
        let routes = negotiate(&topo, &path, &PreferenceOrder::strict(vec![ConnectionFormat::STEREO]), 10).unwrap();
        assert!(routes.is_empty());
    }

    #[test]
    fn test_matrix_restricts_second_hop() {
        // AAC in → MP3 out only
        let matrix = ConversionMatrix::from_pairs(vec![PCM, MP3], vec![MP3, AAC], &[(MP3, AAC)]);
        let (topo, path) = decoder_topology(matrix);
        let combos: Vec<_> = negotiate(&topo, &path, &AcceptAll, 10).unwrap().iter().map(formats).collect();
        assert_eq!(combos, vec![vec![AAC, MP3]]);
    }

    #[test]
    fn test_malformed_path_is_an_error() {
        let (topo, path) = decoder_topology(decoder());
        let err = negotiate(&topo, &path[1..], &AcceptAll, 10).unwrap_err();
        assert!(matches!(err, RoutingError::MalformedPath(_)));
    }
}
