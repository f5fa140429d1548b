//! Performance benchmarks for route queries.
//!
//! Run with: `cargo bench --bench routing`
//!
//! ## Scenarios
//!
//! | Benchmark | What is measured |
//! |-----------|------------------|
//! | `get_route/warm` | search + negotiation on an already built graph |
//! | `get_route/rebuild` | graph rebuild + search + negotiation |
//! | `build` | graph build alone |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

use audio_routing_kernel::{
    AcceptAll, ConnectionFormat, ConversionMatrix, Converter, ConverterId, DomainId, Gateway,
    GatewayId, InMemoryTopologyStore, RouterConfig, RoutingEngine, RoutingTopology, Sink, SinkId,
    Source, SourceId, TopologyStore,
};

const PCM: ConnectionFormat = ConnectionFormat::new(0x100);
const MP3: ConnectionFormat = ConnectionFormat::new(0x101);

/// `domains` domains linked in a chain. Every domain holds an entry source,
/// an exit sink and a converter between two spare terminals, so each
/// domain boundary can be crossed with or without conversion.
fn chain_store(domains: u16) -> Arc<InMemoryTopologyStore> {
    let store = InMemoryTopologyStore::new();
    let both = vec![PCM, MP3];
    for d in 1..=domains {
        let domain = DomainId::new(d);
        let base = d * 10;
        store.add_source(Source::new(SourceId::new(base), domain, "entry", both.clone()));
        store.add_sink(Sink::new(SinkId::new(base), domain, "exit", both.clone()));
        store.add_sink(Sink::new(SinkId::new(base + 1), domain, "conv-in", both.clone()));
        store.add_source(Source::new(SourceId::new(base + 1), domain, "conv-out", both.clone()));
        store.add_converter(Converter {
            converter_id: ConverterId::new(d),
            name: format!("conv{d}"),
            sink_id: SinkId::new(base + 1),
            source_id: SourceId::new(base + 1),
            domain_id: domain,
            conversion: ConversionMatrix::from_pairs(both.clone(), both.clone(), &[(PCM, MP3), (MP3, PCM)]),
        });
        if d < domains {
            store.add_gateway(Gateway {
                gateway_id: GatewayId::new(d),
                name: format!("gw{d}"),
                sink_id: SinkId::new(base),
                source_id: SourceId::new(base + 10),
                domain_sink_id: domain,
                domain_source_id: DomainId::new(d + 1),
                control_domain_id: domain,
                conversion: ConversionMatrix::passthrough(both.clone()),
            });
        }
    }
    Arc::new(store)
}

fn bench_get_route(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_route");

    for domains in [2u16, 4, 6] {
        let store = chain_store(domains);
        let target = SinkId::new(domains * 10);
        let engine = RoutingEngine::new(Arc::clone(&store), AcceptAll, RouterConfig::default());
        group.throughput(Throughput::Elements(u64::from(domains)));

        group.bench_with_input(BenchmarkId::new("warm", domains), &domains, |b, _| {
            b.iter(|| black_box(engine.get_route(false, SourceId::new(10), target)))
        });

        group.bench_with_input(BenchmarkId::new("rebuild", domains), &domains, |b, _| {
            b.iter(|| {
                engine.invalidate();
                black_box(engine.get_route(false, SourceId::new(10), target))
            })
        });
    }

    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for domains in [2u16, 8, 32] {
        let store = chain_store(domains);
        let nodes = store.sources().map_or(0, |s| s.len()) as u64;
        group.throughput(Throughput::Elements(nodes));
        group.bench_with_input(BenchmarkId::from_parameter(domains), &domains, |b, _| {
            b.iter(|| black_box(RoutingTopology::build(&*store)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_get_route, bench_build);
criterion_main!(benches);
