use std::collections::BTreeMap;
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use routelab_core::routing::{compute_routing_tables, update_link_states};
use routelab_sim::{DeterministicRng, TopologySpec, generate_topology, plan_full_flood};

fn bench_routing_engines(c: &mut Criterion) {
    let mut group = c.benchmark_group("routing_recompute");
    for routers in [10, 50, 100] {
        let topology = generate_topology(
            &TopologySpec::routers_only(routers),
            &mut DeterministicRng::from_seed(routers as u64),
        );

        group.bench_with_input(BenchmarkId::new("distance_vector", routers), &topology, |b, t| {
            b.iter(|| compute_routing_tables(black_box(t), None));
        });
        group.bench_with_input(BenchmarkId::new("link_state", routers), &topology, |b, t| {
            b.iter(|| update_link_states(black_box(t), &BTreeMap::new()));
        });
    }
    group.finish();
}

fn bench_flood_planning(c: &mut Criterion) {
    let topology = generate_topology(
        &TopologySpec {
            endpoints: 40,
            switches: 10,
            ..TopologySpec::routers_only(100)
        },
        &mut DeterministicRng::from_seed(1),
    );
    let adjacency = topology.adjacency();
    let origin = topology.router_ids()[0].clone();

    c.bench_function("plan_full_flood_150_nodes", |b| {
        b.iter(|| plan_full_flood(black_box(&adjacency), &origin));
    });
}

criterion_group!(benches, bench_routing_engines, bench_flood_planning);
criterion_main!(benches);
