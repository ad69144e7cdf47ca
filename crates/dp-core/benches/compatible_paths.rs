//! Criterion benchmarks for path enumeration and model building.
//!
//! Both walk the compatible paths of a chain of three-state chance nodes
//! with one decision observing the first node.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dp_common::FixedStates;
use dp_core::analysis::UtilityDistribution;
use dp_core::model::{build_model, BuildOptions};
use dp_core::tabular::{DiagramSpec, NodeSpec, TabularDiagram};
use dp_core::{CompatiblePaths, DecisionStrategy};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn chain(chance_nodes: usize) -> TabularDiagram {
    let mut nodes = Vec::new();
    for i in 0..chance_nodes {
        let parents = if i == 0 {
            Vec::new()
        } else {
            vec![format!("C{}", i - 1)]
        };
        let rows = if i == 0 { 1 } else { 3 };
        nodes.push(NodeSpec {
            name: format!("C{}", i),
            role: "chance".to_string(),
            parents,
            states: vec!["lo".into(), "mid".into(), "hi".into()],
            probabilities: [0.2, 0.5, 0.3].repeat(rows),
            utilities: Vec::new(),
        });
    }
    nodes.push(NodeSpec {
        name: "D".to_string(),
        role: "decision".to_string(),
        parents: vec!["C0".to_string()],
        states: vec!["act".into(), "wait".into()],
        probabilities: Vec::new(),
        utilities: Vec::new(),
    });
    nodes.push(NodeSpec {
        name: "V".to_string(),
        role: "value".to_string(),
        parents: vec![format!("C{}", chance_nodes - 1), "D".to_string()],
        states: Vec::new(),
        probabilities: Vec::new(),
        utilities: vec![-5.0, 1.0, 0.0, 2.0, 4.0, 3.0],
    });
    TabularDiagram::from_spec(&DiagramSpec { nodes }).expect("chain diagram is valid")
}

fn bench_compatible_paths(c: &mut Criterion) {
    let mut group = c.benchmark_group("compatible_paths");

    for n in [4usize, 8] {
        let diagram = chain(n);
        let mut rng = StdRng::seed_from_u64(7);
        let strategy = DecisionStrategy::random(&mut rng, &diagram).expect("strategy");

        group.bench_with_input(BenchmarkId::new("enumerate", n), &diagram, |b, d| {
            b.iter(|| {
                let paths = CompatiblePaths::for_diagram(d, &strategy, FixedStates::new())
                    .expect("valid query");
                black_box(paths.iter().count())
            });
        });

        group.bench_with_input(BenchmarkId::new("distribution", n), &diagram, |b, d| {
            b.iter(|| black_box(UtilityDistribution::new(d, &strategy).expect("distribution")));
        });
    }

    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_model");
    group.sample_size(20);

    for n in [4usize, 6] {
        let diagram = chain(n);
        group.bench_with_input(BenchmarkId::new("eager", n), &diagram, |b, d| {
            b.iter(|| black_box(build_model(d, &BuildOptions::default()).expect("model")));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compatible_paths, bench_build);
criterion_main!(benches);
