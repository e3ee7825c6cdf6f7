//! Benchmarks for graph build and read operations.
//!
//! These benchmarks measure the performance of:
//! - Building a snapshot from parsed facts
//! - Indexing a snapshot for traversal
//! - Transitive dependents of a widely imported file
//! - Cycle detection and snapshot comparison at increasing sizes

// Benchmark code - performance of the benchmark setup is not critical
#![allow(missing_docs)]

use std::path::Path;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use depgraph::resolver::FileSet;
use depgraph::{
    Direction, Edge, Graph, GraphBuilder, ImportResolver, Node, NodeType, ParsedFile, ParsedFunction, ParsedImport,
    Relationship, Traversal, compare_graphs, detect_cycles,
};

const BENCH_ROOT: &str = "/bench";

/// Generate a layered snapshot: `layers` rows of `width` files, each file
/// importing two files of the next row, with one function per file calling
/// the function of its left neighbour.
///
/// ```text
/// layer0/f0 -> layer1/f0, layer1/f1
/// layer0/f1 -> layer1/f1, layer1/f2
/// ...
/// ```
fn layered_graph(layers: usize, width: usize) -> Graph {
    let mut graph = Graph::empty("bench", "2024-01-01T00:00:00.000Z");
    let file = |layer: usize, i: usize| format!("src/layer{layer}/f{i}.ts");

    for layer in 0..layers {
        for i in 0..width {
            let id = file(layer, i);
            graph.nodes.insert(
                format!("{id}::run"),
                Node::declared(NodeType::Function, id.clone(), 1, 5),
            );
            graph.nodes.insert(id, Node::file());
        }
    }

    for layer in 0..layers.saturating_sub(1) {
        for i in 0..width {
            let source = file(layer, i);
            for offset in 0..2 {
                graph.edges.push(Edge::new(
                    source.clone(),
                    Relationship::Imports,
                    file(layer + 1, (i + offset) % width),
                ));
            }
            if i > 0 {
                graph.edges.push(Edge::new(
                    format!("{source}::run"),
                    Relationship::Calls,
                    format!("{}::run", file(layer, i - 1)),
                ));
            }
        }
    }

    graph
}

/// Parsed facts with the same shape as [`layered_graph`].
fn layered_facts(layers: usize, width: usize) -> Vec<ParsedFile> {
    let mut facts = Vec::with_capacity(layers * width);
    for layer in 0..layers {
        for i in 0..width {
            let mut file = ParsedFile::new(format!("src/layer{layer}/f{i}.ts"));
            if layer + 1 < layers {
                for offset in 0..2 {
                    file.imports
                        .push(ParsedImport::value(format!("../layer{}/f{}", layer + 1, (i + offset) % width)));
                }
            }
            let calls = if i > 0 { vec![format!("f{}", i - 1)] } else { Vec::new() };
            file.functions.push(ParsedFunction {
                name: format!("f{i}"),
                line: 1,
                end_line: 5,
                calls,
            });
            facts.push(file);
        }
    }
    facts
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    let root = Path::new(BENCH_ROOT);

    for width in [50, 200, 800] {
        let facts = layered_facts(10, width);
        let resolver = ImportResolver::new(Arc::new(FileSet::new(
            root,
            facts.iter().map(|f| f.file_path.clone()),
        )));
        resolver.cache().insert(root, None);
        let builder = GraphBuilder::new(&resolver);

        group.throughput(Throughput::Elements(facts.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(width), &facts, |b, facts| {
            b.iter(|| builder.build(black_box(facts), "bench", root));
        });
    }

    group.finish();
}

fn bench_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("index");

    for width in [50, 200, 800] {
        let graph = layered_graph(10, width);
        group.throughput(Throughput::Elements(graph.edges.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(width), &graph, |b, graph| {
            b.iter(|| Traversal::new(black_box(graph)));
        });
    }

    group.finish();
}

fn bench_transitive_dependents(c: &mut Criterion) {
    let mut group = c.benchmark_group("transitive_dependents");

    for width in [50, 200, 800] {
        let graph = layered_graph(10, width);
        let walk = Traversal::new(&graph);
        let target = "src/layer9/f0.ts";

        group.bench_with_input(BenchmarkId::from_parameter(width), &walk, |b, walk| {
            b.iter(|| {
                walk.traverse(black_box(target), Direction::Reverse, true)
                    .expect("target exists")
            });
        });
    }

    group.finish();
}

fn bench_cycles(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_cycles");

    for width in [50, 200, 800] {
        let mut graph = layered_graph(10, width);
        // Close the layers into one loop.
        graph
            .edges
            .push(Edge::new("src/layer9/f0.ts", Relationship::Imports, "src/layer0/f0.ts"));

        group.bench_with_input(BenchmarkId::from_parameter(width), &graph, |b, graph| {
            b.iter(|| detect_cycles(black_box(graph)));
        });
    }

    group.finish();
}

fn bench_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare_graphs");

    for width in [50, 200, 800] {
        let before = layered_graph(10, width);
        let mut after = before.clone();
        after.edges.retain(|e| e.relationship != Relationship::Calls);
        after.nodes.retain(|id, _| !id.starts_with("src/layer0/"));

        group.bench_with_input(
            BenchmarkId::from_parameter(width),
            &(before, after),
            |b, (before, after)| {
                b.iter(|| compare_graphs(black_box(before), black_box(after)));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_index,
    bench_transitive_dependents,
    bench_cycles,
    bench_compare
);
criterion_main!(benches);
