//! Performance benchmarks for tree derivation
//!
//! Every query walks the edge index from scratch, so these measure:
//! - Lineage of the deepest node of a long conversation
//! - Connection checks that must walk a full lineage
//! - Children lookup on a wide fan-out
//! - Streaming append into a long node collection
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stave_core::{
    graph::{
        add_edge, add_node, children_of, connection_allowed, lineage_of, Edges, NodeParams,
    },
    ids::NodeId,
    properties::{ConversationNode, NodeKind},
    stream::{append_streamed_text, begin_stream},
};

fn node_id(idx: usize) -> NodeId {
    NodeId::new(format!("n{idx}")).unwrap()
}

// n0 -> n1 -> ... -> n{len-1}, alternating user and generated messages
fn chain(len: usize) -> (Vec<ConversationNode>, Edges) {
    let mut nodes = Vec::with_capacity(len);
    let mut edges = Edges::new();
    for idx in 0..len {
        let kind = if idx % 2 == 0 {
            NodeKind::User
        } else {
            NodeKind::Generated
        };
        nodes = add_node(
            &nodes,
            NodeParams::new(kind, 0.0, idx as f64 * 100.0, "message").with_id(node_id(idx)),
        );
        if idx > 0 {
            edges = add_edge(&edges, node_id(idx - 1), node_id(idx), false);
        }
    }
    (nodes, edges)
}

// n0 with `width` direct children
fn fan(width: usize) -> (Vec<ConversationNode>, Edges) {
    let mut nodes = vec![];
    let mut edges = Edges::new();
    for idx in 0..=width {
        nodes.push(stave_core::graph::create_node(
            NodeParams::new(NodeKind::Generated, idx as f64 * 180.0, 0.0, "").with_id(node_id(idx)),
        ));
        if idx > 0 {
            edges = add_edge(&edges, node_id(0), node_id(idx), false);
        }
    }
    (nodes, edges)
}

fn bench_lineage(c: &mut Criterion) {
    let mut group = c.benchmark_group("lineage_of");
    for len in [16, 128, 512] {
        let (nodes, edges) = chain(len);
        let leaf = node_id(len - 1);
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            b.iter(|| lineage_of(black_box(&nodes), black_box(&edges), &leaf).unwrap().len())
        });
    }
    group.finish();
}

fn bench_connection_allowed(c: &mut Criterion) {
    let mut group = c.benchmark_group("connection_allowed");
    for len in [16, 128, 512] {
        let (nodes, edges) = chain(len);
        let root = node_id(0);
        let leaf = node_id(len - 1);
        // Refused: the root is in the leaf's lineage.
        group.bench_with_input(BenchmarkId::new("cycle", len), &len, |b, _| {
            b.iter(|| connection_allowed(black_box(&nodes), black_box(&edges), &leaf, &root))
        });
    }
    group.finish();
}

fn bench_children(c: &mut Criterion) {
    let (nodes, edges) = fan(64);
    let root = node_id(0);
    c.bench_function("children_of_64", |b| {
        b.iter(|| children_of(black_box(&nodes), black_box(&edges), &root).len())
    });
}

fn bench_streaming_append(c: &mut Criterion) {
    let (nodes, _) = chain(256);
    let target = node_id(255);
    let (nodes, stream_id) = begin_stream(&nodes, &target);
    c.bench_function("append_streamed_text_256", |b| {
        b.iter(|| append_streamed_text(black_box(&nodes), &target, " token", &stream_id).unwrap())
    });
}

// Benchmark group configuration
criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(50);
    targets =
        bench_lineage,
        bench_connection_allowed,
        bench_children,
        bench_streaming_append
}

criterion_main!(benches);
