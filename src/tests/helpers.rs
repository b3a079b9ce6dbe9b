//! Shared test utilities for graph, stream and session testing

use rand::{rngs::StdRng, SeedableRng};

use crate::{
    graph::{add_edge, add_node, Edges, NodeParams},
    ids::{NodeId, StreamId},
    properties::{ConversationNode, NodeKind},
};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

pub fn id(value: &str) -> NodeId {
    NodeId::new(value).expect("test ids are non-empty")
}

pub fn sid(value: &str) -> StreamId {
    StreamId::new(value).expect("test stream ids are non-empty")
}

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Helper function to create a node with a fixed id
pub fn create_test_node(value: &str, kind: NodeKind) -> ConversationNode {
    crate::graph::create_node(NodeParams::new(kind, 0.0, 0.0, "").with_id(id(value)))
}

/// Build a linear chain `ids[0] -> ids[1] -> ...` of User nodes.
pub fn create_chain(ids: &[&str]) -> (Vec<ConversationNode>, Edges) {
    init_logging();

    let mut nodes = Vec::new();
    let mut edges = Edges::new();
    for (idx, value) in ids.iter().enumerate() {
        nodes = add_node(
            &nodes,
            NodeParams::new(NodeKind::User, 0.0, idx as f64 * 100.0, "").with_id(id(value)),
        );
        if idx > 0 {
            edges = add_edge(&edges, id(ids[idx - 1]), id(value), false);
        }
    }
    (nodes, edges)
}

/// Build a small conversation tree:
///
/// ```text
/// sys -> user -> gen1
///             -> gen2 (edited)
///             -> user2
/// ```
pub fn create_test_tree() -> (Vec<ConversationNode>, Edges) {
    init_logging();

    let nodes = vec![
        create_test_node("sys", NodeKind::System),
        create_test_node("user", NodeKind::User),
        create_test_node("gen1", NodeKind::Generated),
        create_test_node("gen2", NodeKind::EditedGenerated),
        create_test_node("user2", NodeKind::User),
    ];
    let edges: Edges = [
        ("sys", "user"),
        ("user", "gen1"),
        ("user", "gen2"),
        ("user", "user2"),
    ]
    .into_iter()
    .map(|(source, target)| crate::properties::Edge::new(id(source), id(target), false))
    .collect();
    (nodes, edges)
}
