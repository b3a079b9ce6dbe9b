//! Parent, children, sibling and lineage queries over a (nodes, edges) pair.
//!
//! Nothing here is cached: every query is answered from the collections it is given. A node's
//! parent is the source of its authoritative edge, provided that source node still exists.

use petgraph::{algo::is_cyclic_directed, graphmap::DiGraphMap};

use crate::{
    error::StaveError,
    graph::{edges::Edges, nodes::get_node},
    ids::NodeId,
    properties::ConversationNode,
};

pub fn parent_of<'a>(
    nodes: &'a [ConversationNode],
    edges: &Edges,
    id: &NodeId,
) -> Option<&'a ConversationNode> {
    let edge = edges.authoritative_edge(id)?;
    get_node(nodes, &edge.source)
}

pub fn children_of<'a>(
    nodes: &'a [ConversationNode],
    edges: &Edges,
    id: &NodeId,
) -> Vec<&'a ConversationNode> {
    nodes
        .iter()
        .filter(|node| parent_of(nodes, edges, &node.id).is_some_and(|parent| &parent.id == id))
        .collect()
}

/// Children whose kind is Generated or EditedGenerated.
pub fn generated_children_of<'a>(
    nodes: &'a [ConversationNode],
    edges: &Edges,
    id: &NodeId,
) -> Vec<&'a ConversationNode> {
    children_of(nodes, edges, id)
        .into_iter()
        .filter(|node| node.kind.is_generated())
        .collect()
}

/// All children of `id`'s parent, `id` included. Empty when `id` has no parent.
pub fn siblings_of<'a>(
    nodes: &'a [ConversationNode],
    edges: &Edges,
    id: &NodeId,
) -> Vec<&'a ConversationNode> {
    match parent_of(nodes, edges, id) {
        Some(parent) => children_of(nodes, edges, &parent.id),
        None => Vec::new(),
    }
}

/// The node itself followed by its parent, grandparent and so on up to the root.
///
/// Returns an empty lineage when `id` is not in `nodes`. A well-formed tree can never produce
/// a lineage longer than the node count; exceeding it means the parent relation has a cycle and
/// yields [StaveError::StructuralCorruption] instead of looping.
pub fn lineage_of<'a>(
    nodes: &'a [ConversationNode],
    edges: &Edges,
    id: &NodeId,
) -> Result<Vec<&'a ConversationNode>, StaveError> {
    let limit = nodes.len();
    let mut lineage = Vec::new();
    let mut current = get_node(nodes, id);

    while let Some(node) = current {
        if lineage.len() == limit {
            tracing::warn!(
                "[lineage_of] lineage of {id} exceeded {limit} nodes; parent relation is cyclic"
            );
            return Err(StaveError::StructuralCorruption {
                node_id: id.clone(),
                limit,
            });
        }
        lineage.push(node);
        current = parent_of(nodes, edges, &node.id);
    }

    Ok(lineage)
}

/// Whether `candidate` appears in the lineage of `of` (including `of` itself).
pub fn is_in_lineage(
    nodes: &[ConversationNode],
    edges: &Edges,
    candidate: &NodeId,
    of: &NodeId,
) -> Result<bool, StaveError> {
    Ok(lineage_of(nodes, edges, of)?
        .iter()
        .any(|node| &node.id == candidate))
}

/// Whether a `source -> target` edge may be added.
///
/// Refused when `target` is already in `source`'s lineage (the edge would close a cycle) or when
/// `target` already has a parent. A structurally corrupt lineage also refuses the connection.
pub fn connection_allowed(
    nodes: &[ConversationNode],
    edges: &Edges,
    source: &NodeId,
    target: &NodeId,
) -> bool {
    let creates_cycle = match is_in_lineage(nodes, edges, target, source) {
        Ok(found) => found,
        Err(err) => {
            tracing::warn!("[connection_allowed] refusing {source} -> {target}: {err}");
            true
        }
    };
    !creates_cycle && parent_of(nodes, edges, target).is_none()
}

/// Nodes without a resolvable parent, one per conversation tree.
pub fn roots<'a>(nodes: &'a [ConversationNode], edges: &Edges) -> Vec<&'a ConversationNode> {
    nodes
        .iter()
        .filter(|node| parent_of(nodes, edges, &node.id).is_none())
        .collect()
}

/// Check the derived tree invariants and describe every violation found.
///
/// An empty result means the authoritative parent relation is acyclic. Dangling authoritative
/// edges are reported too, although they are tolerated by every query.
pub fn validate_tree(nodes: &[ConversationNode], edges: &Edges) -> Vec<String> {
    let mut errors = Vec::new();
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for node in nodes {
        graph.add_node(node.id.as_str());
    }

    for edge in edges.authoritative_edges() {
        let source_known = get_node(nodes, &edge.source).is_some();
        let target_known = get_node(nodes, &edge.target).is_some();
        if !source_known {
            errors.push(format!(
                "edge {} -> {}: source node does not exist",
                edge.source, edge.target
            ));
        }
        if !target_known {
            errors.push(format!(
                "edge {} -> {}: target node does not exist",
                edge.source, edge.target
            ));
        }
        if source_known && target_known {
            graph.add_edge(edge.source.as_str(), edge.target.as_str(), ());
        }
    }

    if is_cyclic_directed(&graph) {
        errors.push("authoritative parent relation contains a cycle".to_string());
    }

    errors
}
