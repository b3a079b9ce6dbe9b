//! The edge collection and its authoritative-parent index.
//!
//! Several edges may target the same node (a graph rewrite can supersede an edge without
//! removing it). Only the most recently appended edge for a target is authoritative. Instead of
//! scanning the sequence backwards on every lookup, [Edges] keeps an explicit
//! `target -> edge position` index that is rebuilt whenever the sequence changes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    ids::NodeId,
    properties::{ConversationNode, Edge},
};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Edge>", into = "Vec<Edge>")]
pub struct Edges {
    edges: Vec<Edge>,
    authoritative: BTreeMap<NodeId, usize>,
}

impl Edges {
    pub fn new() -> Self {
        Edges::default()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// All edges in append order, superseded ones included.
    pub fn iter(&self) -> std::slice::Iter<'_, Edge> {
        self.edges.iter()
    }

    pub fn as_slice(&self) -> &[Edge] {
        &self.edges
    }

    /// The edge that decides `target`'s parent, if any.
    pub fn authoritative_edge(&self, target: &NodeId) -> Option<&Edge> {
        self.authoritative
            .get(target)
            .and_then(|idx| self.edges.get(*idx))
    }

    /// Authoritative edges only, one per target, ordered by target id.
    pub fn authoritative_edges(&self) -> impl Iterator<Item = &Edge> {
        self.authoritative
            .values()
            .filter_map(|idx| self.edges.get(*idx))
    }

    fn reindex(&mut self) {
        self.authoritative.clear();
        for (idx, edge) in self.edges.iter().enumerate() {
            // Later edges overwrite earlier ones for the same target.
            self.authoritative.insert(edge.target.clone(), idx);
        }
    }

    fn push(&mut self, edge: Edge) {
        self.authoritative
            .insert(edge.target.clone(), self.edges.len());
        self.edges.push(edge);
    }
}

impl From<Vec<Edge>> for Edges {
    fn from(edges: Vec<Edge>) -> Self {
        let mut set = Edges {
            edges,
            authoritative: BTreeMap::new(),
        };
        set.reindex();
        set
    }
}

impl From<Edges> for Vec<Edge> {
    fn from(edges: Edges) -> Self {
        edges.edges
    }
}

impl FromIterator<Edge> for Edges {
    fn from_iter<I: IntoIterator<Item = Edge>>(iter: I) -> Self {
        Edges::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<'a> IntoIterator for &'a Edges {
    type Item = &'a Edge;
    type IntoIter = std::slice::Iter<'a, Edge>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}

/// Append an edge. The new edge becomes authoritative for its target.
///
/// Callers must check [crate::graph::connection_allowed] first; this function does not.
pub fn add_edge(edges: &Edges, source: NodeId, target: NodeId, animated: bool) -> Edges {
    let mut next = edges.clone();
    next.push(Edge::new(source, target, animated));
    next
}

/// Toggle the presentation flag on `target`'s authoritative edge.
pub fn set_edge_animated(edges: &Edges, target: &NodeId, animated: bool) -> Edges {
    let mut next = edges.clone();
    if let Some(idx) = next.authoritative.get(target).copied() {
        if let Some(edge) = next.edges.get_mut(idx) {
            edge.animated = animated;
        }
    }
    next
}

/// Remove every edge from `source` to `target`. If an older edge still targets `target`, it
/// becomes authoritative again.
pub fn remove_edge(edges: &Edges, source: &NodeId, target: &NodeId) -> Edges {
    edges
        .iter()
        .filter(|edge| !(&edge.source == source && &edge.target == target))
        .cloned()
        .collect()
}

/// Remove every edge that starts or ends at `id`.
pub fn remove_edges_touching(edges: &Edges, id: &NodeId) -> Edges {
    edges
        .iter()
        .filter(|edge| &edge.source != id && &edge.target != id)
        .cloned()
        .collect()
}

/// Drop superseded edges and authoritative edges whose endpoints no longer exist.
///
/// Superseded edges are dropped first so that removing a dangling authoritative edge can never
/// promote an older edge to authoritative. Every parent relation that resolves before
/// compaction resolves identically afterwards.
pub fn compact(edges: &Edges, nodes: &[ConversationNode]) -> Edges {
    let exists = |id: &NodeId| nodes.iter().any(|node| &node.id == id);
    let mut kept: Vec<(usize, Edge)> = edges
        .authoritative
        .values()
        .filter_map(|idx| edges.edges.get(*idx).map(|edge| (*idx, edge.clone())))
        .filter(|(_, edge)| exists(&edge.source) && exists(&edge.target))
        .collect();
    kept.sort_by_key(|(idx, _)| *idx);

    let dropped = edges.len() - kept.len();
    if dropped > 0 {
        tracing::debug!("[compact] dropped {dropped} superseded or dangling edges");
    }
    kept.into_iter().map(|(_, edge)| edge).collect()
}
