//! Graph module: the node and edge collections and the tree derived from them.
//!
//! # Module Organization
//!
//! - [`nodes`]: Pure transformations over the node collection
//! - [`edges`]: The edge collection and its authoritative-parent index
//! - [`tree`]: Parent/children/lineage queries and the connection-legality check
//!
//! # Public API
//!
//! ```rust
//! use stave_core::graph::{connection_allowed, lineage_of, ConversationGraph, Edges};
//! ```

pub mod edges;
pub mod nodes;
pub mod tree;


use serde::{Deserialize, Serialize};

use crate::{error::StaveError, properties::ConversationNode};

pub use edges::{
    add_edge, compact, remove_edge, remove_edges_touching, set_edge_animated, Edges,
};
pub use nodes::{
    add_linked_system_and_user_node, add_node, create_node, delete_node, delete_selected_nodes,
    get_node, select_only, set_node_label, set_node_position, set_node_render_mode,
    set_node_stream_id, set_node_text, toggle_selected, NodeParams,
};
pub use tree::{
    children_of, connection_allowed, generated_children_of, is_in_lineage, lineage_of,
    parent_of, roots, siblings_of, validate_tree,
};

/// The (nodes, edges) pair as one serializable value, for callers that persist the graph.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationGraph {
    pub nodes: Vec<ConversationNode>,
    pub edges: Edges,
}

impl ConversationGraph {
    pub fn new(nodes: Vec<ConversationNode>, edges: Edges) -> Self {
        ConversationGraph { nodes, edges }
    }

    pub fn to_json(&self) -> Result<String, StaveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, StaveError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Structural problems in the graph. See [validate_tree].
    pub fn built_in_test(&self) -> Vec<String> {
        validate_tree(&self.nodes, &self.edges)
    }
}
