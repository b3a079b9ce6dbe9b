//! Pure transformations over the node collection.
//!
//! Every function takes the current nodes by reference and returns a new `Vec`. Nodes that are
//! not touched are cloned as-is, so a collection that was handed to [crate::history::History]
//! is never observed to change.

use rand::Rng;

use crate::{
    color::NodeStyle,
    config::LayoutConfig,
    ids::{generate_node_id, NodeId, StreamId},
    label::{derived_label, display_name},
    properties::{ConversationNode, ModelTier, NodeKind, Position, RenderMode, StreamState},
};

/// Parameters for [create_node] and [add_node].
#[derive(Debug, Clone, PartialEq)]
pub struct NodeParams {
    pub id: Option<NodeId>,
    pub x: f64,
    pub y: f64,
    pub kind: NodeKind,
    pub text: String,
    pub stream_id: Option<StreamId>,
    /// Only consulted for the default label of Generated nodes.
    pub tier: Option<ModelTier>,
}

impl NodeParams {
    pub fn new(kind: NodeKind, x: f64, y: f64, text: impl Into<String>) -> Self {
        NodeParams {
            id: None,
            x,
            y,
            kind,
            text: text.into(),
            stream_id: None,
            tier: None,
        }
    }

    pub fn with_id(mut self, id: NodeId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_stream_id(mut self, stream_id: StreamId) -> Self {
        self.stream_id = Some(stream_id);
        self
    }

    pub fn with_tier(mut self, tier: Option<ModelTier>) -> Self {
        self.tier = tier;
        self
    }
}

pub fn create_node(params: NodeParams) -> ConversationNode {
    ConversationNode {
        id: params.id.unwrap_or_else(generate_node_id),
        position: Position::new(params.x, params.y),
        kind: params.kind,
        text: params.text,
        label: display_name(params.kind, params.tier),
        has_custom_label: false,
        stream: StreamState::from(params.stream_id),
        selected: false,
        style: NodeStyle::for_kind(params.kind),
        render_mode: None,
        draggable: None,
    }
}

pub fn add_node(nodes: &[ConversationNode], params: NodeParams) -> Vec<ConversationNode> {
    let mut next = nodes.to_vec();
    next.push(create_node(params));
    next
}

/// Seed a new conversation tree: a System node placed to the right of every existing node and
/// a User node below it.
///
/// The User node's y position gets a random offset in `[0, overlap_randomness_max)` so that
/// trees created in quick succession do not stack exactly on top of each other. The caller
/// adds the System -> User edge.
pub fn add_linked_system_and_user_node<R: Rng + ?Sized>(
    nodes: &[ConversationNode],
    system_text: &str,
    user_text: Option<&str>,
    system_id: Option<NodeId>,
    user_id: Option<NodeId>,
    layout: &LayoutConfig,
    rng: &mut R,
) -> Vec<ConversationNode> {
    let mut next = nodes.to_vec();

    let system_x = nodes
        .iter()
        .map(|node| node.position.x)
        .reduce(f64::max)
        .map(|rightmost| rightmost + layout.new_tree_x_offset)
        .unwrap_or(layout.first_tree_x);

    let system = create_node(NodeParams {
        id: system_id,
        ..NodeParams::new(NodeKind::System, system_x, layout.tree_root_y, system_text)
    });

    let user_y = system.position.y + layout.child_y_offset + jitter(layout, rng);
    let user = create_node(NodeParams {
        id: user_id,
        ..NodeParams::new(
            NodeKind::User,
            system.position.x,
            user_y,
            user_text.unwrap_or_default(),
        )
    });

    tracing::debug!(
        "[add_linked_system_and_user_node] system {} at ({}, {}), user {}",
        system.id,
        system.position.x,
        system.position.y,
        user.id
    );

    next.push(system);
    next.push(user);
    next
}

/// Random vertical offset used to avoid exact overlap of freshly placed nodes.
pub fn jitter<R: Rng + ?Sized>(layout: &LayoutConfig, rng: &mut R) -> f64 {
    if layout.overlap_randomness_max > 0.0 {
        rng.gen::<f64>() * layout.overlap_randomness_max
    } else {
        0.0
    }
}

fn map_node<F>(nodes: &[ConversationNode], id: &NodeId, f: F) -> Vec<ConversationNode>
where
    F: Fn(&mut ConversationNode),
{
    nodes
        .iter()
        .map(|node| {
            let mut copy = node.clone();
            if &copy.id == id {
                f(&mut copy);
            }
            copy
        })
        .collect()
}

/// Replace a node's text.
///
/// When `as_human` is set, a Generated node becomes EditedGenerated. Unless the node carries a
/// custom label, the label is re-derived from the new text, or from the kind and `tier` when the
/// text has nothing to show.
pub fn set_node_text(
    nodes: &[ConversationNode],
    id: &NodeId,
    text: &str,
    as_human: bool,
    tier: Option<ModelTier>,
) -> Vec<ConversationNode> {
    map_node(nodes, id, |node| {
        node.text = text.to_string();

        if as_human && node.kind == NodeKind::Generated {
            node.kind = NodeKind::EditedGenerated;
            node.style = NodeStyle::for_kind(NodeKind::EditedGenerated);
        }

        if !node.has_custom_label {
            node.label = derived_label(node.kind, &node.text, tier);
        }
    })
}

/// Set a user-chosen label. Auto-derivation never touches it again.
pub fn set_node_label(
    nodes: &[ConversationNode],
    id: &NodeId,
    label: &str,
    kind: Option<NodeKind>,
) -> Vec<ConversationNode> {
    map_node(nodes, id, |node| {
        node.label = label.to_string();
        node.has_custom_label = true;
        if let Some(kind) = kind {
            node.kind = kind;
            node.style = NodeStyle::for_kind(kind);
        }
        node.render_mode = None;
        node.draggable = None;
    })
}

pub fn set_node_stream_id(
    nodes: &[ConversationNode],
    id: &NodeId,
    stream_id: Option<StreamId>,
) -> Vec<ConversationNode> {
    map_node(nodes, id, |node| {
        node.stream = StreamState::from(stream_id.clone());
    })
}

pub fn set_node_render_mode(
    nodes: &[ConversationNode],
    id: &NodeId,
    render_mode: Option<RenderMode>,
    draggable: bool,
) -> Vec<ConversationNode> {
    map_node(nodes, id, |node| {
        node.render_mode = render_mode;
        node.draggable = Some(draggable);
    })
}

pub fn set_node_position(
    nodes: &[ConversationNode],
    id: &NodeId,
    position: Position,
) -> Vec<ConversationNode> {
    map_node(nodes, id, |node| node.position = position)
}

/// Remove one node. Edges that reference it are left in place; parent lookups through them
/// resolve to nothing.
pub fn delete_node(nodes: &[ConversationNode], id: &NodeId) -> Vec<ConversationNode> {
    nodes.iter().filter(|node| &node.id != id).cloned().collect()
}

pub fn delete_selected_nodes(nodes: &[ConversationNode]) -> Vec<ConversationNode> {
    nodes.iter().filter(|node| !node.selected).cloned().collect()
}

pub fn select_only(nodes: &[ConversationNode], id: &NodeId) -> Vec<ConversationNode> {
    nodes
        .iter()
        .map(|node| ConversationNode {
            selected: &node.id == id,
            ..node.clone()
        })
        .collect()
}

/// Flip one node's `selected` flag, leaving every other node's selection as it was.
pub fn toggle_selected(nodes: &[ConversationNode], id: &NodeId) -> Vec<ConversationNode> {
    map_node(nodes, id, |node| node.selected = !node.selected)
}

pub fn get_node<'a>(nodes: &'a [ConversationNode], id: &NodeId) -> Option<&'a ConversationNode> {
    nodes.iter().find(|node| &node.id == id)
}
