//! An editing session: the single owner of the current graph, selection and history.
//!
//! [Session] strings the pure graph operations together the way an editor front end does:
//! every user-visible mutation first records a snapshot, then replaces the collections with
//! the transformed ones. Streamed deltas are applied without snapshots, so undo steps over a
//! whole generation at once.

use rand::{rngs::StdRng, SeedableRng};

use crate::{
    config::{Settings, StaveConfig},
    error::{StaveError, StreamError},
    graph::{
        add_edge, add_linked_system_and_user_node, add_node, children_of, connection_allowed,
        delete_node, delete_selected_nodes, generated_children_of, get_node, nodes::jitter,
        parent_of, select_only, set_edge_animated, set_node_label, set_node_text,
        siblings_of, toggle_selected, ConversationGraph, Edges, NodeParams,
    },
    history::{History, HistoryItem},
    ids::{generate_node_id, NodeId, StreamId},
    prompt::{completion_request, messages_for, CompletionRequest},
    properties::{ConversationNode, NodeKind},
    stream::{append_streamed_text, begin_stream, cancel_stream, finish_stream},
};

/// One response slot opened by [Session::submit_prompt].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCompletion {
    pub node_id: NodeId,
    pub stream_id: StreamId,
}

/// What the generation client needs to start streaming: the request body, and for choice
/// index `i` the node and stream its deltas go to (`completions[i]`).
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSubmission {
    pub request: CompletionRequest,
    pub completions: Vec<PendingCompletion>,
}

#[derive(Debug)]
pub struct Session {
    nodes: Vec<ConversationNode>,
    edges: Edges,
    selected_node_id: Option<NodeId>,
    last_selected_node_id: Option<NodeId>,
    history: History,
    config: StaveConfig,
    rng: StdRng,
}

impl Session {
    pub fn new(config: StaveConfig) -> Result<Self, StaveError> {
        Session::from_graph(config, ConversationGraph::default())
    }

    /// Resume from a previously persisted graph. History starts empty.
    pub fn from_graph(config: StaveConfig, graph: ConversationGraph) -> Result<Self, StaveError> {
        config.validate()?;
        let rng = match config.engine.jitter_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let errors = graph.built_in_test();
        if !errors.is_empty() {
            tracing::warn!(
                "[Session::from_graph] graph has structural problems:\n- {}",
                errors.join("\n- ")
            );
        }
        let selected_node_id = graph
            .nodes
            .iter()
            .find(|node| node.selected)
            .map(|node| node.id.clone());
        Ok(Session {
            nodes: graph.nodes,
            edges: graph.edges,
            selected_node_id,
            last_selected_node_id: None,
            history: History::new(config.engine.max_history),
            config,
            rng,
        })
    }

    pub fn nodes(&self) -> &[ConversationNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &Edges {
        &self.edges
    }

    pub fn node(&self, id: &NodeId) -> Option<&ConversationNode> {
        get_node(&self.nodes, id)
    }

    pub fn selected_node_id(&self) -> Option<&NodeId> {
        self.selected_node_id.as_ref()
    }

    pub fn last_selected_node_id(&self) -> Option<&NodeId> {
        self.last_selected_node_id.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn settings(&self) -> &Settings {
        &self.config.settings
    }

    pub fn set_settings(&mut self, settings: Settings) -> Result<(), StaveError> {
        let mut config = self.config.clone();
        config.settings = settings;
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// The current (nodes, edges) pair, for the caller to persist.
    pub fn graph(&self) -> ConversationGraph {
        ConversationGraph::new(self.nodes.clone(), self.edges.clone())
    }

    pub fn current_state(&self) -> HistoryItem {
        HistoryItem {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            selected_node_id: self.selected_node_id.clone(),
            last_selected_node_id: self.last_selected_node_id.clone(),
        }
    }

    fn restore(&mut self, item: HistoryItem) {
        self.nodes = item.nodes;
        self.edges = item.edges;
        self.selected_node_id = item.selected_node_id;
        self.last_selected_node_id = item.last_selected_node_id;
    }

    /// Record the current state as an undo step and invalidate redo.
    pub fn take_snapshot(&mut self) {
        let state = self.current_state();
        self.history.take_snapshot(state);
    }

    pub fn undo(&mut self) -> bool {
        let current = self.current_state();
        match self.history.undo(current) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.current_state();
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    fn require_node(&self, id: &NodeId) -> Result<&ConversationNode, StaveError> {
        get_node(&self.nodes, id).ok_or_else(|| StaveError::NotFound(format!("node {id}")))
    }

    fn require_selected(&self) -> Result<NodeId, StaveError> {
        let id = self
            .selected_node_id
            .clone()
            .ok_or_else(|| StaveError::NotFound("no node is selected".to_string()))?;
        self.require_node(&id)?;
        Ok(id)
    }

    /// Select `id`. Selection is UI state and does not create an undo step.
    pub fn select(&mut self, id: &NodeId) {
        self.last_selected_node_id = self.selected_node_id.replace(id.clone());
        self.nodes = select_only(&self.nodes, id);
    }

    /// Add `id` to the selection, or take it out. Focus stays where it is.
    pub fn toggle_selected(&mut self, id: &NodeId) {
        self.nodes = toggle_selected(&self.nodes, id);
    }

    fn clear_selection(&mut self) {
        self.selected_node_id = None;
        self.last_selected_node_id = None;
    }

    /// Start a new conversation tree seeded with the default preamble. Returns the User node,
    /// which becomes selected.
    pub fn new_tree(&mut self, user_text: Option<&str>) -> NodeId {
        self.take_snapshot();

        let system_id = generate_node_id();
        let user_id = generate_node_id();
        self.nodes = add_linked_system_and_user_node(
            &self.nodes,
            &self.config.settings.default_preamble,
            user_text,
            Some(system_id.clone()),
            Some(user_id.clone()),
            &self.config.engine.layout,
            &mut self.rng,
        );
        self.edges = add_edge(&self.edges, system_id, user_id.clone(), false);
        self.select(&user_id);

        tracing::debug!("[Session::new_tree] created tree with user node {user_id}");
        user_id
    }

    /// Add an empty child of `kind` under the selected node and select it.
    pub fn new_connected_to_selected(&mut self, kind: NodeKind) -> Result<NodeId, StaveError> {
        let parent_id = self.require_selected()?;
        self.take_snapshot();
        let id = self.add_child(&parent_id, kind, "", None);
        self.select(&id);
        Ok(id)
    }

    /// Place a new child to the right of the parent's rightmost child (or directly below the
    /// parent) and connect it.
    fn add_child(
        &mut self,
        parent_id: &NodeId,
        kind: NodeKind,
        text: &str,
        stream_id: Option<StreamId>,
    ) -> NodeId {
        let layout = &self.config.engine.layout;
        let (x, y) = {
            let parent = get_node(&self.nodes, parent_id);
            let parent_pos = parent.map(|p| p.position).unwrap_or_default();
            let x = children_of(&self.nodes, &self.edges, parent_id)
                .iter()
                .map(|child| child.position.x)
                .reduce(f64::max)
                .map(|rightmost| rightmost + layout.sibling_x_offset)
                .unwrap_or(parent_pos.x);
            (x, parent_pos.y + layout.child_y_offset + jitter(layout, &mut self.rng))
        };

        let id = generate_node_id();
        let mut params = NodeParams::new(kind, x, y, text)
            .with_id(id.clone())
            .with_tier(self.config.settings.model_tier());
        params.stream_id = stream_id.clone();
        self.nodes = add_node(&self.nodes, params);

        if connection_allowed(&self.nodes, &self.edges, parent_id, &id) {
            self.edges = add_edge(&self.edges, parent_id.clone(), id.clone(), stream_id.is_some());
        } else {
            tracing::warn!("[Session::add_child] connection {parent_id} -> {id} refused");
        }
        id
    }

    /// Connect two existing nodes. Returns `Ok(false)` when the connection would give `target`
    /// a second parent or close a cycle; nothing changes in that case.
    pub fn connect(&mut self, source: &NodeId, target: &NodeId) -> Result<bool, StaveError> {
        self.require_node(source)?;
        self.require_node(target)?;
        if !connection_allowed(&self.nodes, &self.edges, source, target) {
            tracing::debug!("[Session::connect] {source} -> {target} not allowed");
            return Ok(false);
        }
        self.take_snapshot();
        self.edges = add_edge(&self.edges, source.clone(), target.clone(), false);
        Ok(true)
    }

    pub fn edit_text(&mut self, id: &NodeId, text: &str) -> Result<(), StaveError> {
        self.require_node(id)?;
        self.take_snapshot();
        self.nodes = set_node_text(
            &self.nodes,
            id,
            text,
            true,
            self.config.settings.model_tier(),
        );
        Ok(())
    }

    pub fn rename(&mut self, id: &NodeId, label: &str) -> Result<(), StaveError> {
        self.require_node(id)?;
        self.take_snapshot();
        self.nodes = set_node_label(&self.nodes, id, label, None);
        Ok(())
    }

    /// Delete the selected node(s).
    ///
    /// When only the focused node is being deleted, focus first moves to its right sibling, or
    /// failing that to its parent. When a multi-selection that includes the focused node is
    /// deleted, focus is cleared.
    pub fn delete_selected(&mut self) {
        self.take_snapshot();

        let selected: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|node| node.selected)
            .map(|node| node.id.clone())
            .collect();

        match self.selected_node_id.clone() {
            Some(focused)
                if selected.is_empty() || (selected.len() == 1 && selected[0] == focused) =>
            {
                let moved = self.move_to_right_sibling() || self.move_to_parent();
                if !moved {
                    self.clear_selection();
                }
                self.nodes = delete_node(&self.nodes, &focused);
                tracing::debug!("[Session::delete_selected] deleted focused node {focused}");
            }
            focused => {
                self.nodes = delete_selected_nodes(&self.nodes);
                if focused.is_some_and(|focused| selected.contains(&focused)) {
                    self.clear_selection();
                }
                tracing::debug!(
                    "[Session::delete_selected] deleted {} selected nodes",
                    selected.len()
                );
            }
        }
    }

    /// Remove every node and edge.
    pub fn clear(&mut self) {
        self.take_snapshot();
        self.nodes = Vec::new();
        self.edges = Edges::new();
        self.clear_selection();
    }

    pub fn move_to_parent(&mut self) -> bool {
        let Some(current) = self.selected_node_id.clone() else {
            return false;
        };
        match parent_of(&self.nodes, &self.edges, &current).map(|p| p.id.clone()) {
            Some(parent) => {
                self.select(&parent);
                true
            }
            None => false,
        }
    }

    /// Move to a child, preferring the one focus came from.
    pub fn move_to_child(&mut self) -> bool {
        let Some(current) = self.selected_node_id.clone() else {
            return false;
        };
        let children: Vec<NodeId> = children_of(&self.nodes, &self.edges, &current)
            .iter()
            .map(|child| child.id.clone())
            .collect();
        let target = self
            .last_selected_node_id
            .clone()
            .filter(|last| children.contains(last))
            .or_else(|| children.first().cloned());
        match target {
            Some(child) => {
                self.select(&child);
                true
            }
            None => false,
        }
    }

    fn move_to_sibling(&mut self, step: isize) -> bool {
        let Some(current) = self.selected_node_id.clone() else {
            return false;
        };
        let siblings: Vec<NodeId> = siblings_of(&self.nodes, &self.edges, &current)
            .iter()
            .map(|sibling| sibling.id.clone())
            .collect();
        let Some(idx) = siblings.iter().position(|id| id == &current) else {
            return false;
        };
        let next = idx as isize + step;
        if next < 0 {
            return false;
        }
        match siblings.get(next as usize).cloned() {
            Some(sibling) => {
                self.select(&sibling);
                true
            }
            None => false,
        }
    }

    pub fn move_to_left_sibling(&mut self) -> bool {
        self.move_to_sibling(-1)
    }

    pub fn move_to_right_sibling(&mut self) -> bool {
        self.move_to_sibling(1)
    }

    /// Open `completion_count` response slots under the selected node and bind each to a fresh
    /// stream.
    ///
    /// With `regenerate`, existing Generated children are reused (text cleared, old streams
    /// superseded) before new children are added. The first slot becomes selected.
    pub fn submit_prompt(&mut self, regenerate: bool) -> Result<PromptSubmission, StaveError> {
        let parent_id = self.require_selected()?;
        let messages = messages_for(&self.nodes, &self.edges, &parent_id)?;
        self.take_snapshot();

        let reusable: Vec<NodeId> = if regenerate {
            generated_children_of(&self.nodes, &self.edges, &parent_id)
                .iter()
                .map(|node| node.id.clone())
                .collect()
        } else {
            Vec::new()
        };

        let count = self.config.settings.completion_count as usize;
        let mut completions = Vec::with_capacity(count);
        for idx in 0..count {
            let completion = match reusable.get(idx) {
                Some(node_id) => {
                    let tier = self.config.settings.model_tier();
                    self.nodes = set_node_text(&self.nodes, node_id, "", false, tier);
                    let (nodes, stream_id) = begin_stream(&self.nodes, node_id);
                    self.nodes = nodes;
                    self.edges = set_edge_animated(&self.edges, node_id, true);
                    PendingCompletion {
                        node_id: node_id.clone(),
                        stream_id,
                    }
                }
                None => {
                    let stream_id = StreamId::generate();
                    let node_id =
                        self.add_child(&parent_id, NodeKind::Generated, "", Some(stream_id.clone()));
                    PendingCompletion { node_id, stream_id }
                }
            };
            completions.push(completion);
        }

        if let Some(first) = completions.first() {
            let first = first.node_id.clone();
            self.select(&first);
        }

        tracing::debug!(
            "[Session::submit_prompt] {} completions under {parent_id} (regenerate: {regenerate})",
            completions.len()
        );

        Ok(PromptSubmission {
            request: completion_request(&self.config.settings, messages),
            completions,
        })
    }

    /// Bind a fresh stream to an existing node. Any stream in flight there goes stale.
    pub fn begin_stream(&mut self, id: &NodeId) -> Result<StreamId, StaveError> {
        self.require_node(id)?;
        let (nodes, stream_id) = begin_stream(&self.nodes, id);
        self.nodes = nodes;
        self.edges = set_edge_animated(&self.edges, id, true);
        Ok(stream_id)
    }

    /// Append a delta to the node bound to `stream_id`. A node that was deleted mid-stream
    /// reports [StreamError::Canceled] so its producer stops.
    pub fn apply_delta(
        &mut self,
        id: &NodeId,
        stream_id: &StreamId,
        delta: &str,
    ) -> Result<(), StreamError> {
        if self.node(id).is_none() {
            return Err(StreamError::Canceled { node_id: id.clone() });
        }
        self.nodes = append_streamed_text(&self.nodes, id, delta, stream_id)?;
        Ok(())
    }

    /// Mark `stream_id` as complete. A newer stream bound to the same node is left alone.
    pub fn finish_stream(&mut self, id: &NodeId, stream_id: &StreamId) {
        let bound = self.node(id).and_then(|node| node.stream_id()) == Some(stream_id);
        self.nodes = finish_stream(&self.nodes, id, stream_id);
        if bound {
            self.edges = set_edge_animated(&self.edges, id, false);
        }
    }

    pub fn cancel_stream(&mut self, id: &NodeId) {
        self.nodes = cancel_stream(&self.nodes, id);
        self.edges = set_edge_animated(&self.edges, id, false);
    }
}
