//! The basic building blocks of a conversation graph: the [ConversationNode] and [Edge]
//! records and their small value types.

use enumset::{EnumSet, EnumSetType};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::{
    color::NodeStyle,
    ids::{NodeId, StreamId},
};

/// The role a node plays in a conversation.
#[derive(EnumSetType, Debug, Serialize, Deserialize)]
#[enumset(serialize_repr = "list")]
pub enum NodeKind {
    System,
    User,
    #[serde(alias = "GPT")]
    Generated,
    /// A Generated node whose text was later edited by a human.
    #[serde(alias = "GPT (tweaked)")]
    EditedGenerated,
}

impl NodeKind {
    /// Kinds produced by the generation service, edited or not.
    pub fn generated() -> EnumSet<NodeKind> {
        NodeKind::Generated | NodeKind::EditedGenerated
    }

    pub fn is_generated(&self) -> bool {
        NodeKind::generated().contains(*self)
    }

    /// Chat role used when the node is sent to the generation service.
    pub fn role(&self) -> &'static str {
        match self {
            NodeKind::System => "system",
            NodeKind::User => "user",
            NodeKind::Generated | NodeKind::EditedGenerated => "assistant",
        }
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Which family of model produced a Generated node. Only affects the default display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelTier {
    Gpt35,
    Gpt4,
}

impl ModelTier {
    /// Infer the tier from a model name such as `gpt-4` or `gpt-3.5-turbo`.
    pub fn from_model(model: &str) -> Option<ModelTier> {
        let model = model.to_ascii_lowercase();
        if model.starts_with("gpt-4") {
            Some(ModelTier::Gpt4)
        } else if model.starts_with("gpt-3.5") {
            Some(ModelTier::Gpt35)
        } else {
            None
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }
}

/// Whether a generation is currently bound to a node.
///
/// `Idle -> Streaming(id)` when a request starts, `Streaming(a) -> Streaming(b)` when a newer
/// request supersedes it, and `Streaming(_) -> Idle` when it finishes or is canceled.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamState {
    #[default]
    Idle,
    Streaming(StreamId),
}

impl StreamState {
    pub fn stream_id(&self) -> Option<&StreamId> {
        match self {
            StreamState::Idle => None,
            StreamState::Streaming(id) => Some(id),
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, StreamState::Streaming(_))
    }
}

impl From<Option<StreamId>> for StreamState {
    fn from(id: Option<StreamId>) -> Self {
        match id {
            Some(id) => StreamState::Streaming(id),
            None => StreamState::Idle,
        }
    }
}

/// Presentation override for a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderMode {
    /// The node is showing an inline editor for its label.
    LabelEditor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationNode {
    pub id: NodeId,
    pub position: Position,
    pub kind: NodeKind,
    pub text: String,
    pub label: String,
    #[serde(default)]
    pub has_custom_label: bool,
    #[serde(default)]
    pub stream: StreamState,
    #[serde(default)]
    pub selected: bool,
    pub style: NodeStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_mode: Option<RenderMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draggable: Option<bool>,
}

impl ConversationNode {
    pub fn stream_id(&self) -> Option<&StreamId> {
        self.stream.stream_id()
    }
}

impl Display for ConversationNode {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.label, self.kind, self.id)
    }
}

/// A directed source -> target connection. `animated` is presentation only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub animated: bool,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId, animated: bool) -> Self {
        Edge {
            source,
            target,
            animated,
        }
    }
}
