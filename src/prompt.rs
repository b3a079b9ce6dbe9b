//! Turning a lineage into the message list sent to the generation service.

use serde::{Deserialize, Serialize};

use crate::{
    config::Settings,
    error::StaveError,
    graph::{lineage_of, Edges},
    ids::NodeId,
    properties::ConversationNode,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Request body handed to the external generation client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub n: u32,
    pub stream: bool,
}

/// The conversation leading to `id`, root first, `id` last.
pub fn messages_for(
    nodes: &[ConversationNode],
    edges: &Edges,
    id: &NodeId,
) -> Result<Vec<ChatMessage>, StaveError> {
    let lineage = lineage_of(nodes, edges, id)?;
    Ok(lineage
        .into_iter()
        .rev()
        .map(|node| ChatMessage {
            role: node.kind.role().to_string(),
            content: node.text.clone(),
        })
        .collect())
}

pub fn completion_request(settings: &Settings, messages: Vec<ChatMessage>) -> CompletionRequest {
    CompletionRequest {
        model: settings.model.clone(),
        messages,
        temperature: settings.temperature,
        n: settings.completion_count,
        stream: true,
    }
}

/// Plain-text rendering of a message list, suitable for the clipboard.
pub fn transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|message| format!("{}: {}", message.role, message.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
