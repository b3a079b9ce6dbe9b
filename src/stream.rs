//! Streaming append protocol.
//!
//! Every generation request gets a fresh [StreamId] bound to its target node with
//! [begin_stream]. Each text delta the generation client receives is then applied with
//! [append_streamed_text]. Rebinding the node to a newer stream, or clearing the binding, is the
//! only way to stop an older producer: its next append fails with [StreamError::Stale] or
//! [StreamError::Canceled] and it is expected to stop consuming its delta sequence.

use crate::{
    error::StreamError,
    graph::{get_node, set_node_stream_id},
    ids::{generate_stream_id, NodeId, StreamId},
    label::{format_auto_label, has_label_content, is_truncated},
    properties::{ConversationNode, StreamState},
};

/// Bind a fresh stream to `id`, superseding any stream already in flight on it.
pub fn begin_stream(
    nodes: &[ConversationNode],
    id: &NodeId,
) -> (Vec<ConversationNode>, StreamId) {
    let stream_id = generate_stream_id();
    tracing::debug!("[begin_stream] node {id} bound to stream {stream_id}");
    (set_node_stream_id(nodes, id, Some(stream_id.clone())), stream_id)
}

/// Clear whatever stream is bound to `id`. Its producer fails Canceled on its next delta.
pub fn cancel_stream(nodes: &[ConversationNode], id: &NodeId) -> Vec<ConversationNode> {
    tracing::debug!("[cancel_stream] node {id}");
    set_node_stream_id(nodes, id, None)
}

/// Clear the binding once `stream_id` has delivered its last delta. A node that has since been
/// rebound to a newer stream keeps that binding.
pub fn finish_stream(
    nodes: &[ConversationNode],
    id: &NodeId,
    stream_id: &StreamId,
) -> Vec<ConversationNode> {
    match get_node(nodes, id) {
        Some(node) if node.stream_id() == Some(stream_id) => set_node_stream_id(nodes, id, None),
        _ => nodes.to_vec(),
    }
}

/// Append a streamed delta to the node's text.
///
/// Fails without touching the collection when the node's binding is not `stream_id`. On success
/// the label is recomputed from the full text unless the node has a custom label, or the label is
/// already truncated and this is not the first delta of the stream. An unknown `id` returns the
/// collection unchanged.
pub fn append_streamed_text(
    nodes: &[ConversationNode],
    id: &NodeId,
    text: &str,
    stream_id: &StreamId,
) -> Result<Vec<ConversationNode>, StreamError> {
    let Some(node) = get_node(nodes, id) else {
        tracing::debug!("[append_streamed_text] node {id} no longer exists");
        return Ok(nodes.to_vec());
    };

    match &node.stream {
        StreamState::Idle => {
            return Err(StreamError::Canceled { node_id: id.clone() });
        }
        StreamState::Streaming(current) if current != stream_id => {
            return Err(StreamError::Stale {
                node_id: id.clone(),
                stream_id: stream_id.clone(),
            });
        }
        StreamState::Streaming(_) => {}
    }

    Ok(nodes
        .iter()
        .map(|node| {
            if &node.id != id {
                return node.clone();
            }
            let mut copy = node.clone();
            let is_first_delta = copy.text.is_empty();
            copy.text.push_str(text);

            if !copy.has_custom_label && (is_first_delta || !is_truncated(&copy.label)) {
                let label = format_auto_label(&copy.text);
                if has_label_content(&label) {
                    copy.label = label;
                }
            }
            copy
        })
        .collect())
}
