//! # stave-core
//!
//! The graph engine behind a branching chat canvas: conversations are trees of messages laid
//! out on a 2-D board, where any message can fork into alternative continuations.
//!
//! ## Overview
//!
//! The conversation state is a pair of flat collections: nodes (messages) and directed edges
//! (parent -> child links). The tree is never stored; it is derived on demand from the edges.
//! Every operation is a pure transformation that takes the collections by reference and returns
//! new ones, which keeps snapshots cheap to reason about and makes undo/redo exact.
//!
//! ### Key Features
//!
//! - **Derived tree**: parent, children, siblings and lineage queries over the edge sequence,
//!   where the most recently added edge into a node decides its parent
//! - **Connection policy**: refuses edges that would close a cycle or give a node two parents
//! - **Streaming append**: generated text arrives as deltas tagged with a stream id; only the
//!   most recently bound stream may append, so regenerating or canceling silently retires
//!   older producers
//! - **Auto labels**: short, sanitized titles derived from message text
//! - **History**: bounded undo/redo of whole-graph snapshots
//!
//! ## Architecture
//!
//! - **[`graph`]**: node and edge operations, tree derivation, connection checks
//! - **[`stream`]**: the streaming-append protocol
//! - **[`label`]**: auto-label formatting and display names
//! - **[`history`]**: the undo/redo stacks
//! - **[`session`]**: an editing session tying the above to selection and history
//! - **[`event`]**: stream events from concurrent producers and the pump that applies them
//! - **[`prompt`]**: turning a lineage into the message list for a generation service
//! - **[`config`]**: settings, layout constants and the TOML config provider
//!
//! ## Quick Start
//!
//! ```rust
//! use stave_core::{config::StaveConfig, session::Session};
//!
//! # fn main() -> Result<(), stave_core::StaveError> {
//! let mut session = Session::new(StaveConfig::default())?;
//! let user = session.new_tree(Some("Explain borrowing in one sentence."));
//!
//! // One slot per requested completion, each bound to its own stream.
//! let submission = session.submit_prompt(false)?;
//! let slot = &submission.completions[0];
//! session.apply_delta(&slot.node_id, &slot.stream_id, "Borrowing lets code use")?;
//! session.apply_delta(&slot.node_id, &slot.stream_id, " a value without owning it.")?;
//! session.finish_stream(&slot.node_id, &slot.stream_id);
//!
//! let messages = stave_core::prompt::messages_for(session.nodes(), session.edges(), &slot.node_id)?;
//! assert_eq!(messages.len(), 3);
//! assert!(session.node(&user).is_some());
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **default**: the library
//! - **bin**: the `stave` command line tool for inspecting and editing saved graphs

pub mod color;
pub mod config;
pub mod error;
pub mod event;
pub mod graph;
pub mod history;
pub mod ids;
pub mod label;
pub mod prompt;
pub mod properties;
pub mod session;
pub mod stream;
#[cfg(test)]
mod tests;

pub use error::*;
