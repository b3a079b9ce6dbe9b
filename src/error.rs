use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use serde_json::Error as JsonError;

use crate::ids::{NodeId, StreamId};

/// Failure modes of [crate::stream::append_streamed_text].
///
/// Both variants are terminal for the producer that received them: the delta sequence bound to
/// that stream id must not be consumed any further. Neither is surfaced to the end user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum StreamError {
    #[error("Stream {stream_id} on node {node_id} was superseded by a newer stream")]
    Stale { node_id: NodeId, stream_id: StreamId },
    #[error("Stream on node {node_id} was canceled")]
    Canceled { node_id: NodeId },
}

impl StreamError {
    pub fn node_id(&self) -> &NodeId {
        match self {
            StreamError::Stale { node_id, .. } => node_id,
            StreamError::Canceled { node_id } => node_id,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, StreamError::Stale { .. })
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, StreamError::Canceled { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum StaveError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid identifier: {0}")]
    InvalidId(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error(
        "Lineage of node {node_id} exceeded {limit} ancestors; the parent relation contains a cycle"
    )]
    StructuralCorruption { node_id: NodeId, limit: usize },
}

impl From<toml::de::Error> for StaveError {
    fn from(src: toml::de::Error) -> StaveError {
        StaveError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for StaveError {
    fn from(src: toml::ser::Error) -> StaveError {
        StaveError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for StaveError {
    fn from(src: JsonError) -> StaveError {
        StaveError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<io::Error> for StaveError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => StaveError::NotFound(format!("{x}")),
            _ => StaveError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_stream_error_wraps_into_stave_error() {
        let node_id = NodeId::new("n1").unwrap();
        let err: StaveError = StreamError::Canceled {
            node_id: node_id.clone(),
        }
        .into();
        assert_eq!(
            err,
            StaveError::Stream(StreamError::Canceled { node_id: node_id.clone() })
        );
        assert_eq!(err.to_string(), "Stream on node n1 was canceled");
    }

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let err: StaveError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, StaveError::NotFound(_)));
    }
}
