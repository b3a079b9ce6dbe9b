//! Opaque identifiers for nodes and generation streams.
//!
//! Identifiers are plain strings on the wire so that caller-supplied ids (from persisted graphs
//! or tests) round-trip unchanged. Freshly generated ids are random v4 UUIDs rendered in their
//! simple (unhyphenated) lowercase encoding.

use serde::{Deserialize, Serialize};
use std::{
    borrow::Borrow,
    fmt::{Display, Formatter},
    str::FromStr,
};
use uuid::Uuid;

use crate::error::StaveError;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, StaveError> {
                let value = value.into();
                if value.is_empty() {
                    return Err(StaveError::InvalidId(format!(
                        "{} must not be empty",
                        stringify!($name)
                    )));
                }
                Ok($name(value))
            }

            pub fn generate() -> Self {
                $name(
                    Uuid::new_v4()
                        .simple()
                        .encode_lower(&mut Uuid::encode_buffer())
                        .to_string(),
                )
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = StaveError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = StaveError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                $name::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = StaveError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                $name::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }
    };
}

opaque_id!(
    /// Identity of a node. Unique within a graph and immutable after creation.
    NodeId
);

opaque_id!(
    /// Binds a sequence of streamed text deltas to one generation request on one node.
    StreamId
);

/// Generate a collision-resistant node identifier.
pub fn generate_node_id() -> NodeId {
    NodeId::generate()
}

/// Generate a fresh stream identity for a new generation request.
pub fn generate_stream_id() -> StreamId {
    StreamId::generate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use test_log::test;

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: BTreeSet<NodeId> = (0..1000).map(|_| generate_node_id()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| id.as_str().len() == 32));
    }

    #[test]
    fn test_empty_id_rejected() {
        assert!(matches!(NodeId::new(""), Err(StaveError::InvalidId(_))));
        assert!(StreamId::try_from("").is_err());
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = NodeId::new("system-1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"system-1\"");
        let back: NodeId = serde_json::from_str("\"system-1\"").unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<NodeId>("\"\"").is_err());
    }
}
