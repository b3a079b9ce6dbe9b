//! Presentation colors keyed by [NodeKind].

use serde::{Deserialize, Serialize};

use crate::properties::NodeKind;

pub fn kind_color(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::User => "#EEEEEE",
        NodeKind::Generated => "#d9f3d6",
        NodeKind::EditedGenerated => "#f7d0a1",
        NodeKind::System => "#C5E2F6",
    }
}

pub fn kind_dark_color(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::User => "#A9ABAE",
        NodeKind::Generated => "#619F83",
        NodeKind::EditedGenerated => "#CB7937",
        NodeKind::System => "#5F8AF7",
    }
}

/// Shift every channel of a `#rrggbb` color by `amount`, clamped to `0..=255`.
///
/// Channels that are not valid hex are passed through unchanged.
pub fn adjust_color(color: &str, amount: i32) -> String {
    let hex = color.trim_start_matches('#');
    let mut out = String::with_capacity(7);
    out.push('#');
    let bytes = hex.as_bytes();
    for chunk in bytes.chunks(2) {
        let channel = std::str::from_utf8(chunk).unwrap_or_default();
        match u8::from_str_radix(channel, 16) {
            Ok(value) if chunk.len() == 2 => {
                let shifted = (value as i32 + amount).clamp(0, 255);
                out.push_str(&format!("{shifted:02x}"));
            }
            _ => out.push_str(channel),
        }
    }
    out
}

/// Visual style attached to each node. `accent` is used for borders and selection outlines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStyle {
    pub background: String,
    pub accent: String,
}

impl NodeStyle {
    pub fn for_kind(kind: NodeKind) -> Self {
        NodeStyle {
            background: kind_color(kind).to_string(),
            accent: kind_dark_color(kind).to_string(),
        }
    }

    /// Background used while the node is hovered or being dragged.
    pub fn highlighted(&self) -> String {
        adjust_color(&self.background, -20)
    }
}
