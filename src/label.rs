//! Display labels for nodes.
//!
//! A node's label is either derived from its text with [format_auto_label], derived from its
//! kind with [display_name] (while the text is still empty), or set by the user, in which case
//! it is never derived again.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::properties::{ModelTier, NodeKind};

/// Maximum number of characters kept from the text before the label is truncated.
pub const MAX_AUTOLABEL_CHARS: usize = 32;

/// Appended to labels that were cut short.
pub const TRUNCATION_MARKER: &str = " ...";

static INVALID_LABEL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9.,'?!\-\s]+").expect("label pattern is valid"));

static WHITESPACE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

fn clean_label_text(text: &str) -> String {
    let decomposed: String = text.nfkd().collect();
    let stripped = INVALID_LABEL_CHARS.replace_all(&decomposed, "");
    WHITESPACE_RUNS
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}

/// Derive a short label from free text.
///
/// The text is normalized (compatibility decomposition, unsupported characters removed,
/// whitespace collapsed and trimmed). If it fits in [MAX_AUTOLABEL_CHARS] it is returned as is.
/// Otherwise the prefix is cut back to the last whole word and [TRUNCATION_MARKER] is appended.
pub fn format_auto_label(text: &str) -> String {
    let cleaned = clean_label_text(text);
    if cleaned.chars().count() <= MAX_AUTOLABEL_CHARS {
        return cleaned;
    }

    let prefix: String = cleaned.chars().take(MAX_AUTOLABEL_CHARS).collect();
    let kept = match prefix.rfind(' ') {
        Some(idx) if idx > 0 => &prefix[..idx],
        _ => prefix.as_str(),
    };
    format!("{}{}", kept.trim_end(), TRUNCATION_MARKER)
}

pub fn is_truncated(label: &str) -> bool {
    label.ends_with(TRUNCATION_MARKER)
}

/// Default label for a node with no text, based on its kind.
pub fn display_name(kind: NodeKind, tier: Option<ModelTier>) -> String {
    match kind {
        NodeKind::System => "System".to_string(),
        NodeKind::User => "User".to_string(),
        NodeKind::Generated => match tier {
            None => "GPT".to_string(),
            Some(ModelTier::Gpt4) => "GPT-4".to_string(),
            Some(ModelTier::Gpt35) => "GPT-3.5".to_string(),
        },
        NodeKind::EditedGenerated => {
            format!("{} (edited)", display_name(NodeKind::Generated, tier))
        }
    }
}

/// Whether a formatted label says anything. Text made only of characters the formatter strips
/// (CJK, emoji) leaves punctuation or nothing behind.
pub fn has_label_content(label: &str) -> bool {
    label.chars().any(char::is_alphanumeric)
}

/// The label a node without a custom label should carry for `text`. Falls back to the kind's
/// [display_name] when the text is empty or formats to nothing readable.
pub fn derived_label(kind: NodeKind, text: &str, tier: Option<ModelTier>) -> String {
    let label = format_auto_label(text);
    if has_label_content(&label) {
        label
    } else {
        display_name(kind, tier)
    }
}
