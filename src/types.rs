//! Shared output types.
//!
//! These are the only shapes that leave the crate: the sanitized sidebar
//! consumed by the site framework, and the flat search record list consumed
//! by the query layer. Both are serialized to JSON.

use serde::{Deserialize, Serialize};

/// One sanitized sidebar node.
///
/// A leaf carries `label` and exactly one of `link` or `slug`; a section
/// carries `label` and `items` (possibly empty). No other key is ever
/// serialized, so strict consumers accept the structure as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarItem {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<SidebarItem>>,
}

impl SidebarItem {
    /// Whether this node is a section rather than a leaf.
    pub fn is_section(&self) -> bool {
        self.items.is_some()
    }

    /// Child nodes of a section; empty for leaves.
    pub fn children(&self) -> &[SidebarItem] {
        self.items.as_deref().unwrap_or_default()
    }
}

/// One searchable document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub title: String,
    pub slug: String,
    /// Leading plain text of the document, whitespace collapsed.
    #[serde(default)]
    pub excerpt: String,
}
