//! Centralized filename rules for content entries.
//!
//! Every stage (sidebar, search index) identifies a document by its base
//! name: the file name with its content extension stripped. This module keeps
//! the naming rules in one place so both stages agree on them.
//!
//! ## Private names
//!
//! Names starting with `_` are reserved for internal descriptors
//! (`_metadata.json`, `_dev/`) and never become navigation entries. Names
//! starting with `.` are editor or VCS noise and are skipped the same way.
//!
//! ## Pretty labels
//!
//! Used whenever a label has to be derived from a filename rather than
//! authored:
//! - `getting-started` → "Getting Started"
//! - `api_reference` → "Api Reference"
//! - `faq` → "Faq"
//!
//! ## Folder-index collapsing
//!
//! A document named `index` represents its containing folder:
//! `guides/index.md` has slug `guides`, never `guides/index`.

use std::path::Path;

/// Result of splitting a file name into base name and content extension.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// File name with the extension stripped (`setup` from `setup.md`).
    pub base: String,
    /// Lowercased extension without the dot (`md`).
    pub extension: String,
}

/// Split `file_name` if its extension is one of `extensions` (case-insensitive).
///
/// Returns `None` for files without a recognized extension, so callers can
/// use this as the content-file filter.
pub fn parse_content_name(file_name: &str, extensions: &[String]) -> Option<ParsedName> {
    let (base, ext) = file_name.rsplit_once('.')?;
    if base.is_empty() {
        return None;
    }
    let ext = ext.to_ascii_lowercase();
    extensions
        .iter()
        .any(|e| e.eq_ignore_ascii_case(&ext))
        .then(|| ParsedName {
            base: base.to_string(),
            extension: ext,
        })
}

/// Whether a file or directory name is excluded from traversal.
pub fn is_private(name: &str) -> bool {
    name.starts_with('_') || name.starts_with('.')
}

/// Whether a base name is a folder index.
pub fn is_index(base: &str) -> bool {
    base.eq_ignore_ascii_case("index")
}

/// Derive a display label from a base name.
///
/// Hyphens and underscores become spaces and the first letter of every word
/// is capitalized.
pub fn pretty_label(base: &str) -> String {
    let mut label = String::with_capacity(base.len());
    let mut at_word_start = true;
    for c in base.chars() {
        let c = if c == '-' || c == '_' { ' ' } else { c };
        if at_word_start && c.is_alphanumeric() {
            label.extend(c.to_uppercase());
        } else {
            label.push(c);
        }
        at_word_start = !c.is_alphanumeric();
    }
    label
}

/// Normalize a relative path to forward slashes with no leading or trailing `/`.
pub fn normalize_rel(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Slug for a document: relative directory joined with the base name,
/// collapsing folder indexes onto the directory itself.
pub fn doc_slug(rel_dir: &str, base: &str) -> String {
    if is_index(base) {
        return rel_dir.to_string();
    }
    if rel_dir.is_empty() {
        base.to_string()
    } else {
        format!("{rel_dir}/{base}")
    }
}
