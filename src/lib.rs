//! # docs-nav
//!
//! Filesystem-driven navigation and search for a content-collection
//! documentation site. The content directory is the data source: directories
//! become sidebar sections, documents become entries, and small JSON
//! descriptors tune labels, ordering and visibility.
//!
//! # Architecture: Two Independent Passes
//!
//! ```text
//! content/docs/ ─┬─ sidebar       →  sidebar.json   (nested, sanitized navigation)
//!                └─ search_index  →  search.json    (flat {title, slug, excerpt} list)
//!                                        │
//!                                        └─ search  →  ranked results
//! ```
//!
//! Both passes are pure functions of the tree on disk at the moment they run.
//! The [`watcher`] re-runs the sidebar pass (and restarts the dev server) when
//! the tree changes.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`sidebar`] | Recursive tree builder: link resolution, ordering, sanitization |
//! | [`metadata`] | `_metadata.json` descriptors, override lookup, dev-only visibility |
//! | [`frontmatter`] | Header block split, title and `devOnly` extraction |
//! | [`links`] | `.link` sidecar files and external link rewriting |
//! | [`naming`] | Base names, private names, pretty labels, folder-index slugs |
//! | [`search_index`] | Offline plain-text extraction into search records |
//! | [`search`] | In-memory ranked full-text index over the records |
//! | [`watcher`] | Debounced change detection and dev-server restarts |
//! | [`config`] | `docs-nav.toml` loading, merging over defaults, validation |
//! | [`types`] | Output shapes shared between passes (`SidebarItem`, `SearchRecord`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Sanitized Output
//!
//! The builder works on an internal node type carrying sort keys and link
//! markers, then rebuilds every node as a [`types::SidebarItem`], which can
//! only hold `label`, `link`, `slug` and `items`. Site frameworks validate
//! sidebar entries strictly; a stray key fails their build.
//!
//! ## No Dangling Links
//!
//! Page templates in the content tree are only linked when a real page
//! exists for them under the pages root. Metadata items that name neither a
//! link nor a slug are dropped.
//!
//! ## Explicit Inputs
//!
//! Roots, visibility and link paths are passed in explicitly. Nothing reads
//! process-wide state except the CLI, which turns environment variables into
//! a [`metadata::Visibility`] once.

pub mod config;
pub mod frontmatter;
pub mod links;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod search;
pub mod search_index;
pub mod sidebar;
pub mod types;
pub mod watcher;

#[cfg(test)]
pub(crate) mod test_helpers;
