//! Filesystem-driven sidebar generation.
//!
//! Walks the content root and turns its directory tree into the ordered,
//! labeled navigation structure the site framework renders as a sidebar.
//!
//! ## Directory Structure
//!
//! ```text
//! src/content/docs/                # Content root (its files are not listed)
//! ├── guides/                      # Section
//! │   ├── _metadata.json           # Section label/order, per-item overrides
//! │   ├── index.md                 # Slug "guides" (folder index)
//! │   ├── setup.md                 # Slug "guides/setup"
//! │   ├── status.link              # Standalone link entry
//! │   └── advanced/                # Nested section
//! │       └── tuning.md
//! ├── reference/
//! │   ├── api.md
//! │   └── dashboard.astro          # Linked only if src/pages/reference/dashboard.astro exists
//! └── _drafts/                     # Private: never traversed
//! ```
//!
//! ## Entry resolution
//!
//! For each content document the first matching rule wins:
//!
//! 1. A co-named sidecar `<base>.link` → link entry, labeled from metadata or
//!    the pretty filename label.
//! 2. An explicit `link`/`href` override → link entry.
//! 3. A page template → link entry to the real page, or nothing when no page
//!    exists (no dangling links).
//! 4. Otherwise → slug entry.
//!
//! Metadata-declared items without a file, and standalone link files, add
//! entries of their own; an entry with no navigable target is dropped.
//!
//! ## Ordering
//!
//! Siblings are stably sorted by `order` (default 999), so unordered entries
//! keep discovery order: content files by name, then metadata items in
//! authoring order, then standalone link files by name, then subdirectories
//! by name.
//!
//! ## Sanitization
//!
//! The internal tree carries sort keys. The output
//! is rebuilt as [`SidebarItem`]s, which can only hold `label`, `link`,
//! `slug` and `items`.

use crate::config::{ContentConfig, LinksConfig, ProjectPaths, SiteConfig};
use crate::frontmatter::{self, Dialect};
use crate::links;
use crate::metadata::{self, DirectoryMetadata, ItemOverride, Visibility};
use crate::naming::{self, ParsedName};
use crate::types::SidebarItem;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SidebarError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Internal navigation node, before sanitization.
#[derive(Debug, Clone, PartialEq)]
struct NavNode {
    label: String,
    target: Target,
    order: f64,
}

#[derive(Debug, Clone, PartialEq)]
enum Target {
    Link(String),
    Slug(String),
    Section(Vec<NavNode>),
}

impl NavNode {
    fn leaf(label: String, target: Target, order: f64) -> Self {
        Self {
            label,
            target,
            order,
        }
    }

    fn link(label: String, link: String, order: f64) -> Self {
        Self::leaf(label, Target::Link(link), order)
    }

    fn sanitize(self) -> SidebarItem {
        let (link, slug, items) = match self.target {
            Target::Link(link) => (Some(link), None, None),
            Target::Slug(slug) => (None, Some(slug), None),
            Target::Section(children) => (
                None,
                None,
                Some(children.into_iter().map(NavNode::sanitize).collect()),
            ),
        };
        SidebarItem {
            label: self.label,
            link,
            slug,
            items,
        }
    }
}

/// Builds the sidebar for one content tree.
///
/// Holds only configuration; every [`build`](Self::build) call reads the
/// filesystem from scratch.
pub struct SidebarBuilder<'a> {
    content_root: &'a Path,
    pages_root: &'a Path,
    content: &'a ContentConfig,
    links: &'a LinksConfig,
    visibility: Visibility,
}

/// Entries of one directory, sorted by name.
struct DirListing {
    files: Vec<ParsedName>,
    dirs: Vec<String>,
}

impl<'a> SidebarBuilder<'a> {
    pub fn new(config: &'a SiteConfig, paths: &'a ProjectPaths, visibility: Visibility) -> Self {
        Self {
            content_root: &paths.content_root,
            pages_root: &paths.pages_root,
            content: &config.content,
            links: &config.links,
            visibility,
        }
    }

    /// Build the sanitized sidebar: one section per first-level directory.
    ///
    /// A missing content root yields an empty sidebar.
    pub fn build(&self) -> Vec<SidebarItem> {
        if !self.content_root.is_dir() {
            debug!(root = %self.content_root.display(), "content root missing, empty sidebar");
            return Vec::new();
        }
        let listing = self.list(self.content_root);
        let mut sections: Vec<NavNode> = listing
            .dirs
            .iter()
            .filter_map(|name| self.build_section(&self.content_root.join(name), name, name))
            .collect();
        sort_by_order(&mut sections);
        debug!(sections = sections.len(), "built sidebar");
        sections.into_iter().map(NavNode::sanitize).collect()
    }

    /// Build the section for `abs_dir`, or `None` when the directory is
    /// hidden by its own `devOnly` flag.
    fn build_section(&self, abs_dir: &Path, rel_dir: &str, dir_name: &str) -> Option<NavNode> {
        let meta = DirectoryMetadata::load(abs_dir);
        if !self.visibility.allows(meta.dev_only) {
            return None;
        }

        let listing = self.list(abs_dir);
        let link_files = links::read_link_files(abs_dir);
        let file_bases: HashSet<&str> = listing.files.iter().map(|f| f.base.as_str()).collect();
        let mut emitted: HashSet<&str> = HashSet::new();
        let mut items = Vec::new();

        for file in &listing.files {
            let item = meta.item(&file.base);
            if !self.visibility.allows(item.dev_only) {
                continue;
            }
            let sidecar = link_files.get(&file.base).map(String::as_str);
            if let Some(node) = self.file_node(abs_dir, rel_dir, file, &item, sidecar) {
                items.push(node);
            }
        }

        for (key, item) in meta.declared_items() {
            if file_bases.contains(key) || !self.visibility.allows(item.dev_only) {
                continue;
            }
            let sidecar = link_files.get(key).map(String::as_str);
            if let Some(node) = self.declared_node(key, &item, sidecar) {
                emitted.insert(key);
                items.push(node);
            }
        }

        items.extend(self.standalone_links(&meta, &link_files, &file_bases, &emitted));

        for name in &listing.dirs {
            let child_rel = format!("{rel_dir}/{name}");
            if let Some(section) = self.build_section(&abs_dir.join(name), &child_rel, name) {
                items.push(section);
            }
        }

        sort_by_order(&mut items);

        Some(NavNode::leaf(
            meta.label.clone().unwrap_or_else(|| dir_name.to_string()),
            Target::Section(items),
            meta.order(),
        ))
    }

    /// Entry for a physical content document.
    fn file_node(
        &self,
        abs_dir: &Path,
        rel_dir: &str,
        file: &ParsedName,
        item: &ItemOverride,
        sidecar: Option<&str>,
    ) -> Option<NavNode> {
        let order = item.order();

        if let Some(url) = sidecar {
            let label = item
                .label
                .clone()
                .unwrap_or_else(|| naming::pretty_label(&file.base));
            let destination = links::resolve_destination(url, item.open, self.links);
            return Some(NavNode::link(label, destination, order));
        }

        let dialect = Dialect::for_extension(&file.extension, &self.content.template_extension);
        let label = item.label.clone().unwrap_or_else(|| {
            let path = abs_dir.join(format!("{}.{}", file.base, file.extension));
            frontmatter::read_title(&path, dialect).unwrap_or_else(|| file.base.clone())
        });

        if let Some(url) = item.explicit_link() {
            let destination = links::resolve_destination(&url, item.open, self.links);
            return Some(NavNode::link(label, destination, order));
        }

        if dialect == Dialect::Script {
            let link = self.template_page_link(rel_dir, &file.base)?;
            return Some(NavNode::leaf(label, Target::Link(link), order));
        }

        Some(NavNode::leaf(
            label,
            Target::Slug(naming::doc_slug(rel_dir, &file.base)),
            order,
        ))
    }

    /// Entry for a metadata item with no physical document.
    fn declared_node(&self, key: &str, item: &ItemOverride, sidecar: Option<&str>) -> Option<NavNode> {
        let order = item.order();
        let link = metadata::resolve(&[sidecar, item.link.as_deref(), item.href.as_deref()]);
        if let Some(url) = link {
            let label = item.label.clone().unwrap_or_else(|| match sidecar {
                Some(_) => naming::pretty_label(key),
                None => key.to_string(),
            });
            let destination = links::resolve_destination(&url, item.open, self.links);
            return Some(NavNode::link(label, destination, order));
        }
        let slug = item.explicit_slug()?;
        let label = item.label.clone().unwrap_or_else(|| key.to_string());
        Some(NavNode::leaf(label, Target::Slug(slug), order))
    }

    /// Entries for link files that match neither a document nor an emitted
    /// metadata item.
    fn standalone_links(
        &self,
        meta: &DirectoryMetadata,
        link_files: &BTreeMap<String, String>,
        file_bases: &HashSet<&str>,
        emitted: &HashSet<&str>,
    ) -> Vec<NavNode> {
        link_files
            .iter()
            .filter(|(base, _)| !file_bases.contains(base.as_str()) && !emitted.contains(base.as_str()))
            .filter_map(|(base, url)| {
                let item = meta.item(base);
                if !self.visibility.allows(item.dev_only) {
                    return None;
                }
                let label = item
                    .label
                    .clone()
                    .unwrap_or_else(|| naming::pretty_label(base));
                let destination = links::resolve_destination(url, item.open, self.links);
                Some(NavNode::link(label, destination, item.order()))
            })
            .collect()
    }

    /// Route of the real page backing a template document, if one exists.
    fn template_page_link(&self, rel_dir: &str, base: &str) -> Option<String> {
        let ext = &self.content.template_extension;
        let page_dir = self.pages_root.join(rel_dir);
        let route = naming::doc_slug(rel_dir, base);
        if page_dir.join(format!("{base}.{ext}")).is_file() {
            Some(format!("/{route}"))
        } else if page_dir.join(base).join(format!("index.{ext}")).is_file() {
            Some(format!("/{route}/"))
        } else {
            None
        }
    }

    fn list(&self, dir: &Path) -> DirListing {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
            .unwrap_or_default();
        paths.sort();

        let mut listing = DirListing {
            files: Vec::new(),
            dirs: Vec::new(),
        };
        for path in paths {
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
                continue;
            };
            if naming::is_private(&name) {
                continue;
            }
            if path.is_dir() {
                listing.dirs.push(name);
            } else if let Some(parsed) = naming::parse_content_name(&name, &self.content.extensions)
            {
                listing.files.push(parsed);
            }
        }
        listing
    }
}

/// Stable sort by `order`; ties keep discovery order.
fn sort_by_order(nodes: &mut [NavNode]) {
    nodes.sort_by(|a, b| a.order.total_cmp(&b.order));
}

/// Build the sidebar for a project.
pub fn build_sidebar(
    config: &SiteConfig,
    paths: &ProjectPaths,
    visibility: Visibility,
) -> Vec<SidebarItem> {
    SidebarBuilder::new(config, paths, visibility).build()
}

/// Write the sidebar as pretty JSON, creating parent directories.
pub fn write_sidebar(items: &[SidebarItem], output: &Path) -> Result<(), SidebarError> {
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(items)?;
    fs::write(output, json)?;
    Ok(())
}
