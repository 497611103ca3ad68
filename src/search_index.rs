//! Offline search index builder.
//!
//! Walks the content root and emits one [`SearchRecord`] per document:
//!
//! ```text
//! guides/index.md        → { title: "Guides overview", slug: "/docs/guides",       excerpt: "Start here…" }
//! guides/setup.md        → { title: "Setup",           slug: "/docs/guides/setup", excerpt: "Install the toolchain…" }
//! _dev/scratch.md        → skipped unless dev content is visible
//! ```
//!
//! The walk is best effort: an unreadable entry is skipped and invalid UTF-8
//! is decoded lossily.
//!
//! Bodies are reduced to plain text: code, images, links and raw HTML are
//! dropped, leftover markup punctuation becomes whitespace, and whitespace is
//! collapsed. The excerpt is the leading slice of that text.

use crate::config::{ProjectPaths, SearchConfig, SiteConfig};
use crate::frontmatter::{self, Dialect};
use crate::metadata::{DirectoryMetadata, Visibility};
use crate::naming;
use crate::types::SearchRecord;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Path segment that marks a whole subtree as dev-only.
pub const DEV_SEGMENT: &str = "_dev";

#[derive(Error, Debug)]
pub enum SearchIndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Builds search records for one content tree.
pub struct SearchIndexBuilder<'a> {
    content_root: &'a Path,
    search: &'a SearchConfig,
    visibility: Visibility,
    metadata: HashMap<PathBuf, DirectoryMetadata>,
}

impl<'a> SearchIndexBuilder<'a> {
    pub fn new(config: &'a SiteConfig, paths: &'a ProjectPaths, visibility: Visibility) -> Self {
        Self {
            content_root: &paths.content_root,
            search: &config.search,
            visibility,
            metadata: HashMap::new(),
        }
    }

    /// Records for every visible document, in sorted path order.
    pub fn build(mut self) -> Vec<SearchRecord> {
        if !self.content_root.is_dir() {
            debug!(root = %self.content_root.display(), "content root missing, no search records");
            return Vec::new();
        }

        let mut records = Vec::new();
        let walker = WalkDir::new(self.content_root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(error = %e, "skipped unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            let Some(parsed) = naming::parse_content_name(&name, &self.search.extensions) else {
                continue;
            };
            let rel = entry
                .path()
                .strip_prefix(self.content_root)
                .map(Path::to_path_buf)
                .unwrap_or_default();
            let raw = match fs::read(entry.path()) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    debug!(path = %rel.display(), error = %e, "skipped unreadable document");
                    continue;
                }
            };
            if let Some(record) = self.record(&rel, &parsed, &raw) {
                records.push(record);
            } else {
                debug!(path = %rel.display(), "skipped dev-only document");
            }
        }

        debug!(records = records.len(), "built search records");
        records
    }

    /// The record for one document, or `None` when it is hidden.
    fn record(
        &mut self,
        rel: &Path,
        parsed: &naming::ParsedName,
        raw: &str,
    ) -> Option<SearchRecord> {
        let doc = frontmatter::split(raw);
        let header_dev_only = doc.header.is_some_and(frontmatter::header_dev_only);
        if !self.visibility.shows_dev_content()
            && (header_dev_only || self.dev_only_by_path(rel, &parsed.base))
        {
            return None;
        }

        let segments = dir_segments(rel);
        let rel_dir = segments.join("/");
        let slug_path = naming::doc_slug(&rel_dir, &parsed.base);
        let title = doc
            .header
            .and_then(|h| frontmatter::header_title(h, Dialect::KeyValue))
            .unwrap_or_else(|| {
                if naming::is_index(&parsed.base) {
                    segments
                        .last()
                        .map(|dir| naming::pretty_label(dir))
                        .unwrap_or_else(|| "Index".to_string())
                } else {
                    parsed.base.clone()
                }
            });

        Some(SearchRecord {
            title,
            slug: format!("{}/{slug_path}", self.search.slug_prefix),
            excerpt: excerpt(&plain_text(doc.body), self.search.excerpt_chars),
        })
    }

    /// Whether a `_dev` segment or any `_metadata.json` along the path hides
    /// the document.
    fn dev_only_by_path(&mut self, rel: &Path, base: &str) -> bool {
        let segments = dir_segments(rel);
        if segments.iter().any(|s| s == DEV_SEGMENT) {
            return true;
        }
        let mut dir = self.content_root.to_path_buf();
        for segment in &segments {
            let meta = self.metadata_for(&dir);
            if meta.dev_only || meta.item(segment).dev_only {
                return true;
            }
            dir.push(segment);
        }
        let meta = self.metadata_for(&dir);
        meta.dev_only || meta.item(base).dev_only
    }

    fn metadata_for(&mut self, dir: &Path) -> &DirectoryMetadata {
        self.metadata
            .entry(dir.to_path_buf())
            .or_insert_with(|| DirectoryMetadata::load(dir))
    }
}

fn dir_segments(rel: &Path) -> Vec<String> {
    rel.parent()
        .map(|p| {
            p.components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Reduce a markdown body to whitespace-collapsed plain text.
pub fn plain_text(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let mut text = String::with_capacity(markdown.len());
    // Depth inside code blocks, images and links.
    let mut skip = 0usize;

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(Tag::CodeBlock(_) | Tag::Image { .. } | Tag::Link { .. }) => skip += 1,
            Event::End(TagEnd::CodeBlock | TagEnd::Image | TagEnd::Link) => {
                skip = skip.saturating_sub(1);
                text.push(' ');
            }
            Event::Text(t) if skip == 0 => text.push_str(&t),
            Event::End(tag) if ends_block(tag) => text.push(' '),
            Event::SoftBreak | Event::HardBreak | Event::Rule => text.push(' '),
            _ => {}
        }
    }

    let cleaned: String = text
        .chars()
        .map(|c| match c {
            '#' | '>' | '*' | '_' | '-' | '+' | '[' | ']' => ' ',
            c => c,
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn ends_block(tag: TagEnd) -> bool {
    matches!(
        tag,
        TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::Item
            | TagEnd::TableCell
            | TagEnd::TableRow
            | TagEnd::TableHead
    )
}

/// The first `max_chars` characters of `text`.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect::<String>().trim_end().to_string()
}

/// Build search records for a project.
pub fn build_records(
    config: &SiteConfig,
    paths: &ProjectPaths,
    visibility: Visibility,
) -> Vec<SearchRecord> {
    SearchIndexBuilder::new(config, paths, visibility).build()
}

/// Write records as pretty JSON, creating parent directories.
pub fn write_records(records: &[SearchRecord], output: &Path) -> Result<(), SearchIndexError> {
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, serde_json::to_string_pretty(records)?)?;
    Ok(())
}
