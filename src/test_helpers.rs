//! Shared test utilities for the docs-nav test suite.
//!
//! Provides a scratch project builder, the fixture site copier, lookup
//! helpers, and sidebar tree assertions.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = SiteFixture::new();
//! site.doc("guides/setup.md", "---\ntitle: Setup\n---\n");
//! site.doc("guides/_metadata.json", r#"{ "label": "Guides" }"#);
//!
//! let items = build_sidebar(&SiteConfig::default(), &site.paths(), prod());
//! assert_tree_shape(&items, &[("Guides", &["Setup"])]);
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::{CONFIG_FILENAME, ProjectPaths, SiteConfig};
use crate::metadata::Visibility;
use crate::types::{SearchRecord, SidebarItem};

// =========================================================================
// Scratch projects
// =========================================================================

/// An empty project in a temp directory, laid out with default config paths.
pub struct SiteFixture {
    dir: TempDir,
}

impl SiteFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Paths resolved with the default config.
    pub fn paths(&self) -> ProjectPaths {
        fixture_paths(self.root())
    }

    /// Content root under the default config.
    pub fn content_root(&self) -> PathBuf {
        self.paths().content_root
    }

    /// Write a file relative to the content root.
    pub fn doc(&self, rel: &str, contents: &str) -> PathBuf {
        write_file(&self.content_root().join(rel), contents)
    }

    /// Write a file relative to the pages root.
    pub fn page(&self, rel: &str, contents: &str) -> PathBuf {
        write_file(&self.paths().pages_root.join(rel), contents)
    }

    /// Create an (empty) directory relative to the content root.
    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.content_root().join(rel);
        fs::create_dir_all(&path).unwrap();
        path
    }
}

fn write_file(path: &Path, contents: &str) -> PathBuf {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
    path.to_path_buf()
}

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

/// Paths for a project rooted at `root` with the default config.
pub fn fixture_paths(root: &Path) -> ProjectPaths {
    ProjectPaths::resolve(&SiteConfig::default(), root, Path::new(CONFIG_FILENAME))
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Visibility shorthands
// =========================================================================

pub fn prod() -> Visibility {
    Visibility::default()
}

pub fn dev() -> Visibility {
    Visibility {
        dev_mode: true,
        show_reference: false,
    }
}

pub fn reference() -> Visibility {
    Visibility {
        dev_mode: false,
        show_reference: true,
    }
}

// =========================================================================
// Lookups — panics with a clear message on miss
// =========================================================================

/// Labels of a sibling list, in order.
pub fn labels(items: &[SidebarItem]) -> Vec<&str> {
    items.iter().map(|i| i.label.as_str()).collect()
}

/// Find a sidebar item by label among siblings. Panics if not found.
pub fn find_item<'a>(items: &'a [SidebarItem], label: &str) -> &'a SidebarItem {
    items.iter().find(|i| i.label == label).unwrap_or_else(|| {
        panic!("item '{label}' not found. Available: {:?}", labels(items))
    })
}

/// Find a search record by slug. Panics if not found.
pub fn find_record<'a>(records: &'a [SearchRecord], slug: &str) -> &'a SearchRecord {
    records.iter().find(|r| r.slug == slug).unwrap_or_else(|| {
        let slugs: Vec<&str> = records.iter().map(|r| r.slug.as_str()).collect();
        panic!("record '{slug}' not found. Available: {slugs:?}")
    })
}

// =========================================================================
// Tree assertions
// =========================================================================

/// Assert that the top two levels of the sidebar match an expected shape.
///
/// Each entry is `(section label, child labels)`.
///
/// ```rust
/// assert_tree_shape(&items, &[
///     ("Guides", &["Setup", "Install"]),
///     ("Reference", &["API"]),
/// ]);
/// ```
pub fn assert_tree_shape(items: &[SidebarItem], expected: &[(&str, &[&str])]) {
    let expected_labels: Vec<&str> = expected.iter().map(|(l, _)| *l).collect();
    assert_eq!(labels(items), expected_labels, "top-level labels mismatch");

    for (label, children) in expected {
        let section = find_item(items, label);
        assert_eq!(
            labels(section.children()),
            children.to_vec(),
            "children of '{label}' mismatch"
        );
    }
}

/// Assert that every object in a serialized sidebar uses only the allowed
/// keys, and that leaves carry exactly one target.
pub fn assert_only_allowed_keys(value: &serde_json::Value) {
    let nodes = value.as_array().expect("sidebar is an array");
    for node in nodes {
        let obj = node.as_object().expect("sidebar node is an object");
        for key in obj.keys() {
            assert!(
                matches!(key.as_str(), "label" | "link" | "slug" | "items"),
                "unexpected key '{key}' in {node}"
            );
        }
        match obj.get("items") {
            Some(children) => {
                assert!(!obj.contains_key("link") && !obj.contains_key("slug"));
                assert_only_allowed_keys(children);
            }
            None => assert!(
                obj.contains_key("link") ^ obj.contains_key("slug"),
                "leaf needs exactly one of link/slug: {node}"
            ),
        }
    }
}
