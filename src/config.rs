//! Project configuration module.
//!
//! Handles loading, validating, and merging `docs-nav.toml`. Stock defaults
//! are overridden by the user's file, which only needs the keys it changes.
//!
//! ## Config File Location
//!
//! ```text
//! project/
//! ├── docs-nav.toml            # Optional, next to the site's package.json
//! └── src/
//!     ├── content/docs/        # content_root
//!     └── pages/               # pages_root (real template pages)
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! content_root = "src/content/docs"
//! pages_root = "src/pages"
//!
//! [content]
//! extensions = ["md", "mdx", "mdoc", "astro"]
//! template_extension = "astro"
//!
//! [links]
//! viewer_path = "/viewer"
//! proxy_path = "/go"
//!
//! [sidebar]
//! output = ".docs-nav/sidebar.json"
//!
//! [search]
//! output = "src/layouts/helpers/.json/search.json"
//! extensions = ["md", "mdx"]
//! slug_prefix = "/docs"
//! excerpt_chars = 200
//! default_limit = 20
//!
//! [watch]
//! debounce_ms = 200
//! ```
//!
//! Relative paths are resolved against the project root by [`ProjectPaths`],
//! which is what the builders receive. Unknown keys are rejected to catch
//! typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default config file name, looked up in the project root.
pub const CONFIG_FILENAME: &str = "docs-nav.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `docs-nav.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Directory holding the documentation sources.
    pub content_root: String,
    /// Directory holding real template pages, checked before linking them.
    pub pages_root: String,
    /// Content file recognition.
    pub content: ContentConfig,
    /// External link rewriting.
    pub links: LinksConfig,
    /// Generated sidebar artifact.
    pub sidebar: SidebarConfig,
    /// Search artifact and query defaults.
    pub search: SearchConfig,
    /// Dev watcher timing.
    pub watch: WatchConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            content_root: "src/content/docs".to_string(),
            pages_root: "src/pages".to_string(),
            content: ContentConfig::default(),
            links: LinksConfig::default(),
            sidebar: SidebarConfig::default(),
            search: SearchConfig::default(),
            watch: WatchConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.content.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "content.extensions must not be empty".into(),
            ));
        }
        if !self
            .content
            .extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(&self.content.template_extension))
        {
            return Err(ConfigError::Validation(
                "content.template_extension must be one of content.extensions".into(),
            ));
        }
        if self.search.excerpt_chars == 0 {
            return Err(ConfigError::Validation(
                "search.excerpt_chars must be non-zero".into(),
            ));
        }
        if self.search.default_limit == 0 {
            return Err(ConfigError::Validation(
                "search.default_limit must be non-zero".into(),
            ));
        }
        if self.watch.debounce_ms == 0 {
            return Err(ConfigError::Validation(
                "watch.debounce_ms must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Content file recognition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    /// Extensions (without dot) that make a file a content document.
    pub extensions: Vec<String>,
    /// The page-template extension: script headers, linked only when a real
    /// page exists under `pages_root`.
    pub template_extension: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            extensions: ["md", "mdx", "mdoc", "astro"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            template_extension: "astro".to_string(),
        }
    }
}

/// Paths used when rewriting external links.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinksConfig {
    /// Viewer route for `embed` and `new` open modes.
    pub viewer_path: String,
    /// Proxy route for same-tab external links.
    pub proxy_path: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            viewer_path: "/viewer".to_string(),
            proxy_path: "/go".to_string(),
        }
    }
}

/// Generated sidebar artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SidebarConfig {
    /// Where `docs-nav sidebar` writes its JSON.
    pub output: String,
}

impl Default for SidebarConfig {
    fn default() -> Self {
        Self {
            output: ".docs-nav/sidebar.json".to_string(),
        }
    }
}

/// Search artifact and query defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Where the flat search record list is written.
    pub output: String,
    /// Extensions indexed for search.
    pub extensions: Vec<String>,
    /// Prefix prepended to every search slug.
    pub slug_prefix: String,
    /// Maximum excerpt length in characters.
    pub excerpt_chars: usize,
    /// Result cap when the caller gives none.
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            output: "src/layouts/helpers/.json/search.json".to_string(),
            extensions: vec!["md".to_string(), "mdx".to_string()],
            slug_prefix: "/docs".to_string(),
            excerpt_chars: 200,
            default_limit: 20,
        }
    }
}

/// Dev watcher timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Quiet period after the last event before restarting.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 200 }
    }
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Absolute locations derived from a config and a project root.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectPaths {
    pub project_root: PathBuf,
    pub content_root: PathBuf,
    pub pages_root: PathBuf,
    pub sidebar_output: PathBuf,
    pub search_output: PathBuf,
    /// The config file, watched alongside the content tree.
    pub config_file: PathBuf,
}

impl ProjectPaths {
    /// Resolve every configured path against `project_root`.
    pub fn resolve(config: &SiteConfig, project_root: &Path, config_file: &Path) -> Self {
        let join = |p: &str| project_root.join(p);
        Self {
            project_root: project_root.to_path_buf(),
            content_root: join(&config.content_root),
            pages_root: join(&config.pages_root),
            sidebar_output: join(&config.sidebar.output),
            search_output: join(&config.search.output),
            config_file: project_root.join(config_file),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load config from `config_path`, merged on top of stock defaults and
/// validated.
pub fn load_config(config_path: &Path) -> Result<SiteConfig, ConfigError> {
    let merged = match load_raw_config(config_path)? {
        Some(overlay) => merge_toml(stock_defaults_value(), overlay),
        None => stock_defaults_value(),
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `docs-nav.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# docs-nav Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Relative paths are resolved against
# the directory containing this file's project (see --project).
# Unknown keys will cause an error.

# Documentation sources. Every first-level folder becomes a sidebar section.
content_root = "src/content/docs"

# Real template pages. A template document in the content tree is linked
# only when a matching page exists here.
pages_root = "src/pages"

# ---------------------------------------------------------------------------
# Content recognition
# ---------------------------------------------------------------------------
[content]
# File extensions treated as content documents.
extensions = ["md", "mdx", "mdoc", "astro"]

# Page-template extension (script-style header, linked to pages_root).
template_extension = "astro"

# ---------------------------------------------------------------------------
# External links
# ---------------------------------------------------------------------------
[links]
# Viewer route used by `open = "embed"` and `open = "new"`.
viewer_path = "/viewer"

# Proxy route used for same-tab external links (URL is base64url-encoded).
proxy_path = "/go"

# ---------------------------------------------------------------------------
# Sidebar
# ---------------------------------------------------------------------------
[sidebar]
# Where the generated navigation JSON is written.
output = ".docs-nav/sidebar.json"

# ---------------------------------------------------------------------------
# Search
# ---------------------------------------------------------------------------
[search]
# Where the flat search record list is written.
output = "src/layouts/helpers/.json/search.json"

# Extensions indexed for search.
extensions = ["md", "mdx"]

# Prefix prepended to every search result slug.
slug_prefix = "/docs"

# Excerpt length in characters.
excerpt_chars = 200

# Number of results returned when no limit is given.
default_limit = 20

# ---------------------------------------------------------------------------
# Dev watcher
# ---------------------------------------------------------------------------
[watch]
# Quiet period (milliseconds) after the last change before restarting.
debounce_ms = 200
"##
}
