//! Per-directory metadata loading and per-item override resolution.
//!
//! Each content directory may carry a `_metadata.json` descriptor:
//!
//! ```json
//! {
//!   "label": "Guides",
//!   "order": 1,
//!   "devOnly": false,
//!   "items": {
//!     "setup": { "label": "Install", "order": 2 },
//!     "status": { "link": "https://status.example.com", "open": "new" }
//!   },
//!   "legacy-page": { "order": 5 }
//! }
//! ```
//!
//! ## Override lookup
//!
//! Two authoring conventions are supported: overrides nested under `items`,
//! and (legacy) overrides as top-level keys named after the file. The nested
//! form wins when both exist for the same base name. A missing override is an
//! empty one.
//!
//! ## Malformed descriptors
//!
//! A descriptor that is unreadable or is not a JSON object is treated as
//! absent. Inside a descriptor every field is read on its own: a value of
//! the wrong type counts as missing and never takes its neighbors with it,
//! so a directory's `devOnly` survives a broken item entry.
//!
//! ## Link resolution priority
//!
//! Each navigable target is resolved from multiple sources with [`resolve`];
//! the first non-empty value wins:
//!
//! ```text
//! link: resolve(&[sidecar_link, override.link, override.href])
//! ```

use indexmap::IndexMap;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::Path;

/// File name of the per-directory descriptor.
pub const METADATA_FILENAME: &str = "_metadata.json";

/// Order given to anything without an explicit `order`.
pub const DEFAULT_ORDER: f64 = 999.0;

/// How an external link is opened from the sidebar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenMode {
    /// New tab, through the viewer.
    New,
    /// Embedded in the viewer.
    Embed,
    /// Same tab, through the proxy path. Unknown modes land here.
    #[default]
    #[serde(other)]
    Same,
}

/// Per-item override from a directory descriptor.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemOverride {
    #[serde(deserialize_with = "lenient")]
    pub label: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub order: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub dev_only: bool,
    #[serde(deserialize_with = "lenient")]
    pub link: Option<String>,
    /// Alias of `link`, consulted after it.
    #[serde(deserialize_with = "lenient")]
    pub href: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub slug: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub open: OpenMode,
}

impl ItemOverride {
    /// Sort key, defaulting to [`DEFAULT_ORDER`].
    pub fn order(&self) -> f64 {
        self.order.unwrap_or(DEFAULT_ORDER)
    }

    /// Explicit `link`, falling back to `href`. Blank values count as absent.
    pub fn explicit_link(&self) -> Option<String> {
        resolve(&[self.link.as_deref(), self.href.as_deref()])
    }

    /// Explicit `slug`, trimmed. Blank values count as absent.
    pub fn explicit_slug(&self) -> Option<String> {
        resolve(&[self.slug.as_deref()])
    }
}

/// A directory's `_metadata.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DirectoryMetadata {
    #[serde(deserialize_with = "lenient")]
    pub label: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub order: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub dev_only: bool,
    /// Raw overrides keyed by base name, in authoring order.
    #[serde(deserialize_with = "lenient")]
    pub items: IndexMap<String, serde_json::Value>,
    /// Any other top-level key; candidates for the legacy override form.
    #[serde(flatten)]
    legacy: serde_json::Map<String, serde_json::Value>,
}

impl DirectoryMetadata {
    /// Load `_metadata.json` from `dir`, or an empty descriptor when the file
    /// is missing or malformed.
    pub fn load(dir: &Path) -> Self {
        fs::read_to_string(dir.join(METADATA_FILENAME))
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    /// Sort key of the directory itself.
    pub fn order(&self) -> f64 {
        self.order.unwrap_or(DEFAULT_ORDER)
    }

    /// Override for `base`: `items[base]` first, then a top-level `base` key.
    pub fn item(&self, base: &str) -> ItemOverride {
        self.items
            .get(base)
            .and_then(parse_override)
            .or_else(|| self.legacy.get(base).and_then(parse_override))
            .unwrap_or_default()
    }

    /// Overrides declared under `items`, skipping private keys and entries
    /// that are not objects.
    pub fn declared_items(&self) -> impl Iterator<Item = (&str, ItemOverride)> {
        self.items
            .iter()
            .filter(|(key, _)| !key.starts_with('_'))
            .filter_map(|(key, value)| Some((key.as_str(), parse_override(value)?)))
    }
}

fn parse_override(value: &serde_json::Value) -> Option<ItemOverride> {
    value
        .is_object()
        .then(|| ItemOverride::deserialize(value).ok())
        .flatten()
}

/// Deserialize a field, falling back to its default when the value has the
/// wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient<T> {
        Valid(T),
        Invalid(IgnoredAny),
    }

    Ok(match Lenient::<T>::deserialize(deserializer)? {
        Lenient::Valid(value) => value,
        Lenient::Invalid(_) => T::default(),
    })
}

/// Who may see dev-only content.
///
/// Dev-only entries are visible in development mode or when reference/draft
/// content is explicitly requested, and hidden otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Visibility {
    pub dev_mode: bool,
    pub show_reference: bool,
}

impl Visibility {
    /// Read the policy from `NODE_ENV` and `SHOW_REFERENCE`.
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("NODE_ENV").ok().as_deref(),
            std::env::var("SHOW_REFERENCE").ok().as_deref(),
        )
    }

    /// Build the policy from raw environment values.
    pub fn from_vars(node_env: Option<&str>, show_reference: Option<&str>) -> Self {
        Self {
            dev_mode: node_env == Some("development"),
            show_reference: show_reference == Some("true"),
        }
    }

    /// Whether an entry with the given `devOnly` flag is visible.
    pub fn allows(&self, dev_only: bool) -> bool {
        self.dev_mode || self.show_reference || !dev_only
    }

    /// Whether dev-only content is visible at all.
    pub fn shows_dev_content(&self) -> bool {
        self.allows(true)
    }
}

/// Resolve a value from multiple sources.
///
/// Takes optional values in priority order and returns the first one that is
/// non-empty after trimming.
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}
