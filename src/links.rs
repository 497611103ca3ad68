//! Sidecar link files and external link rewriting.
//!
//! A file named `<base>.link` holds a destination URL (its trimmed content).
//! Co-named with a content document (`status.md` + `status.link`) it redirects
//! that document's sidebar entry; on its own it adds a new entry.
//!
//! External destinations (`http://`, `https://`) are not linked directly.
//! They are rewritten according to the entry's [`OpenMode`]:
//!
//! ```text
//! embed → /viewer?mode=embed&url=https%3A%2F%2Fexample.com
//! new   → /viewer?mode=new&url=https%3A%2F%2Fexample.com
//! same  → /go/aHR0cHM6Ly9leGFtcGxlLmNvbQ
//! ```
//!
//! Internal destinations pass through unchanged.

use crate::config::LinksConfig;
use crate::metadata::OpenMode;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Extension of sidecar link files.
pub const LINK_EXTENSION: &str = "link";

/// Collect the sidecar link files of `dir`, keyed by base name.
///
/// Private names are skipped. Unreadable or empty files are ignored.
pub fn read_link_files(dir: &Path) -> BTreeMap<String, String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return BTreeMap::new();
    };
    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter_map(|p| {
            let name = p.file_name()?.to_string_lossy().to_string();
            let (base, ext) = name.rsplit_once('.')?;
            if base.is_empty()
                || crate::naming::is_private(base)
                || !ext.eq_ignore_ascii_case(LINK_EXTENSION)
            {
                return None;
            }
            let url = fs::read_to_string(&p).ok()?.trim().to_string();
            (!url.is_empty()).then(|| (base.to_string(), url))
        })
        .collect()
}

/// Whether `url` points off-site.
pub fn is_external(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Rewrite `url` for the sidebar according to `mode`. Internal links pass
/// through unchanged.
pub fn resolve_destination(url: &str, mode: OpenMode, links: &LinksConfig) -> String {
    if !is_external(url) {
        return url.to_string();
    }
    match mode {
        OpenMode::Embed => viewer_url(&links.viewer_path, "embed", url),
        OpenMode::New => viewer_url(&links.viewer_path, "new", url),
        OpenMode::Same => format!(
            "{}/{}",
            links.proxy_path.trim_end_matches('/'),
            URL_SAFE_NO_PAD.encode(url)
        ),
    }
}

fn viewer_url(viewer_path: &str, mode: &str, url: &str) -> String {
    format!(
        "{viewer_path}?mode={mode}&url={}",
        urlencoding::encode(url)
    )
}
