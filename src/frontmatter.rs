//! Document header parsing and title extraction.
//!
//! Content documents may start with a header block delimited by `---` lines.
//! Two dialects are accepted:
//!
//! - **Key-value** (`.md`, `.mdx`, `.mdoc`): `title: Getting started`, with
//!   optional surrounding quotes.
//! - **Script** (page templates, `.astro` by default): the header is code, so
//!   the title is found by pattern-matching `const title = '...'`,
//!   `export const title = "..."`, or a `title:` field inside an
//!   `export const frontmatter = { ... }` / `export const page = { ... }`
//!   object literal.
//!
//! The script dialect has no single canonical parse; the patterns below are a
//! heuristic and miss titles built from expressions or template strings.
//!
//! Extraction is best-effort throughout: unreadable files, missing headers
//! and unterminated headers all yield `None`, never an error.

use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

const DELIMITER: &str = "---";

static KEY_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^title:\s*(.*?)\s*$").expect("valid regex"));

static KEY_DEV_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^devonly:\s*(\S+)\s*$").expect("valid regex"));

static SCRIPT_TITLE: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r#"export\s+const\s+(?i:title)\s*=\s*['"]([^'"]+)['"]"#),
        Regex::new(r#"\bconst\s+(?i:title)\s*=\s*['"]([^'"]+)['"]"#),
        Regex::new(
            r#"export\s+const\s+(?:frontmatter|page)\s*=\s*\{[\s\S]*?(?i:title)\s*:\s*['"]([^'"]+)['"]"#,
        ),
    ]
    .map(|r| r.expect("valid regex"))
});

/// Which header dialect a document uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    KeyValue,
    Script,
}

impl Dialect {
    /// Script dialect for the page-template extension, key-value otherwise.
    pub fn for_extension(extension: &str, template_extension: &str) -> Self {
        if extension.eq_ignore_ascii_case(template_extension) {
            Dialect::Script
        } else {
            Dialect::KeyValue
        }
    }
}

/// A document split into its header block and body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document<'a> {
    /// Text between the opening and closing delimiters (may be empty).
    pub header: Option<&'a str>,
    /// Everything after the closing delimiter line, or the whole text when
    /// there is no header.
    pub body: &'a str,
}

/// Split raw document text into header and body.
///
/// A header exists only when the text begins with `---` and a later line
/// starts with `---`.
pub fn split(raw: &str) -> Document<'_> {
    let no_header = Document {
        header: None,
        body: raw,
    };
    if !raw.starts_with(DELIMITER) {
        return no_header;
    }
    let Some(end) = raw[DELIMITER.len()..].find("\n---").map(|i| i + DELIMITER.len()) else {
        return no_header;
    };
    let header = &raw[DELIMITER.len()..end];
    let after = &raw[end + 1 + DELIMITER.len()..];
    let body = match after.find('\n') {
        Some(nl) => &after[nl + 1..],
        None => "",
    };
    Document {
        header: Some(header),
        body,
    }
}

/// Extract a title from a header block.
///
/// Script headers are matched against the code patterns first: a
/// `title: '...',` line inside an object literal would otherwise be read as
/// a key-value line with its trailing comma.
pub fn header_title(header: &str, dialect: Dialect) -> Option<String> {
    if dialect == Dialect::Script {
        let script = SCRIPT_TITLE
            .iter()
            .find_map(|re| re.captures(header))
            .map(|caps| caps[1].trim().to_string())
            .filter(|t| !t.is_empty());
        if script.is_some() {
            return script;
        }
    }
    for line in header.lines() {
        if let Some(caps) = KEY_TITLE.captures(line.trim()) {
            let value = strip_quotes(&caps[1]).trim();
            return (!value.is_empty()).then(|| value.to_string());
        }
    }
    None
}

/// Whether a key-value header declares `devOnly: true`.
pub fn header_dev_only(header: &str) -> bool {
    header.lines().any(|line| {
        KEY_DEV_ONLY
            .captures(line.trim())
            .is_some_and(|caps| strip_quotes(&caps[1]).eq_ignore_ascii_case("true"))
    })
}

/// Read the title of the document at `path`.
///
/// Returns `None` when the file is unreadable, has no header, or its header
/// has no recognizable title.
pub fn read_title(path: &Path, dialect: Dialect) -> Option<String> {
    let raw = fs::read_to_string(path).ok()?;
    header_title(split(&raw).header?, dialect)
}

fn strip_quotes(value: &str) -> &str {
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if quoted {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
