//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Every entry leads
//! with its positional index and label; where it points (slug or link) is
//! shown after an arrow, and secondary detail goes on indented lines.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Sidebar
//! 001 Guides (3 entries)
//!     001 Setup → guides/setup
//!     002 Advanced (1 entry)
//!         001 Performance tuning → guides/advanced/tuning
//!     003 Status → /go/aHR0cHM6Ly9zdGF0dXMuZXhhbXBsZS5jb20
//! 002 Reference (0 entries)
//!
//! 3 sections, 3 entries
//! ```
//!
//! ## Search
//!
//! ```text
//! 001 Setup
//!     /docs/guides/setup
//!     Install the toolchain and clone the repository...
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::types::{SearchRecord, SidebarItem};
use std::path::Path;

/// Longest excerpt preview shown in search results.
const EXCERPT_PREVIEW: usize = 60;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Format an entry header: positional index + label + target or size.
///
/// ```text
/// 001 Guides (3 entries)
/// 002 Setup → guides/setup
/// ```
fn entry_header(index: usize, item: &SidebarItem) -> String {
    let head = format!("{} {}", format_index(index), item.label);
    match (&item.items, &item.link, &item.slug) {
        (Some(children), _, _) => {
            format!("{head} ({})", plural(children.len(), "entry", "entries"))
        }
        (None, Some(link), _) => format!("{head} → {link}"),
        (None, None, Some(slug)) => format!("{head} → {slug}"),
        (None, None, None) => head,
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut.trim_end())
    }
}

// ============================================================================
// Sidebar
// ============================================================================

/// Count sections and leaf entries in a sidebar tree.
pub fn count_tree(items: &[SidebarItem]) -> (usize, usize) {
    items.iter().fold((0, 0), |(sections, leaves), item| {
        if item.is_section() {
            let (s, l) = count_tree(item.children());
            (sections + 1 + s, leaves + l)
        } else {
            (sections, leaves + 1)
        }
    })
}

fn format_tree(items: &[SidebarItem], depth: usize, lines: &mut Vec<String>) {
    for (i, item) in items.iter().enumerate() {
        lines.push(format!("{}{}", indent(depth), entry_header(i + 1, item)));
        if item.is_section() {
            format_tree(item.children(), depth + 1, lines);
        }
    }
}

/// Format the sidebar as an indented outline with a summary line.
pub fn format_sidebar_outline(items: &[SidebarItem]) -> Vec<String> {
    let mut lines = vec!["Sidebar".to_string()];
    format_tree(items, 0, &mut lines);
    let (sections, leaves) = count_tree(items);
    lines.push(String::new());
    lines.push(format!(
        "{}, {}",
        plural(sections, "section", "sections"),
        plural(leaves, "entry", "entries")
    ));
    lines
}

/// Print the sidebar outline to stdout.
pub fn print_sidebar_outline(items: &[SidebarItem]) {
    for line in format_sidebar_outline(items) {
        println!("{}", line);
    }
}

/// Format the confirmation after writing the sidebar.
pub fn format_sidebar_written(items: &[SidebarItem], output: &Path) -> Vec<String> {
    let (sections, leaves) = count_tree(items);
    vec![format!(
        "Wrote {}, {} → {}",
        plural(sections, "section", "sections"),
        plural(leaves, "entry", "entries"),
        output.display()
    )]
}

pub fn print_sidebar_written(items: &[SidebarItem], output: &Path) {
    for line in format_sidebar_written(items, output) {
        println!("{}", line);
    }
}

// ============================================================================
// Search
// ============================================================================

/// Format the confirmation after writing the search artifact.
pub fn format_records_written(count: usize, output: &Path) -> Vec<String> {
    vec![format!(
        "Wrote {} → {}",
        plural(count, "record", "records"),
        output.display()
    )]
}

pub fn print_records_written(count: usize, output: &Path) {
    for line in format_records_written(count, output) {
        println!("{}", line);
    }
}

/// Format ranked search results.
pub fn format_search_results(results: &[SearchRecord]) -> Vec<String> {
    if results.is_empty() {
        return vec!["No results".to_string()];
    }
    let mut lines = Vec::new();
    for (i, record) in results.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), record.title));
        lines.push(format!("    {}", record.slug));
        let preview = truncate(&record.excerpt, EXCERPT_PREVIEW);
        if !preview.is_empty() {
            lines.push(format!("    {}", preview));
        }
    }
    lines
}

pub fn print_search_results(results: &[SearchRecord]) {
    for line in format_search_results(results) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(label: &str, slug: &str) -> SidebarItem {
        SidebarItem {
            label: label.to_string(),
            link: None,
            slug: Some(slug.to_string()),
            items: None,
        }
    }

    fn link(label: &str, link: &str) -> SidebarItem {
        SidebarItem {
            label: label.to_string(),
            link: Some(link.to_string()),
            slug: None,
            items: None,
        }
    }

    fn section(label: &str, items: Vec<SidebarItem>) -> SidebarItem {
        SidebarItem {
            label: label.to_string(),
            link: None,
            slug: None,
            items: Some(items),
        }
    }

    fn sample() -> Vec<SidebarItem> {
        vec![
            section(
                "Guides",
                vec![
                    leaf("Setup", "guides/setup"),
                    section("Advanced", vec![leaf("Performance tuning", "guides/advanced/tuning")]),
                    link("Status", "/go/abc"),
                ],
            ),
            section("Reference", vec![]),
        ]
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn format_index_pads_to_three_digits() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(999), "999");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly ten", 11), "exactly ten");
        assert_eq!(truncate("héllo wörld again", 11), "héllo wörld...");
        assert_eq!(truncate("", 5), "");
    }

    #[test]
    fn entry_header_variants() {
        assert_eq!(entry_header(1, &leaf("Setup", "guides/setup")), "001 Setup → guides/setup");
        assert_eq!(entry_header(2, &link("Status", "/go/x")), "002 Status → /go/x");
        assert_eq!(
            entry_header(3, &section("Empty", vec![])),
            "003 Empty (0 entries)"
        );
        assert_eq!(
            entry_header(4, &section("One", vec![leaf("a", "a")])),
            "004 One (1 entry)"
        );
    }

    // =========================================================================
    // Sidebar
    // =========================================================================

    #[test]
    fn count_tree_counts_nested_sections() {
        assert_eq!(count_tree(&sample()), (3, 3));
        assert_eq!(count_tree(&[]), (0, 0));
    }

    #[test]
    fn sidebar_outline() {
        assert_eq!(
            format_sidebar_outline(&sample()),
            vec![
                "Sidebar",
                "001 Guides (3 entries)",
                "    001 Setup → guides/setup",
                "    002 Advanced (1 entry)",
                "        001 Performance tuning → guides/advanced/tuning",
                "    003 Status → /go/abc",
                "002 Reference (0 entries)",
                "",
                "3 sections, 3 entries",
            ]
        );
    }

    #[test]
    fn sidebar_written_summary() {
        let lines = format_sidebar_written(&sample(), Path::new(".docs-nav/sidebar.json"));
        assert_eq!(lines, vec!["Wrote 3 sections, 3 entries → .docs-nav/sidebar.json"]);
    }

    // =========================================================================
    // Search
    // =========================================================================

    #[test]
    fn records_written_summary() {
        assert_eq!(
            format_records_written(1, Path::new("search.json")),
            vec!["Wrote 1 record → search.json"]
        );
    }

    #[test]
    fn search_results_with_excerpt_preview() {
        let results = vec![
            SearchRecord {
                title: "Setup".to_string(),
                slug: "/docs/guides/setup".to_string(),
                excerpt: "Install the toolchain and clone the repository before running anything else."
                    .to_string(),
            },
            SearchRecord {
                title: "Blank".to_string(),
                slug: "/docs/blank".to_string(),
                excerpt: String::new(),
            },
        ];
        assert_eq!(
            format_search_results(&results),
            vec![
                "001 Setup",
                "    /docs/guides/setup",
                "    Install the toolchain and clone the repository before runnin...",
                "002 Blank",
                "    /docs/blank",
            ]
        );
    }

    #[test]
    fn no_results() {
        assert_eq!(format_search_results(&[]), vec!["No results"]);
    }
}
