//! Archive entry classification and page validation

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::utils::extension_of;
use crate::utils::mime::{is_asset_extension, is_page_extension};

static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("BUG: hardcoded selector 'body' is invalid"));

static BODY_START_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<body[\s>/]").expect("BUG: hardcoded body tag regex is invalid"));

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("BUG: hardcoded selector 'title' is invalid"));

/// What to do with one archive entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryClass {
    /// Metadata or tooling noise; skipped without a warning
    Ignored,
    /// `.html`/`.htm`, promoted only if its body has content
    CandidatePage,
    /// Allow-listed asset with its lowercased extension
    Asset(String),
    /// Anything else; dropped silently
    Unsupported,
}

/// Classify an archive entry by its archive-relative path.
///
/// Order matters: ignorable noise first, then pages, then the asset allow-list.
#[must_use]
pub fn classify_entry(path: &str, is_dir: bool) -> EntryClass {
    if is_dir || path.ends_with('/') {
        return EntryClass::Ignored;
    }

    let leaf = path.rsplit('/').next().unwrap_or(path);
    let noisy_segment = path
        .split('/')
        .any(|segment| segment == "__MACOSX" || segment == "node_modules");

    if leaf.starts_with("._") || leaf == ".DS_Store" || noisy_segment || path.ends_with(".map") {
        return EntryClass::Ignored;
    }

    match extension_of(path) {
        Some(ext) if is_page_extension(&ext) => EntryClass::CandidatePage,
        Some(ext) if is_asset_extension(&ext) => EntryClass::Asset(ext),
        _ => EntryClass::Unsupported,
    }
}

/// Whether the document has a `<body>` with non-whitespace inner content.
///
/// The body tag must appear in the source. The HTML parser synthesizes one for
/// shells without it, and those are not pages.
#[must_use]
pub fn has_renderable_body(html: &str) -> bool {
    if !BODY_START_TAG.is_match(html) {
        return false;
    }
    let document = Html::parse_document(html);
    document
        .select(&BODY_SELECTOR)
        .next()
        .is_some_and(|body| !body.inner_html().trim().is_empty())
}

/// Non-empty, trimmed text of the document `<title>`
#[must_use]
pub fn page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Display name for a page: its `<title>` when non-empty, otherwise the file stem
#[must_use]
pub fn page_display_name(html: &str, path: &str) -> String {
    page_title(html).unwrap_or_else(|| {
        let leaf = path.rsplit('/').next().unwrap_or(path);
        leaf.rsplit_once('.').map_or(leaf, |(stem, _)| stem).to_string()
    })
}
