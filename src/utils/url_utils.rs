//! URL and path manipulation utilities.
//!
//! This module provides functions for working with URLs and project-relative
//! paths in the context of capturing and serving mirrored content.

use anyhow::{Context, Result};
use url::Url;

/// Resolve a potentially relative URL against a base URL
///
/// The query is kept as written (`?v3` stays `?v3`). Only characters invalid in
/// a query, such as spaces and quotes, are percent-encoded by the parser.
pub fn resolve_url(base_url: &Url, url: &str) -> Result<Url> {
    base_url.join(url.trim()).context("Failed to resolve URL")
}

/// Check if a URL uses a protocol the mirror is allowed to fetch
#[must_use]
pub fn is_fetchable_url(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Lowercased extension of the last path segment, without the dot.
///
/// Query strings and fragments are ignored. Dotfiles (`.htaccess`) have no extension.
#[must_use]
pub fn extension_of(path: &str) -> Option<String> {
    let path = strip_suffix_part(path);
    let leaf = path.rsplit('/').next().unwrap_or(path);
    match leaf.rfind('.') {
        Some(0) | None => None,
        Some(idx) if idx + 1 < leaf.len() => Some(leaf[idx + 1..].to_ascii_lowercase()),
        Some(_) => None,
    }
}

/// Last segment of a slash-separated path.
#[must_use]
pub fn file_name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Directory part of a slash-separated path, without a trailing slash.
///
/// Returns an empty string for top-level paths.
#[must_use]
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Portion of a reference before any `?query` or `#fragment`.
#[must_use]
pub fn strip_suffix_part(reference: &str) -> &str {
    match reference.find(['?', '#']) {
        Some(idx) => &reference[..idx],
        None => reference,
    }
}

/// Join a relative reference onto a directory, collapsing `.` and `..` segments.
///
/// Leading `/` on the reference anchors it at the namespace root. Returns `None`
/// when `..` would climb above the root.
#[must_use]
pub fn join_relative(dir: &str, reference: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    let reference = if let Some(rooted) = reference.strip_prefix('/') {
        rooted
    } else {
        segments.extend(dir.split('/').filter(|s| !s.is_empty()));
        reference
    };

    for segment in reference.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }

    Some(segments.join("/"))
}

/// Relative path from the directory of `from_file` to `to_file`.
///
/// Both paths are slash-separated and relative to the same namespace root.
#[must_use]
pub fn relative_to(from_file: &str, to_file: &str) -> String {
    let from_dir: Vec<&str> = parent_dir(from_file).split('/').filter(|s| !s.is_empty()).collect();
    let to: Vec<&str> = to_file.split('/').collect();

    let common = from_dir
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();
    // Never consume the leaf of `to_file` as a shared directory
    let common = common.min(to.len().saturating_sub(1));

    let mut parts: Vec<&str> = std::iter::repeat_n("..", from_dir.len() - common).collect();
    parts.extend_from_slice(&to[common..]);
    parts.join("/")
}
