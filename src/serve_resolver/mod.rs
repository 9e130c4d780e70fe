//! Serve-time reference resolution
//!
//! Stored pages keep the references they were captured with. On every page
//! read those references are rewritten into URLs the API can answer: asset
//! references go to the asset endpoint and `.html`/`.htm` references go to the
//! page endpoint, so navigation stays inside the rewriting system.

use std::collections::{HashMap, HashSet};

use crate::content_store::{ContentStore, asset_key, relative_path};
use crate::errors::{CaptureError, CaptureResult};
use crate::link_rewriter::{LinkRewriter, Reference, Replacement, RewriteMode, SkipPolicy};
use crate::project::Project;
use crate::utils::{extension_of, file_name_of, join_relative, parent_dir};

/// Lookup from reference text to project-relative path, built from an asset inventory
#[derive(Debug, Default)]
pub struct AssetLookup {
    paths: HashSet<String>,
    /// Bare filename to the first inventory path carrying it
    by_name: HashMap<String, String>,
}

impl AssetLookup {
    #[must_use]
    pub fn from_inventory(project_id: &str, asset_keys: &[String]) -> Self {
        let mut lookup = Self::default();
        for key in asset_keys {
            let Some(rel) = relative_path(project_id, key) else {
                log::warn!("Asset key {key} is outside project {project_id}");
                continue;
            };
            lookup
                .by_name
                .entry(file_name_of(rel).to_string())
                .or_insert_with(|| rel.to_string());
            lookup.paths.insert(rel.to_string());
        }
        lookup
    }

    /// Resolve a reference path (no query or fragment) seen on a page in `page_dir`.
    ///
    /// Precedence: exact path relative to the page, the same path taken from the
    /// project root, the filename within the page's directory, then the bare
    /// filename anywhere in the project.
    #[must_use]
    pub fn resolve(&self, page_dir: &str, reference: &str) -> Option<&str> {
        if let Some(found) = self.resolve_exact(page_dir, reference) {
            return Some(found);
        }
        match urlencoding::decode(reference) {
            Ok(decoded) if decoded != reference => self.resolve_exact(page_dir, &decoded),
            _ => None,
        }
    }

    fn resolve_exact(&self, page_dir: &str, reference: &str) -> Option<&str> {
        let candidates = [
            join_relative(page_dir, reference),
            join_relative("", reference),
        ];
        for candidate in candidates.into_iter().flatten() {
            if let Some(found) = self.paths.get(&candidate) {
                return Some(found.as_str());
            }
        }

        let name = file_name_of(reference);
        if name.is_empty() {
            return None;
        }
        let qualified = if page_dir.is_empty() {
            name.to_string()
        } else {
            format!("{page_dir}/{name}")
        };
        self.paths
            .get(&qualified)
            .map(String::as_str)
            .or_else(|| self.by_name.get(name).map(String::as_str))
    }
}

/// Encode each path segment for use in an API URL
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_page_reference(path: &str) -> bool {
    extension_of(path).is_some_and(|ext| ext == "html" || ext == "htm")
}

/// Rewrite the references of a stored page for serving.
///
/// Absolute, protocol-relative, `data:`, `mailto:`, `tel:` and fragment-only
/// references are left alone, as is anything the inventory cannot resolve.
#[must_use]
pub fn rewrite_for_serving(
    html: &str,
    project_id: &str,
    page_path: &str,
    lookup: &AssetLookup,
    api_base: &str,
) -> String {
    let api_base = api_base.trim_end_matches('/');
    let page_dir = parent_dir(page_path);
    let rewriter = LinkRewriter::new(RewriteMode::Html).with_policy(SkipPolicy::PassThroughAbsolute);

    let (rewritten, count) = rewriter.rewrite(html, |reference: &Reference<'_>| {
        let path = reference.path();
        if path.is_empty() {
            return None;
        }

        if is_page_reference(path) {
            let target = join_relative(page_dir, path)?;
            return Some(Replacement::keep_query(format!(
                "{api_base}/page/{project_id}/{}",
                encode_path(&target)
            )));
        }

        let target = lookup.resolve(page_dir, path)?;
        Some(Replacement::keep_query(format!(
            "{api_base}/asset/{project_id}/{}",
            encode_path(target)
        )))
    });

    log::debug!("Rewrote {count} references in {project_id}/{page_path}");
    rewritten
}

/// Load a stored page and rewrite it for serving.
///
/// # Errors
///
/// Returns `NotFound` when the page is not stored under the project, and
/// `Storage` when the store cannot be read.
pub async fn resolve_for_serving<S: ContentStore>(
    store: &S,
    project: &Project,
    page_path: &str,
    api_base: &str,
) -> CaptureResult<String> {
    let page_path = join_relative("", page_path)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| CaptureError::NotFound(format!("page {page_path}")))?;

    let key = asset_key(&project.id, &page_path);
    let bytes = store
        .read(&key)
        .await?
        .ok_or_else(|| CaptureError::NotFound(format!("page {key}")))?;
    let html = String::from_utf8_lossy(&bytes);

    let lookup = AssetLookup::from_inventory(&project.id, &project.asset_keys);
    Ok(rewrite_for_serving(
        &html,
        &project.id,
        &page_path,
        &lookup,
        api_base,
    ))
}
