//! Image mockup ingestion
//!
//! Each upload names a page and a viewport. Uploads sharing a page name are
//! grouped into one `Page` with one `Variant` per viewport; the stored image
//! lands at `mockups/{page-slug}/{viewport}-{filename}`.

use std::collections::HashMap;

use crate::archive_ingest::{BatchUploader, PendingWrite};
use crate::content_store::{ContentStore, asset_key};
use crate::errors::{CaptureError, CaptureResult, CaptureWarning, SkipReason};
use crate::project::{Page, Variant, Viewport};
use crate::utils::extension_of;
use crate::utils::mime::{IMAGE_EXTENSIONS, content_type_for};

const MOCKUP_DIR: &str = "mockups";

/// One uploaded mockup image
#[derive(Debug, Clone)]
pub struct MockupUpload {
    pub page_name: String,
    /// Raw viewport label as submitted; validated during ingestion
    pub viewport: String,
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Result of ingesting a set of mockups
#[derive(Debug, Default)]
pub struct MockupOutcome {
    pub pages: Vec<Page>,
    pub asset_keys: Vec<String>,
    pub warnings: Vec<CaptureWarning>,
}

/// Lowercase, dash-separated form of a page name safe for a path segment
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() { "page".to_string() } else { slug }
}

/// Filename reduced to its last segment with unsafe characters replaced
fn safe_filename(filename: &str) -> String {
    let leaf = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    leaf.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect()
}

/// Store mockup images and build their pages.
///
/// Non-image files are skipped with a warning. A page only appears when at
/// least one of its variants was stored.
///
/// # Errors
///
/// Returns `MalformedInput` before anything is written when an upload names an
/// unknown viewport or no page.
pub async fn ingest_images<S: ContentStore>(
    store: &S,
    project_id: &str,
    uploads: Vec<MockupUpload>,
    batch_size: usize,
) -> CaptureResult<MockupOutcome> {
    let uploads = uploads
        .into_iter()
        .map(|upload| {
            if upload.page_name.trim().is_empty() {
                return Err(CaptureError::MalformedInput(format!(
                    "Upload '{}' has no page name",
                    upload.filename
                )));
            }
            let viewport = upload
                .viewport
                .parse::<Viewport>()
                .map_err(|reason| CaptureError::MalformedInput(format!("{}: {reason}", upload.filename)))?;
            Ok((viewport, upload))
        })
        .collect::<CaptureResult<Vec<_>>>()?;

    let mut uploader = BatchUploader::new(store, batch_size);
    let mut warnings = Vec::new();
    // (page name, viewport, variant, key) in submission order
    let mut staged: Vec<(String, Viewport, Variant, String)> = Vec::new();

    for (viewport, upload) in uploads {
        let filename = safe_filename(&upload.filename);
        let ext = match extension_of(&filename) {
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => ext,
            _ => {
                warnings.push(CaptureWarning::new(
                    upload.filename,
                    SkipReason::Rejected("not an image".to_string()),
                ));
                continue;
            }
        };

        let path = format!(
            "{MOCKUP_DIR}/{}/{}-{filename}",
            slugify(&upload.page_name),
            viewport.as_str()
        );
        let key = asset_key(project_id, &path);

        staged.push((
            upload.page_name.trim().to_string(),
            viewport,
            Variant {
                path,
                filename: upload.filename.clone(),
            },
            key.clone(),
        ));
        uploader
            .push(PendingWrite {
                item: upload.filename,
                key,
                bytes: upload.bytes,
                content_type: content_type_for(&ext).to_string(),
            })
            .await;
    }

    let report = uploader.finish().await;
    warnings.extend(report.warnings);

    let written: std::collections::HashSet<&str> =
        report.written.iter().map(String::as_str).collect();
    let mut pages: Vec<Page> = Vec::new();
    let mut page_index: HashMap<String, usize> = HashMap::new();

    for (name, viewport, variant, key) in staged {
        if !written.contains(key.as_str()) {
            continue;
        }
        let slug = slugify(&name);
        let idx = *page_index.entry(slug.clone()).or_insert_with(|| {
            pages.push(Page {
                name: name.clone(),
                path: format!("{MOCKUP_DIR}/{slug}"),
                variants: Default::default(),
            });
            pages.len() - 1
        });
        pages[idx].variants.insert(viewport, variant);
    }

    // Two uploads for the same page and viewport share a key; keep it once
    let mut seen = std::collections::HashSet::new();
    let asset_keys: Vec<String> = report
        .written
        .iter()
        .filter(|key| seen.insert(key.as_str()))
        .cloned()
        .collect();

    log::info!(
        "Mockup ingest for {project_id}: {} pages, {} images, {} warnings",
        pages.len(),
        asset_keys.len(),
        warnings.len()
    );

    Ok(MockupOutcome {
        pages,
        asset_keys,
        warnings,
    })
}
