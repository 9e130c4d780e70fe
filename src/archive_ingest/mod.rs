//! Archive ingestion
//!
//! Unpacks an uploaded zip one entry at a time, classifies each entry, and
//! writes pages and allow-listed assets under `{projectId}/{archive path}`.
//! Archive paths are used verbatim; no canonicalization happens here.

pub mod batch;
pub mod classify;

use std::collections::HashSet;
use std::io::{self, Cursor, Read};

use crate::config::IngestConfig;
use crate::content_store::{ContentStore, asset_key};
use crate::errors::{CaptureError, CaptureResult, CaptureWarning, SkipReason};
use crate::project::Page;
use crate::utils::mime::{HTML_CONTENT_TYPE, content_type_for, is_text_extension};

pub use batch::{BatchUploader, PendingWrite, UploadReport};
pub use classify::{EntryClass, classify_entry, has_renderable_body, page_display_name, page_title};

/// Result of ingesting one archive
#[derive(Debug, Default)]
pub struct IngestOutcome {
    /// Promoted pages, in archive order
    pub pages: Vec<Page>,
    /// Every key written, pages included, in archive order
    pub asset_keys: Vec<String>,
    pub warnings: Vec<CaptureWarning>,
}

/// Entry payload after classification and decoding
enum Prepared {
    Page { page: Page, write: PendingWrite },
    Asset(PendingWrite),
    Skip(Option<CaptureWarning>),
}

/// Archive ingester bound to a content store
pub struct ArchiveIngester<'a, S: ContentStore> {
    store: &'a S,
    config: IngestConfig,
}

impl<'a, S: ContentStore> ArchiveIngester<'a, S> {
    pub fn new(store: &'a S, config: IngestConfig) -> Self {
        Self { store, config }
    }

    /// Ingest a zip archive into `project_id`'s namespace.
    ///
    /// # Errors
    ///
    /// Returns `MalformedInput` when the archive itself cannot be opened.
    /// Individual bad entries are skipped and reported as warnings.
    pub async fn ingest(&self, project_id: &str, archive: &[u8]) -> CaptureResult<IngestOutcome> {
        let mut zip = zip::ZipArchive::new(Cursor::new(archive))
            .map_err(|e| CaptureError::MalformedInput(format!("Failed to open archive: {e}")))?;

        let mut uploader = BatchUploader::new(self.store, self.config.upload_batch_size());
        let mut pages = Vec::new();
        let mut warnings = Vec::new();

        log::info!("Ingesting archive with {} entries into {project_id}", zip.len());

        for index in 0..zip.len() {
            match self.prepare_entry(&mut zip, index, project_id) {
                Prepared::Page { page, write } => {
                    pages.push((page, write.key.clone()));
                    uploader.push(write).await;
                }
                Prepared::Asset(write) => uploader.push(write).await,
                Prepared::Skip(Some(warning)) => {
                    log::warn!("Skipping archive entry {warning}");
                    warnings.push(warning);
                }
                Prepared::Skip(None) => {}
            }
        }

        let report = uploader.finish().await;
        warnings.extend(report.warnings);

        // Pages whose write failed are not listed
        let written: HashSet<&str> = report.written.iter().map(String::as_str).collect();
        let pages: Vec<Page> = pages
            .into_iter()
            .filter(|(_, key)| written.contains(key.as_str()))
            .map(|(page, _)| page)
            .collect();

        log::info!(
            "Archive ingest for {project_id}: {} pages, {} objects, {} warnings",
            pages.len(),
            report.written.len(),
            warnings.len()
        );

        Ok(IngestOutcome {
            pages,
            asset_keys: report.written,
            warnings,
        })
    }

    /// Read, classify and decode one entry. Synchronous so no zip state lives across an await.
    fn prepare_entry(
        &self,
        zip: &mut zip::ZipArchive<Cursor<&[u8]>>,
        index: usize,
        project_id: &str,
    ) -> Prepared {
        let mut entry = match zip.by_index(index) {
            Ok(entry) => entry,
            Err(e) => {
                return Prepared::Skip(Some(CaptureWarning::new(
                    format!("entry #{index}"),
                    SkipReason::Decode(e.to_string()),
                )));
            }
        };

        let raw_name = entry.name().to_string();
        let Some(path) = entry
            .enclosed_name()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
        else {
            return Prepared::Skip(Some(CaptureWarning::new(
                raw_name,
                SkipReason::Rejected("path escapes archive root".to_string()),
            )));
        };

        let class = classify_entry(&path, entry.is_dir());
        if matches!(class, EntryClass::Ignored | EntryClass::Unsupported) {
            log::trace!("Dropping archive entry {path} ({class:?})");
            return Prepared::Skip(None);
        }

        if entry.size() > self.config.max_entry_bytes() {
            return Prepared::Skip(Some(CaptureWarning::new(
                path,
                SkipReason::TooLarge(entry.size()),
            )));
        }

        // The declared size can understate the inflated stream
        let max = self.config.max_entry_bytes();
        let bytes = match read_bounded(&mut entry, max) {
            Ok(bytes) if bytes.len() as u64 > max => {
                return Prepared::Skip(Some(CaptureWarning::new(
                    path,
                    SkipReason::TooLarge(bytes.len() as u64),
                )));
            }
            Ok(bytes) => bytes,
            Err(e) => {
                return Prepared::Skip(Some(CaptureWarning::new(
                    path,
                    SkipReason::Decode(e.to_string()),
                )));
            }
        };

        let key = asset_key(project_id, &path);
        match class {
            EntryClass::CandidatePage => {
                let html = match String::from_utf8(bytes) {
                    Ok(html) => html,
                    Err(e) => {
                        return Prepared::Skip(Some(CaptureWarning::new(
                            path,
                            SkipReason::Decode(e.to_string()),
                        )));
                    }
                };
                if !has_renderable_body(&html) {
                    return Prepared::Skip(Some(CaptureWarning::new(path, SkipReason::EmptyBody)));
                }
                let page = Page::markup(page_display_name(&html, &path), path.clone());
                Prepared::Page {
                    page,
                    write: PendingWrite {
                        item: path,
                        key,
                        bytes: html.into_bytes(),
                        content_type: HTML_CONTENT_TYPE.to_string(),
                    },
                }
            }
            EntryClass::Asset(ext) => {
                let bytes = if is_text_extension(&ext) {
                    match String::from_utf8(bytes) {
                        Ok(text) => text.into_bytes(),
                        Err(e) => {
                            return Prepared::Skip(Some(CaptureWarning::new(
                                path,
                                SkipReason::Decode(e.to_string()),
                            )));
                        }
                    }
                } else {
                    bytes
                };
                Prepared::Asset(PendingWrite {
                    item: path,
                    key,
                    bytes,
                    content_type: content_type_for(&ext).to_string(),
                })
            }
            EntryClass::Ignored | EntryClass::Unsupported => Prepared::Skip(None),
        }
    }
}

/// Read at most `max + 1` bytes, so a result longer than `max` marks an oversize entry.
fn read_bounded(reader: impl Read, max: u64) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader.take(max.saturating_add(1)).read_to_end(&mut bytes)?;
    Ok(bytes)
}
