//! Project lifecycle orchestration
//!
//! Every capture follows the same path: create the project in the `uploading`
//! state, run the capture, merge pages and inventory, then finalize. A hard
//! failure at any point removes whatever was written under the project prefix
//! together with its metadata, so no partial project survives.

use serde::Serialize;

use super::store::ProjectStore;
use super::types::{Page, Project, ProjectDetails, ProjectKind, ProjectStatus};
use crate::archive_ingest::ArchiveIngester;
use crate::config::{IngestConfig, MirrorConfig};
use crate::content_store::{ContentStore, StoredObject, asset_key};
use crate::errors::{CaptureError, CaptureResult, CaptureWarning};
use crate::image_mockups::{MockupUpload, ingest_images};
use crate::serve_resolver::resolve_for_serving;
use crate::site_mirror::{Fetcher, SiteMirror};
use crate::utils::join_relative;

const UNTITLED: &str = "Untitled project";

/// Finalized project plus the soft failures of its capture run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureReport {
    pub project: Project,
    pub warnings: Vec<CaptureWarning>,
}

/// What any capture hands back before it is merged into the project
struct Captured {
    pages: Vec<Page>,
    asset_keys: Vec<String>,
    warnings: Vec<CaptureWarning>,
    source_url: Option<String>,
}

pub struct ProjectService<C: ContentStore, P: ProjectStore> {
    content: C,
    projects: P,
    mirror_config: MirrorConfig,
    ingest_config: IngestConfig,
    fetcher: Fetcher,
}

impl<C: ContentStore, P: ProjectStore> ProjectService<C, P> {
    /// Build a service over the given stores.
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client for mirror runs cannot be constructed.
    pub fn new(
        content: C,
        projects: P,
        mirror_config: MirrorConfig,
        ingest_config: IngestConfig,
    ) -> anyhow::Result<Self> {
        let fetcher = Fetcher::new(&mirror_config)?;
        Ok(Self {
            content,
            projects,
            mirror_config,
            ingest_config,
            fetcher,
        })
    }

    #[must_use]
    pub fn content(&self) -> &C {
        &self.content
    }

    #[must_use]
    pub fn projects(&self) -> &P {
        &self.projects
    }

    /// Create a project in the `uploading` state. It is not listed until finalized.
    pub async fn create(&self, details: ProjectDetails, kind: ProjectKind) -> CaptureResult<Project> {
        let project = Project::new(details, kind);
        self.projects.set(&project).await?;
        log::debug!("Created {kind:?} project {}", project.id);
        Ok(project)
    }

    /// Ingest a zip archive as a new project
    pub async fn capture_archive(
        &self,
        details: ProjectDetails,
        archive: &[u8],
    ) -> CaptureResult<CaptureReport> {
        let project = self.create(details, ProjectKind::Archive).await?;
        let ingester = ArchiveIngester::new(&self.content, self.ingest_config.clone());

        let captured = ingester.ingest(&project.id, archive).await.and_then(|outcome| {
            if outcome.pages.is_empty() {
                return Err(CaptureError::MalformedInput(
                    "Archive contains no page with a renderable body".to_string(),
                ));
            }
            Ok(Captured {
                pages: outcome.pages,
                asset_keys: outcome.asset_keys,
                warnings: outcome.warnings,
                source_url: None,
            })
        });

        self.complete(project, captured).await
    }

    /// Mirror a live page as a new project
    pub async fn capture_mirror(
        &self,
        details: ProjectDetails,
        seed_url: &str,
    ) -> CaptureResult<CaptureReport> {
        let project = self.create(details, ProjectKind::Mirror).await?;
        let mirror = SiteMirror::with_fetcher(
            &self.content,
            self.mirror_config.clone(),
            self.fetcher.clone(),
        );

        let captured = mirror
            .mirror(&project.id, seed_url)
            .await
            .map(|outcome| Captured {
                pages: vec![outcome.page],
                asset_keys: outcome.asset_keys,
                warnings: outcome.warnings,
                source_url: Some(outcome.final_url.to_string()),
            });

        self.complete(project, captured).await
    }

    /// Store a set of image mockups as a new project
    pub async fn capture_images(
        &self,
        details: ProjectDetails,
        uploads: Vec<MockupUpload>,
    ) -> CaptureResult<CaptureReport> {
        let project = self.create(details, ProjectKind::Images).await?;

        let captured = ingest_images(
            &self.content,
            &project.id,
            uploads,
            self.ingest_config.upload_batch_size(),
        )
        .await
        .and_then(|outcome| {
            if outcome.pages.is_empty() {
                return Err(CaptureError::MalformedInput(
                    "No usable image uploads".to_string(),
                ));
            }
            Ok(Captured {
                pages: outcome.pages,
                asset_keys: outcome.asset_keys,
                warnings: outcome.warnings,
                source_url: None,
            })
        });

        self.complete(project, captured).await
    }

    /// Merge a capture into its project and finalize, or tear the project down
    async fn complete(
        &self,
        mut project: Project,
        captured: CaptureResult<Captured>,
    ) -> CaptureResult<CaptureReport> {
        let captured = match captured {
            Ok(captured) => captured,
            Err(e) => {
                log::warn!("Capture for project {} failed: {e}", project.id);
                self.discard(&project.id).await;
                return Err(e);
            }
        };

        if project.name.trim().is_empty() {
            project.name = captured
                .pages
                .first()
                .map_or_else(|| UNTITLED.to_string(), |page| page.name.clone());
        }
        project.pages = captured.pages;
        project.merge_asset_keys(captured.asset_keys);
        project.source_url = captured.source_url;
        project.warnings = captured.warnings.clone();
        project.touch();

        if let Err(e) = self.projects.set(&project).await {
            self.discard(&project.id).await;
            return Err(e.into());
        }

        match self.finalize(&project.id).await {
            Ok(project) => Ok(CaptureReport {
                project,
                warnings: captured.warnings,
            }),
            Err(e) => {
                self.discard(&project.id).await;
                Err(e)
            }
        }
    }

    /// Mark a project `ready` and append it to the listing index
    pub async fn finalize(&self, id: &str) -> CaptureResult<Project> {
        let mut project = self.get(id).await?;
        project.status = ProjectStatus::Ready;
        project.touch();
        self.projects.set(&project).await?;
        self.projects.append_index(id).await?;

        log::info!(
            "Project {id} ready: {} pages, {} objects",
            project.pages.len(),
            project.asset_keys.len()
        );
        Ok(project)
    }

    /// Best-effort removal of every object and the metadata of a failed project
    async fn discard(&self, id: &str) {
        match self.content.list(id).await {
            Ok(keys) => {
                for key in keys {
                    if let Err(e) = self.content.delete(&key).await {
                        log::error!("Failed to delete {key} while discarding {id}: {e}");
                    }
                }
            }
            Err(e) => log::error!("Failed to list objects of discarded project {id}: {e}"),
        }
        if let Err(e) = self.projects.remove(id).await {
            log::error!("Failed to remove metadata of discarded project {id}: {e}");
        }
    }

    /// Finalized projects in listing order
    pub async fn list(&self) -> CaptureResult<Vec<Project>> {
        let mut listed = Vec::new();
        for id in self.projects.list_index().await? {
            match self.projects.get(&id).await? {
                Some(project) if project.status == ProjectStatus::Ready => listed.push(project),
                Some(_) => {}
                None => log::warn!("Index lists missing project {id}"),
            }
        }
        Ok(listed)
    }

    pub async fn get(&self, id: &str) -> CaptureResult<Project> {
        self.projects
            .get(id)
            .await?
            .ok_or_else(|| CaptureError::NotFound(format!("project {id}")))
    }

    /// Stored bytes and content type of one project object
    pub async fn read_asset(&self, id: &str, path: &str) -> CaptureResult<StoredObject> {
        let project = self.get(id).await?;
        let path = join_relative("", path)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| CaptureError::NotFound(format!("asset {path}")))?;

        self.content
            .read_with_metadata(&asset_key(&project.id, &path))
            .await?
            .ok_or_else(|| CaptureError::NotFound(format!("asset {id}/{path}")))
    }

    /// A stored page with its references rewritten against `api_base`
    pub async fn render_page(&self, id: &str, path: &str, api_base: &str) -> CaptureResult<String> {
        let project = self.get(id).await?;
        resolve_for_serving(&self.content, &project, path, api_base).await
    }
}
