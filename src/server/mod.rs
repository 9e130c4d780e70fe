//! HTTP surface
//!
//! | Route | Action |
//! |---|---|
//! | `GET /page/:project_id/*path` | page with references rewritten for serving |
//! | `GET /asset/:project_id/*path` | stored bytes with their content type |
//! | `POST /upload-project` | multipart archive upload |
//! | `POST /upload-url` | JSON mirror request |
//! | `POST /upload-images` | multipart image mockups |
//! | `GET /projects`, `GET /projects/:id` | project metadata |

pub mod error;
pub mod handlers;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::config::ServerConfig;
use crate::content_store::{ContentStore, FsContentStore};
use crate::project::{FsProjectStore, ProjectService, ProjectStore};
use crate::utils::MAX_UPLOAD_BYTES;

pub use error::ApiError;

/// Shared state handed to every handler
pub struct AppState<C: ContentStore, P: ProjectStore> {
    pub service: ProjectService<C, P>,
    /// Base URL for rewritten references, without a trailing slash
    pub api_base: String,
}

impl<C: ContentStore, P: ProjectStore> AppState<C, P> {
    pub fn new(service: ProjectService<C, P>, api_base: impl Into<String>) -> Self {
        Self {
            service,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Build the router over any store backends
pub fn router<C, P>(state: Arc<AppState<C, P>>) -> Router
where
    C: ContentStore + 'static,
    P: ProjectStore + 'static,
{
    Router::new()
        .route("/page/:project_id/*path", get(handlers::get_page::<C, P>))
        .route("/asset/:project_id/*path", get(handlers::get_asset::<C, P>))
        .route("/upload-project", post(handlers::upload_project::<C, P>))
        .route("/upload-url", post(handlers::upload_url::<C, P>))
        .route("/upload-images", post(handlers::upload_images::<C, P>))
        .route("/projects", get(handlers::list_projects::<C, P>))
        .route("/projects/:project_id", get(handlers::get_project::<C, P>))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Serve with filesystem-backed stores until the process is stopped
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(config.storage_dir())
        .await
        .with_context(|| format!("Failed to create {}", config.storage_dir().display()))?;

    let service = ProjectService::new(
        FsContentStore::new(config.storage_dir()),
        FsProjectStore::new(config.storage_dir()),
        config.mirror().clone(),
        config.ingest().clone(),
    )?;
    let state = Arc::new(AppState::new(service, config.api_base()));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;

    tracing::info!(
        addr = config.bind_addr(),
        storage = %config.storage_dir().display(),
        api_base = %config.api_base(),
        "sitecapture listening"
    );

    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
