//! Route handlers
//!
//! Handlers are thin: they decode the request, call into `ProjectService`, and
//! let `ApiError` pick the status code.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::AppState;
use super::error::ApiError;
use crate::content_store::ContentStore;
use crate::image_mockups::MockupUpload;
use crate::project::{Project, ProjectDetails, ProjectStore};
use crate::utils::ASSET_CACHE_CONTROL;
use crate::utils::mime::HTML_CONTENT_TYPE;

type ApiResult<T> = Result<T, ApiError>;

/// JSON body of `POST /upload-url`
#[derive(Debug, Deserialize)]
pub struct UrlUpload {
    pub url: String,
    #[serde(flatten)]
    pub details: ProjectDetails,
}

pub async fn get_page<C, P>(
    State(state): State<Arc<AppState<C, P>>>,
    Path((project_id, path)): Path<(String, String)>,
) -> ApiResult<Response>
where
    C: ContentStore + 'static,
    P: ProjectStore + 'static,
{
    let html = state
        .service
        .render_page(&project_id, &path, &state.api_base)
        .await?;
    Ok(([(header::CONTENT_TYPE, HTML_CONTENT_TYPE)], html).into_response())
}

pub async fn get_asset<C, P>(
    State(state): State<Arc<AppState<C, P>>>,
    Path((project_id, path)): Path<(String, String)>,
) -> ApiResult<Response>
where
    C: ContentStore + 'static,
    P: ProjectStore + 'static,
{
    let object = state.service.read_asset(&project_id, &path).await?;
    Ok((
        [
            (header::CONTENT_TYPE, object.content_type),
            (header::CACHE_CONTROL, ASSET_CACHE_CONTROL.to_string()),
        ],
        object.bytes,
    )
        .into_response())
}

pub async fn upload_project<C, P>(
    State(state): State<Arc<AppState<C, P>>>,
    mut multipart: Multipart,
) -> ApiResult<Response>
where
    C: ContentStore + 'static,
    P: ProjectStore + 'static,
{
    let mut details = ProjectDetails::default();
    let mut archive: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => archive = Some(field.bytes().await.map_err(multipart_error)?.to_vec()),
            other => {
                let value = field.text().await.map_err(multipart_error)?;
                apply_detail(&mut details, other, value);
            }
        }
    }

    let archive = archive.ok_or_else(|| ApiError::bad_request("Missing 'file' field"))?;
    tracing::info!(bytes = archive.len(), name = %details.name, "archive upload");

    let report = state.service.capture_archive(details, &archive).await?;
    Ok((StatusCode::CREATED, Json(report)).into_response())
}

pub async fn upload_url<C, P>(
    State(state): State<Arc<AppState<C, P>>>,
    Json(body): Json<UrlUpload>,
) -> ApiResult<Response>
where
    C: ContentStore + 'static,
    P: ProjectStore + 'static,
{
    tracing::info!(url = %body.url, "mirror request");
    let report = state.service.capture_mirror(body.details, &body.url).await?;
    Ok((StatusCode::CREATED, Json(report)).into_response())
}

/// Image fields are named `{page}:{viewport}`; text fields carry project details
pub async fn upload_images<C, P>(
    State(state): State<Arc<AppState<C, P>>>,
    mut multipart: Multipart,
) -> ApiResult<Response>
where
    C: ContentStore + 'static,
    P: ProjectStore + 'static,
{
    let mut details = ProjectDetails::default();
    let mut uploads = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.rsplit_once(':') {
            Some((page_name, viewport)) => {
                let filename = field.file_name().unwrap_or("image").to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?.to_vec();
                uploads.push(MockupUpload {
                    page_name: page_name.to_string(),
                    viewport: viewport.to_string(),
                    filename,
                    bytes,
                });
            }
            None => {
                let value = field.text().await.map_err(multipart_error)?;
                apply_detail(&mut details, &name, value);
            }
        }
    }

    if uploads.is_empty() {
        return Err(ApiError::bad_request("No image fields in upload"));
    }
    tracing::info!(images = uploads.len(), name = %details.name, "image upload");

    let report = state.service.capture_images(details, uploads).await?;
    Ok((StatusCode::CREATED, Json(report)).into_response())
}

pub async fn list_projects<C, P>(
    State(state): State<Arc<AppState<C, P>>>,
) -> ApiResult<Json<Vec<Project>>>
where
    C: ContentStore + 'static,
    P: ProjectStore + 'static,
{
    Ok(Json(state.service.list().await?))
}

pub async fn get_project<C, P>(
    State(state): State<Arc<AppState<C, P>>>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<Project>>
where
    C: ContentStore + 'static,
    P: ProjectStore + 'static,
{
    Ok(Json(state.service.get(&project_id).await?))
}

pub async fn health() -> &'static str {
    "ok"
}

fn apply_detail(details: &mut ProjectDetails, field: &str, value: String) {
    match field {
        "name" => details.name = value,
        "clientName" => details.client_name = value,
        "description" => details.description = value,
        other => tracing::debug!(field = other, "ignoring unknown form field"),
    }
}

fn multipart_error(error: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::bad_request(format!("Invalid multipart body: {error}"))
}
