use std::path::Path as FsPath;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use htmldisplay_core::{ActionId, ContentKind};
use htmldisplay_render::{Buffer, inject_client_script, rewrite_relative_paths};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::{safety, state::AppState};

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("Action not found or content not configured.")]
    NotFound,
    #[error("Access denied.")]
    Forbidden,
    #[error("Error reading file.")]
    Read(#[source] std::io::Error),
}

impl ViewError {
    fn status(&self) -> StatusCode {
        match self {
            ViewError::NotFound => StatusCode::NOT_FOUND,
            ViewError::Forbidden => StatusCode::FORBIDDEN,
            ViewError::Read(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

pub async fn view(
    Path(action_id): Path<ActionId>,
    State(state): State<AppState>,
) -> Result<Buffer, ViewError> {
    let record = state.content(&action_id).ok_or(ViewError::NotFound)?;

    let html = match record.kind {
        ContentKind::Direct => record.payload,
        ContentKind::File => {
            let path = FsPath::new(&record.payload);
            if !safety::is_path_safe(path).await {
                return Err(ViewError::Forbidden);
            }

            let bytes = tokio::fs::read(path).await.map_err(|error| {
                tracing::error!("failed to read {}: {error}", path.display());
                ViewError::Read(error)
            })?;

            let html = String::from_utf8_lossy(&bytes);
            rewrite_relative_paths(&html, &action_id).into_owned()
        }
    };

    Ok(inject_client_script(&html, &action_id))
}

pub async fn static_asset(
    Path((action_id, asset_path)): Path<(ActionId, String)>,
    State(state): State<AppState>,
) -> Result<Response, ViewError> {
    let record = state
        .content(&action_id)
        .filter(|record| record.is_file())
        .ok_or(ViewError::NotFound)?;
    let base_dir = record.base_dir().ok_or(ViewError::NotFound)?;

    let file_path = safety::resolve_static_asset(&asset_path, base_dir)
        .await
        .ok_or(ViewError::Forbidden)?;

    let file = File::open(&file_path).await.map_err(|error| {
        tracing::debug!("failed to open {}: {error}", file_path.display());
        ViewError::NotFound
    })?;

    let body = Body::from_stream(ReaderStream::new(file));

    Ok(([(header::CONTENT_TYPE, mime_type(&file_path))], body).into_response())
}

fn mime_type(path: &FsPath) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| match ext.to_ascii_lowercase().as_str() {
            "htm" | "html" => Some("text/html; charset=utf-8"),
            "css" => Some("text/css; charset=utf-8"),
            "js" | "mjs" | "cjs" => Some("text/javascript; charset=utf-8"),
            "json" => Some("application/json"),
            "txt" => Some("text/plain; charset=utf-8"),
            "png" => Some("image/png"),
            "jpg" | "jpeg" => Some("image/jpeg"),
            "gif" => Some("image/gif"),
            "svg" => Some("image/svg+xml"),
            "webp" => Some("image/webp"),
            "ico" => Some("image/x-icon"),
            "woff" => Some("font/woff"),
            "woff2" => Some("font/woff2"),
            _ => None,
        })
        .unwrap_or("application/octet-stream")
}
