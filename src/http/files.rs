//! Single-slot file upload and download.
//!
//! The slot remembers only the most recent upload. Concurrent uploads race
//! and the last one to finish wins; earlier files stay on disk but are no
//! longer served.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use axum::{
    extract::{
        multipart::{Multipart, MultipartError},
        Request, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::http::error::ApiError;
use crate::http::server::AppState;

/// Path of the most recently uploaded file.
#[derive(Debug, Default)]
pub struct UploadSlot {
    current: ArcSwapOption<PathBuf>,
}

impl UploadSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored path.
    pub fn store(&self, path: PathBuf) {
        self.current.store(Some(Arc::new(path)));
    }

    pub fn current(&self) -> Option<Arc<PathBuf>> {
        self.current.load_full()
    }
}

/// Keep only the final path component of a client-supplied file name.
fn sanitize_filename(raw: &str) -> Option<String> {
    let name = Path::new(raw).file_name()?.to_str()?;
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::bad_request(format!("Invalid multipart data: {}", e.body_text()))
    }
}

/// Store the multipart field `file` in the upload directory.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .and_then(sanitize_filename)
            .ok_or_else(|| ApiError::bad_request("Missing or invalid filename"))?;
        let path = state.config.uploads.directory.join(&filename);

        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to create {}: {}", path.display(), e)))?;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(multipart_error)?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| ApiError::internal(format!("Failed to write file: {}", e)))?;
        }
        file.flush()
            .await
            .map_err(|e| ApiError::internal(format!("Failed to write file: {}", e)))?;

        tracing::info!(filename = %filename, path = %path.display(), "File uploaded");
        state.uploads.store(path);
        return Ok(Json(json!({ "filename": filename })));
    }

    Err(ApiError::bad_request("Missing 'file' field"))
}

/// Serve the last uploaded file, or a message when there is none.
pub async fn download(State(state): State<AppState>, request: Request) -> Response {
    let Some(path) = state.uploads.current() else {
        return Json(json!({ "message": "No file uploaded" })).into_response();
    };

    let disposition = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| HeaderValue::from_str(&format!("attachment; filename=\"{}\"", name)).ok());

    let mut response = match ServeFile::new(path.as_path()).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(e) => return ApiError::internal(e.to_string()).into_response(),
    };
    if response.status().is_success() {
        if let Some(value) = disposition {
            response.headers_mut().insert(header::CONTENT_DISPOSITION, value);
        }
    }
    response
}
