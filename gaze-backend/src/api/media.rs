//! Video and image serving
//!
//! Files are streamed through `tower_http::services::ServeFile`, which handles
//! HEAD, `Range` and conditional requests.

use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::path::PathBuf;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, warn};

use super::cors::media_preflight;
use crate::assets::{is_regular_file, Asset};
use crate::codec;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const VIDEO_MIME: &str = "video/mp4";

/// Image types the viewer may request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Webp,
    Gif,
    Heic,
    Heif,
}

impl ImageKind {
    /// Match a file extension, ignoring case
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            "heic" => Some(Self::Heic),
            "heif" => Some(Self::Heif),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
            Self::Heic => "image/heic",
            Self::Heif => "image/heif",
        }
    }

    /// Needs transcoding for most browsers
    pub fn is_heif_family(self) -> bool {
        matches!(self, Self::Heic | Self::Heif)
    }
}

/// GET/HEAD /api/video
pub async fn serve_video(State(state): State<AppState>, req: Request) -> ApiResult<Response> {
    let path = state.assets.require(Asset::Video).await?;
    serve_file(path, VIDEO_MIME, req).await
}

/// GET/HEAD /api/quickview
pub async fn serve_quickview(State(state): State<AppState>, req: Request) -> ApiResult<Response> {
    let path = state.assets.require(Asset::QuickView).await?;
    serve_file(path, VIDEO_MIME, req).await
}

/// GET /api/image/*filename
///
/// Only the base name of `filename` is used. HEIC/HEIF images are converted to
/// JPEG when a decoder is installed; if conversion fails the original bytes
/// are sent instead.
pub async fn serve_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    req: Request,
) -> ApiResult<Response> {
    let not_found = || ApiError::NotFound("Image not found".to_string());
    let path = state.assets.image_path(&filename).ok_or_else(not_found)?;
    if !is_regular_file(&path).await {
        return Err(not_found());
    }

    let kind = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(ImageKind::from_extension)
        .ok_or_else(|| ApiError::BadRequest("Unsupported image type".to_string()))?;

    if kind.is_heif_family() {
        if let Some(decoder) = state.heic.clone() {
            let source = path.clone();
            let converted =
                tokio::task::spawn_blocking(move || codec::transcode_to_jpeg(decoder.as_ref(), &source))
                    .await;
            match converted {
                Ok(Ok(jpeg)) => {
                    debug!("Transcoded {} to JPEG ({} bytes)", path.display(), jpeg.len());
                    return Ok(([(header::CONTENT_TYPE, "image/jpeg")], jpeg).into_response());
                }
                Ok(Err(e)) => {
                    warn!("HEIC transcode failed for {}: {}; sending original", path.display(), e)
                }
                Err(e) => {
                    warn!("HEIC transcode task failed for {}: {}; sending original", path.display(), e)
                }
            }
        }
    }

    serve_file(path, kind.mime(), req).await
}

/// Stream `path` with a fixed content type
async fn serve_file(path: PathBuf, mime: &'static str, req: Request) -> ApiResult<Response> {
    let response = ServeFile::new(&path)
        .oneshot(req)
        .await
        .unwrap_or_else(|never| match never {});

    match response.status() {
        StatusCode::NOT_FOUND => {
            return Err(ApiError::NotFound(format!("{} not found", display_name(&path))))
        }
        StatusCode::INTERNAL_SERVER_ERROR => {
            return Err(ApiError::Internal(format!("Failed to read {}", display_name(&path))))
        }
        _ => {}
    }

    let mut response = response.map(Body::new);
    let success = response.status().is_success();
    let headers = response.headers_mut();
    if success {
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(mime));
    }
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    Ok(response)
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Build media routes
pub fn media_routes() -> Router<AppState> {
    Router::new()
        .route("/api/video", get(serve_video).options(media_preflight))
        .route("/api/quickview", get(serve_quickview).options(media_preflight))
        .route("/api/image/*filename", get(serve_image))
}
