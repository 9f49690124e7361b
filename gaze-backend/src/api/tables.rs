//! Verbatim text table endpoints
//!
//! Each route maps one well-known file to a MIME type. Content is passed
//! through unchanged.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::debug;

use crate::assets::Asset;
use crate::error::ApiResult;
use crate::AppState;

const CSV: &str = "text/csv; charset=utf-8";
const PLAIN: &str = "text/plain; charset=utf-8";
const MARKDOWN: &str = "text/markdown; charset=utf-8";

/// Read `asset` and return it with `mime`
async fn serve_text(state: &AppState, asset: Asset, mime: &'static str) -> ApiResult<Response> {
    let path = state.assets.require(asset).await?;
    let text = tokio::fs::read_to_string(&path).await?;
    debug!("Serving {} ({} bytes)", path.display(), text.len());
    Ok(([(header::CONTENT_TYPE, mime)], text).into_response())
}

/// GET /api/summary
///
/// Newest summary version present wins.
pub async fn get_summary(State(state): State<AppState>) -> ApiResult<Response> {
    serve_text(&state, Asset::Summary, CSV).await
}

/// GET /api/summary_categories
pub async fn get_summary_categories(State(state): State<AppState>) -> ApiResult<Response> {
    serve_text(&state, Asset::SummaryCategories, CSV).await
}

/// GET /api/transcript
pub async fn get_transcript(State(state): State<AppState>) -> ApiResult<Response> {
    serve_text(&state, Asset::Transcript, PLAIN).await
}

/// GET /api/standing
pub async fn get_standing(State(state): State<AppState>) -> ApiResult<Response> {
    serve_text(&state, Asset::Standing, CSV).await
}

/// GET /api/quick_preview
pub async fn get_quick_preview(State(state): State<AppState>) -> ApiResult<Response> {
    serve_text(&state, Asset::QuickPreview, CSV).await
}

/// GET /api/surgical_role_transitions
pub async fn get_surgical_role_transitions(State(state): State<AppState>) -> ApiResult<Response> {
    serve_text(&state, Asset::SurgicalRoleTransitions, MARKDOWN).await
}

/// GET /api/phases
pub async fn get_phases(State(state): State<AppState>) -> ApiResult<Response> {
    serve_text(&state, Asset::Phases, CSV).await
}

/// Build table routes
pub fn table_routes() -> Router<AppState> {
    Router::new()
        .route("/api/summary", get(get_summary))
        .route("/api/summary_categories", get(get_summary_categories))
        .route("/api/transcript", get(get_transcript))
        .route("/api/standing", get(get_standing))
        .route("/api/quick_preview", get(get_quick_preview))
        .route("/api/surgical_role_transitions", get(get_surgical_role_transitions))
        .route("/api/phases", get(get_phases))
}
