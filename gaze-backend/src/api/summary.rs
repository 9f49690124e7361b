//! Summary table patch endpoints

use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use serde::Serialize;
use tracing::info;

use super::cors::patch_preflight;
use crate::assets::Asset;
use crate::csv_patch::{self, PatchColumn, PatchRequest};
use crate::error::ApiResult;
use crate::AppState;

/// Patch response
#[derive(Debug, Serialize)]
pub struct PatchResponse {
    pub status: String,
    /// Distinct data rows written
    pub updated: usize,
}

/// POST /api/summary/importance
///
/// **Request:** `{"updates": [{"rowIndex": 0, "importance": "high"}, ...]}`
pub async fn update_importance(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<PatchResponse>> {
    patch_summary(&state, PatchColumn::Importance, &body).await
}

/// POST /api/summary/comments
///
/// **Request:** `{"updates": [{"rowIndex": 0, "comment": "..."}, ...]}`
pub async fn update_comments(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<PatchResponse>> {
    patch_summary(&state, PatchColumn::Comments, &body).await
}

/// Validate the payload, then read-modify-write the summary under its file lock
///
/// **Errors:**
/// - 404: `summaryv3.csv` missing
/// - 400: malformed payload, or the CSV has no header row
/// - 500: read/write failure
async fn patch_summary(
    state: &AppState,
    column: PatchColumn,
    body: &[u8],
) -> ApiResult<Json<PatchResponse>> {
    let path = state.assets.require(Asset::SummaryPatchTarget).await?;
    let request = PatchRequest::from_body(body, column)?;

    let guard = state.file_locks.acquire(&path).await;
    let target = path.clone();
    // The guard moves into the blocking task: a dropped request must not
    // release the lock while its write is still in flight.
    let outcome = tokio::task::spawn_blocking(move || {
        let _guard = guard;
        csv_patch::apply_patch(&target, column, &request.updates)
    })
    .await??;

    info!(
        "Patched {} column of {}: {} row(s){}",
        column.header_name(),
        path.display(),
        outcome.updated,
        if outcome.column_added { ", column added" } else { "" }
    );

    Ok(Json(PatchResponse {
        status: "ok".to_string(),
        updated: outcome.updated,
    }))
}

/// Build patch routes
pub fn summary_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/summary/importance",
            post(update_importance).options(patch_preflight),
        )
        .route(
            "/api/summary/comments",
            post(update_comments).options(patch_preflight),
        )
}
