//! Gaze point endpoint

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::warn;

use crate::assets::Asset;
use crate::error::ApiError;
use crate::gaze::{self, GazeResponse};
use crate::AppState;

/// GET /api/gaze
///
/// A missing gaze file is not an error: the viewer just gets no points.
/// Decode failures are reported in the `error` field with status 200 unless
/// `gaze_errors_as_ok` is turned off, in which case they become a 500.
pub async fn get_gaze(State(state): State<AppState>) -> Response {
    let Some(path) = state.assets.locate(Asset::Gaze).await else {
        return Json(GazeResponse::empty()).into_response();
    };

    let decoded = tokio::task::spawn_blocking(move || gaze::load_gaze_file(&path))
        .await
        .map_err(ApiError::from)
        .and_then(|result| result.map_err(ApiError::from));

    match decoded {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            warn!("Gaze decode failed: {}", e);
            if state.config.gaze_errors_as_ok {
                Json(GazeResponse::failed(e.to_string())).into_response()
            } else {
                e.into_response()
            }
        }
    }
}

/// Build gaze routes
pub fn gaze_routes() -> Router<AppState> {
    Router::new().route("/api/gaze", get(get_gaze))
}
