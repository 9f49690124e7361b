//! Cross-origin support
//!
//! When `cors_any` is enabled every response carries
//! `Access-Control-Allow-Origin: *` (see [`crate::build_router`]) and OPTIONS
//! requests receive the allowed methods and headers.

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::AppState;

/// Request headers the viewer is allowed to send
pub const ALLOWED_HEADERS: &str = "Content-Type,Authorization";

/// Methods accepted by the media routes
pub const MEDIA_METHODS: &str = "GET,HEAD,OPTIONS";

/// Methods accepted by the patch routes
pub const PATCH_METHODS: &str = "POST,OPTIONS";

fn preflight(state: &AppState, methods: &'static str) -> Response {
    let mut response = StatusCode::OK.into_response();
    if state.config.cors_any {
        let headers = response.headers_mut();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(methods),
        );
    }
    response
}

/// OPTIONS /api/video, /api/quickview
pub async fn media_preflight(State(state): State<AppState>) -> Response {
    preflight(&state, MEDIA_METHODS)
}

/// OPTIONS /api/summary/importance, /api/summary/comments
pub async fn patch_preflight(State(state): State<AppState>) -> Response {
    preflight(&state, PATCH_METHODS)
}
