//! gaze-backend library
//!
//! Local HTTP backend for the gaze review viewer: streams the session video,
//! decodes gaze points, serves annotation tables and applies importance/comment
//! edits to the summary table.

use axum::http::{header, HeaderValue};
use axum::Router;
use gaze_common::BackendConfig;
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod assets;
pub mod codec;
pub mod csv_patch;
pub mod error;
pub mod gaze;

pub use crate::error::{ApiError, ApiResult};

use crate::assets::AssetResolver;
use crate::codec::HeicDecoder;
use crate::csv_patch::FileLocks;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Process configuration, fixed at startup
    pub config: Arc<BackendConfig>,
    /// Well-known file lookup under the data root
    pub assets: Arc<AssetResolver>,
    /// HEIC/HEIF decoder, when one is compiled in
    pub heic: Option<Arc<dyn HeicDecoder>>,
    /// Serializes patches to the same CSV file
    pub file_locks: FileLocks,
}

impl AppState {
    /// Create application state with the build's default HEIC decoder
    pub fn new(config: BackendConfig) -> Self {
        let assets = AssetResolver::new(config.data_root.clone());
        Self {
            config: Arc::new(config),
            assets: Arc::new(assets),
            heic: codec::default_decoder(),
            file_locks: FileLocks::new(),
        }
    }

    /// Replace the HEIC decoder (`None` disables transcoding)
    pub fn with_heic_decoder(mut self, decoder: Option<Arc<dyn HeicDecoder>>) -> Self {
        self.heic = decoder;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let cors_any = state.config.cors_any;

    let router = Router::new()
        .merge(api::health_routes())
        .merge(api::media_routes())
        .merge(api::table_routes())
        .merge(api::gaze_routes())
        .merge(api::summary_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_any {
        router.layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
    } else {
        router
    }
}
