//! HTTP API handlers for gaze-backend

pub mod cors;
pub mod gaze;
pub mod health;
pub mod media;
pub mod summary;
pub mod tables;

pub use gaze::gaze_routes;
pub use health::health_routes;
pub use media::media_routes;
pub use summary::summary_routes;
pub use tables::table_routes;
