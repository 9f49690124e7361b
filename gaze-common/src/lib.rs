//! # Gaze Review Common Library
//!
//! Shared code for the gaze-review backend:
//! - Configuration loading and data root resolution
//! - Common error type

pub mod config;
pub mod error;

pub use config::BackendConfig;
pub use error::{Error, Result};
