//! Configuration loading and data root resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (both handled by the binary's clap parser)
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5000;

/// Default bind address
pub const DEFAULT_BIND: &str = "0.0.0.0";

/// Name of the preferred data directory under the base directory
pub const DATA_DIR_NAME: &str = "data";

/// Settings read from a TOML config file
///
/// Every field is optional; missing fields fall through to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub base_dir: Option<PathBuf>,
    pub cors_any: Option<bool>,
    pub gaze_errors_as_ok: Option<bool>,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Invalid config file {}: {}", path.display(), e))
        })
    }

    /// Load the config file if one is available
    ///
    /// An explicitly requested file must exist and parse. The platform default
    /// location (`<config dir>/gaze-review/config.toml`) is optional: a missing
    /// file yields defaults, a broken one is logged and ignored.
    pub fn load_optional(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            info!("Loading config file {}", path.display());
            return Self::load(path);
        }

        let Some(path) = default_config_path() else {
            debug!("No platform config directory; using defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            debug!("No config file at {}; using defaults", path.display());
            return Ok(Self::default());
        }

        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded config file {}", path.display());
                Ok(config)
            }
            Err(e) => {
                warn!("{}; continuing with defaults", e);
                Ok(Self::default())
            }
        }
    }
}

/// Settings supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub base_dir: Option<PathBuf>,
    pub cors_any: Option<bool>,
    pub gaze_errors_as_ok: Option<bool>,
}

/// Process-wide backend configuration
///
/// Constructed once at startup and handed to every request handler.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Directory every served asset and table is resolved from
    pub data_root: PathBuf,
    pub bind: String,
    pub port: u16,
    /// Emit `Access-Control-Allow-Origin: *` and preflight headers
    pub cors_any: bool,
    /// Report gaze decode failures as 200 with an `error` field
    pub gaze_errors_as_ok: bool,
}

impl BackendConfig {
    /// Merge overrides, file settings and defaults
    pub fn resolve(overrides: ConfigOverrides, file: TomlConfig) -> Result<Self> {
        let base_dir = match overrides.base_dir.or(file.base_dir) {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };

        Ok(Self {
            data_root: resolve_data_root(&base_dir),
            bind: overrides
                .bind
                .or(file.bind)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            port: overrides.port.or(file.port).unwrap_or(DEFAULT_PORT),
            cors_any: overrides.cors_any.or(file.cors_any).unwrap_or(true),
            gaze_errors_as_ok: overrides
                .gaze_errors_as_ok
                .or(file.gaze_errors_as_ok)
                .unwrap_or(true),
        })
    }

    /// Configuration serving directly from `data_root` with default settings
    pub fn for_data_root(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            cors_any: true,
            gaze_errors_as_ok: true,
        }
    }

    /// Socket address to listen on
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid bind address {}: {}", self.bind, e)))
    }
}

/// Pick the data root under `base`
///
/// Prefers `<base>/data` when that directory exists, otherwise `base` itself.
pub fn resolve_data_root(base: &Path) -> PathBuf {
    let preferred = base.join(DATA_DIR_NAME);
    if preferred.is_dir() {
        preferred
    } else {
        base.to_path_buf()
    }
}

/// Platform default config file location
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("gaze-review").join("config.toml"))
}
