use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use portal_engine::{EngineSettings, ServiceSettings};
use serde::{Deserialize, Serialize};

use super::logging::LogDestination;

pub(crate) const CONFIG_FILENAME: &str = "portal.ron";

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

/// Console settings, read from `portal.ron`. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct PortalConfig {
    pub base_url: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub max_download_mb: u64,
    pub download_dir: PathBuf,
    pub presence: bool,
    pub log_destination: LogDestination,
    /// Identifiers listed on the first page, relative to the upload root.
    pub files: Vec<String>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            connect_timeout_ms: 10_000,
            request_timeout_ms: 120_000,
            max_download_mb: 54,
            download_dir: PathBuf::from("downloads"),
            presence: true,
            log_destination: LogDestination::File,
            files: Vec::new(),
        }
    }
}

impl PortalConfig {
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            service: ServiceSettings {
                base_url: self.base_url.clone(),
                connect_timeout: Duration::from_millis(self.connect_timeout_ms),
                request_timeout: Duration::from_millis(self.request_timeout_ms),
                max_download_bytes: self.max_download_mb.saturating_mul(1024 * 1024),
            },
            download_dir: self.download_dir.clone(),
            presence: self.presence,
        }
    }
}

/// A missing file is not an error; the defaults apply.
pub(crate) fn load_config(path: &Path) -> Result<PortalConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(PortalConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
