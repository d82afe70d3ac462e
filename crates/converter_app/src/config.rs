use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use converter_engine::ServiceSettings;
use converter_logging::converter_info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "converter.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {path:?} not found")]
    NotFound { path: PathBuf },
    #[error("failed to read config file {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config file {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Client settings read from `converter.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the conversion service; empty means the local backend.
    pub api_base: String,
    pub poll_interval_ms: u64,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub output_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            poll_interval_ms: 1000,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            output_dir: PathBuf::from("downloads"),
        }
    }
}

impl ClientConfig {
    /// Loads `explicit`, which must exist, or `./converter.ron` when present.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::read(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::read(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let config = ron::from_str(&text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        converter_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            // A zero interval would spin; keep at least a millisecond between polls.
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            output_dir: self.output_dir.clone(),
            ..ServiceSettings::default()
        }
    }
}
