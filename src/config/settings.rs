//! Application settings and paths.
//!
//! Settings live in `settings.json` inside the XDG configuration directory
//! (`~/.config/salmap` on Linux). A missing file means defaults.

use crate::error::{ConfigError, ConfigResult};
use crate::scanner::{
    ScanOptions, DEFAULT_LIVENESS_TIMEOUT, DEFAULT_POOL_WIDTH, DEFAULT_PROBE_TIMEOUT,
};
use crate::types::PortSet;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/salmap)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the configuration directory. Nothing is created on disk.
    pub fn discover() -> ConfigResult<Self> {
        let project =
            ProjectDirs::from("com", "salmap", "salmap").ok_or(ConfigError::DirectoryNotFound)?;
        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Maximum probes in flight during a scan.
    pub pool_width: usize,
    /// Per-port reply timeout in milliseconds.
    pub probe_timeout_ms: u64,
    /// Echo reply timeout in milliseconds.
    pub liveness_timeout_ms: u64,
    /// Interface whose address is used as the probe source.
    pub interface: Option<String>,
    /// Port specification used when none is given on the command line.
    pub default_ports: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pool_width: DEFAULT_POOL_WIDTH,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT.as_millis() as u64,
            liveness_timeout_ms: DEFAULT_LIVENESS_TIMEOUT.as_millis() as u64,
            interface: None,
            default_ports: PortSet::common().to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from the default location when `None`.
    ///
    /// An explicit path must exist; the default file may be absent.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let settings = match path {
            Some(path) => Self::load_from(path)?,
            None => {
                let file = Paths::discover()?.settings_file();
                if file.exists() {
                    Self::load_from(&file)?
                } else {
                    Self::default()
                }
            }
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    /// Reject values that would make scanning impossible.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.pool_width == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pool_width",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.probe_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "probe_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.liveness_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "liveness_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if let Err(e) = self.default_ports.parse::<PortSet>() {
            return Err(ConfigError::InvalidValue {
                field: "default_ports",
                reason: e.to_string(),
            });
        }
        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.liveness_timeout_ms)
    }

    /// Scan options derived from these settings.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::default()
            .with_pool_width(self.pool_width)
            .with_probe_timeout(self.probe_timeout())
    }
}
