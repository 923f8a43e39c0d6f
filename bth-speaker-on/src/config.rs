use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_UP_INTERVAL_SECS: u64 = 5;
/// Upper bound on the poll interval: one day.
pub const MAX_UP_INTERVAL_SECS: u64 = 86_400;
pub const LOG_FILE_NAME: &str = "bth-speaker-on.log";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub keepalive: KeepAliveConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct KeepAliveConfig {
    /// Seconds between device checks.
    pub up_interval: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: PathBuf,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            up_interval: DEFAULT_UP_INTERVAL_SECS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: std::env::temp_dir().join(LOG_FILE_NAME),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path` when given, otherwise falls back to the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Command-line values take precedence over the file.
    pub fn with_up_interval(mut self, secs: Option<u64>) -> Result<Self> {
        if let Some(secs) = secs {
            self.keepalive.up_interval = secs;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.keepalive.up_interval == 0 {
            return Err(Error::Config("up_interval must be at least 1 second".into()));
        }
        if self.keepalive.up_interval > MAX_UP_INTERVAL_SECS {
            return Err(Error::Config(format!(
                "up_interval must be at most {} seconds, got {}",
                MAX_UP_INTERVAL_SECS, self.keepalive.up_interval
            )));
        }
        if self.logging.file.as_os_str().is_empty() {
            return Err(Error::Config("logging.file must not be empty".into()));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn up_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive.up_interval)
    }
}
