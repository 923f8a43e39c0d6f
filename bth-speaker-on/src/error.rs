/*!
 * Error types for bth-speaker-on
 * Startup failures are fatal, per-cycle failures are logged and survived
 */

use thiserror::Error;

use crate::manager::Platform;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown host operating system: {0:?}")]
    UnknownPlatform(String),

    #[error("no device manager is built for {0} on this host")]
    UnsupportedPlatform(Platform),

    #[error("failed to initialize {backend}: {reason}")]
    Init { backend: &'static str, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("device query via {backend} failed: {reason}")]
    OsQuery { backend: &'static str, reason: String },

    #[error("failed to connect {device}: {reason}")]
    Connect { device: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Per-cycle errors the keep-alive loop survives.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::OsQuery { .. } | Error::Connect { .. })
    }
}
