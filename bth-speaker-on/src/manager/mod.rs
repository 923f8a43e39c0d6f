/*!
 * Device Managers
 * One variant per host OS, all driven by the same keep-alive loop
 */

pub mod keepalive;
pub mod logging;

mod command;
#[cfg(test)]
pub(crate) mod testing;
#[cfg(target_os = "linux")]
pub mod linux;
pub mod macos;
pub mod windows;

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::device::Device;
use crate::error::{Error, Result};

pub use logging::LoggingManager;

/// Lists paired Bluetooth devices and reconnects the ones that dropped.
#[async_trait]
pub trait DeviceManager: Send + Sync {
    /// Short label of the backend, used in log events.
    fn name(&self) -> &'static str;

    /// Paired devices in the order the OS reports them.
    async fn devices(&self) -> Result<Vec<Device>>;

    /// Asks the OS to reconnect a single device.
    async fn connect(&self, device: &Device) -> Result<()>;

    /// Runs the keep-alive loop until `shutdown` is cancelled.
    async fn start(&self, shutdown: CancellationToken, interval: Duration) -> Result<()> {
        keepalive::run(self, &shutdown, interval).await
    }
}

#[async_trait]
impl<M: DeviceManager + ?Sized> DeviceManager for Box<M> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn devices(&self) -> Result<Vec<Device>> {
        (**self).devices().await
    }

    async fn connect(&self, device: &Device) -> Result<()> {
        (**self).connect(device).await
    }

    async fn start(&self, shutdown: CancellationToken, interval: Duration) -> Result<()> {
        (**self).start(shutdown, interval).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
    Windows,
}

impl Platform {
    /// Maps an OS identifier as reported by `std::env::consts::OS`.
    pub fn from_os(os: &str) -> Result<Self> {
        match os {
            "macos" | "darwin" => Ok(Platform::MacOs),
            "linux" => Ok(Platform::Linux),
            "windows" => Ok(Platform::Windows),
            other => Err(Error::UnknownPlatform(other.to_string())),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Platform::MacOs => "macos",
            Platform::Linux => "linux",
            Platform::Windows => "windows",
        };
        f.write_str(label)
    }
}

/// Builds the device manager for `platform`.
pub async fn create(platform: Platform) -> Result<Box<dyn DeviceManager>> {
    match platform {
        Platform::MacOs => Ok(Box::new(macos::BlueutilManager::new().await?)),
        Platform::Windows => Ok(Box::new(windows::PnpManager::new().await?)),
        #[cfg(target_os = "linux")]
        Platform::Linux => Ok(Box::new(linux::BluezManager::new().await?)),
        #[cfg(not(target_os = "linux"))]
        Platform::Linux => Err(Error::UnsupportedPlatform(platform)),
    }
}

/// Resolves an OS identifier and builds its manager. Nothing is constructed
/// for an unknown identifier.
pub async fn select(os: &str) -> Result<Box<dyn DeviceManager>> {
    let platform = Platform::from_os(os)?;
    tracing::debug!("Host platform resolved to {}", platform);
    create(platform).await
}
