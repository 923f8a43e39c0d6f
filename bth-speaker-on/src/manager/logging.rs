/*!
 * Logging Decorator
 * Wraps any device manager and traces every call without altering results
 */

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::{keepalive, DeviceManager};
use crate::device::{ConnectionStatus, Device};
use crate::error::Result;

pub struct LoggingManager<M> {
    inner: M,
}

impl<M: DeviceManager> LoggingManager<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> M {
        self.inner
    }
}

fn count(devices: &[Device], status: ConnectionStatus) -> usize {
    devices.iter().filter(|d| d.status == status).count()
}

#[async_trait]
impl<M: DeviceManager> DeviceManager for LoggingManager<M> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn devices(&self) -> Result<Vec<Device>> {
        info!("[{}] devices: querying", self.name());
        let started = Instant::now();
        let result = self.inner.devices().await;
        let took = started.elapsed();

        match &result {
            Ok(devices) => info!(
                "[{}] devices: {} found ({} connected, {} disconnected, {} unknown) in {:?}",
                self.name(),
                devices.len(),
                count(devices, ConnectionStatus::Connected),
                count(devices, ConnectionStatus::Disconnected),
                count(devices, ConnectionStatus::Unknown),
                took
            ),
            Err(e) => warn!("[{}] devices: failed after {:?}: {}", self.name(), took, e),
        }
        result
    }

    async fn connect(&self, device: &Device) -> Result<()> {
        info!("[{}] connect: {}", self.name(), device);
        let started = Instant::now();
        let result = self.inner.connect(device).await;
        let took = started.elapsed();

        match &result {
            Ok(()) => info!("[{}] connect: {} done in {:?}", self.name(), device, took),
            Err(e) => warn!("[{}] connect: {} failed after {:?}: {}", self.name(), device, took, e),
        }
        result
    }

    /// Runs the loop through this wrapper so per-tick calls are traced too.
    async fn start(&self, shutdown: CancellationToken, interval: Duration) -> Result<()> {
        info!("[{}] start: polling every {:?}", self.name(), interval);
        let result = keepalive::run(self, &shutdown, interval).await;
        match &result {
            Ok(()) => info!("[{}] start: stopped", self.name()),
            Err(e) => error!("[{}] start: aborted: {}", self.name(), e),
        }
        result
    }
}
