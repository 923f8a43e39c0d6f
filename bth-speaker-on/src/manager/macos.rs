/*!
 * macOS Device Manager
 * Paired devices and reconnects through the blueutil command-line tool
 */

use async_trait::async_trait;
use serde::Deserialize;

use super::{command, DeviceManager};
use crate::device::{ConnectionStatus, Device};
use crate::error::{Error, Result};

const BACKEND: &str = "blueutil";

/// One entry of `blueutil --paired --format json`.
#[derive(Debug, Deserialize)]
struct PairedDevice {
    address: String,
    name: Option<String>,
    connected: Option<bool>,
}

pub fn parse_paired(json: &str) -> Result<Vec<Device>> {
    let paired: Vec<PairedDevice> = serde_json::from_str(json).map_err(|e| Error::OsQuery {
        backend: BACKEND,
        reason: format!("unexpected output: {}", e),
    })?;

    Ok(paired
        .into_iter()
        .map(|entry| {
            let device = Device::new(entry.address, ConnectionStatus::from(entry.connected));
            match entry.name {
                Some(name) if !name.is_empty() => device.with_name(name),
                _ => device,
            }
        })
        .collect())
}

pub struct BlueutilManager {
    program: String,
}

impl BlueutilManager {
    pub async fn new() -> Result<Self> {
        Self::with_program(BACKEND).await
    }

    pub async fn with_program(program: &str) -> Result<Self> {
        let version = command::output(program, &["--version"])
            .await
            .map_err(|reason| Error::Init {
                backend: BACKEND,
                reason,
            })?;
        tracing::info!("Using {} {}", program, version.trim());

        Ok(Self {
            program: program.to_string(),
        })
    }
}

#[async_trait]
impl DeviceManager for BlueutilManager {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn devices(&self) -> Result<Vec<Device>> {
        let json = command::output(&self.program, &["--paired", "--format", "json"])
            .await
            .map_err(|reason| Error::OsQuery {
                backend: BACKEND,
                reason,
            })?;
        parse_paired(&json)
    }

    async fn connect(&self, device: &Device) -> Result<()> {
        command::output(&self.program, &["--connect", device.id.as_str()])
            .await
            .map(|_| ())
            .map_err(|reason| Error::Connect {
                device: device.id.clone(),
                reason,
            })
    }
}
