/*!
 * Windows Device Manager
 * Bluetooth PnP devices queried and cycled through PowerShell
 */

use async_trait::async_trait;
use serde::Deserialize;

use super::{command, DeviceManager};
use crate::device::{ConnectionStatus, Device};
use crate::error::{Error, Result};

const BACKEND: &str = "pnp";
const POWERSHELL: &str = "powershell";

// DEVPKEY_Device_IsConnected for Bluetooth device nodes.
const LIST_SCRIPT: &str = r#"$ErrorActionPreference = 'Stop'
$devices = Get-PnpDevice -Class Bluetooth -ErrorAction SilentlyContinue | Where-Object { $_.InstanceId -like 'BTHENUM\DEV_*' } | ForEach-Object {
    $connected = (Get-PnpDeviceProperty -InstanceId $_.InstanceId -KeyName '{83DA6326-97A6-4088-9453-A1923F573B29} 15' -ErrorAction SilentlyContinue).Data
    [pscustomobject]@{ InstanceId = $_.InstanceId; FriendlyName = $_.FriendlyName; Connected = $connected }
}
ConvertTo-Json -InputObject @($devices) -Compress"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PnpDevice {
    instance_id: String,
    friendly_name: Option<String>,
    connected: Option<bool>,
}

pub fn parse_pnp(json: &str) -> Result<Vec<Device>> {
    let json = json.trim();
    if json.is_empty() {
        return Ok(Vec::new());
    }

    let listed: Vec<PnpDevice> = serde_json::from_str(json).map_err(|e| Error::OsQuery {
        backend: BACKEND,
        reason: format!("unexpected output: {}", e),
    })?;

    Ok(listed
        .into_iter()
        .map(|entry| {
            let device = Device::new(entry.instance_id, ConnectionStatus::from(entry.connected));
            match entry.friendly_name {
                Some(name) => device.with_name(name),
                None => device,
            }
        })
        .collect())
}

/// Quotes a value as a single-quoted PowerShell literal.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn reconnect_script(instance_id: &str) -> String {
    let id = quote(instance_id);
    format!(
        "$ErrorActionPreference = 'Stop'\n\
         Disable-PnpDevice -InstanceId {id} -Confirm:$false\n\
         Enable-PnpDevice -InstanceId {id} -Confirm:$false"
    )
}

async fn powershell(script: &str) -> std::result::Result<String, String> {
    command::output(POWERSHELL, &["-NoProfile", "-NonInteractive", "-Command", script]).await
}

/// Cycling a device node needs an elevated shell.
pub struct PnpManager;

impl PnpManager {
    pub async fn new() -> Result<Self> {
        let version = powershell("$PSVersionTable.PSVersion.ToString()")
            .await
            .map_err(|reason| Error::Init {
                backend: BACKEND,
                reason,
            })?;
        tracing::info!("Using PowerShell {}", version.trim());
        Ok(Self)
    }
}

#[async_trait]
impl DeviceManager for PnpManager {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn devices(&self) -> Result<Vec<Device>> {
        let json = powershell(LIST_SCRIPT).await.map_err(|reason| Error::OsQuery {
            backend: BACKEND,
            reason,
        })?;
        parse_pnp(&json)
    }

    async fn connect(&self, device: &Device) -> Result<()> {
        powershell(&reconnect_script(&device.id))
            .await
            .map(|_| ())
            .map_err(|reason| Error::Connect {
                device: device.id.clone(),
                reason,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pnp_devices() {
        let json = r#"[{"InstanceId":"BTHENUM\\DEV_0452C71A2B3C\\7&1A2B3C&0&BLUETOOTHDEVICE_0452C71A2B3C","FriendlyName":"Kitchen Speaker","Connected":false},{"InstanceId":"BTHENUM\\DEV_F44EFDAABBCC\\7&1&0&BLUETOOTHDEVICE_F44EFDAABBCC","FriendlyName":"Headphones","Connected":null}]"#;
        let devices = parse_pnp(json).unwrap();

        assert_eq!(devices.len(), 2);
        assert!(devices[0].id.starts_with("BTHENUM\\DEV_0452C71A2B3C"));
        assert_eq!(devices[0].name.as_deref(), Some("Kitchen Speaker"));
        assert_eq!(devices[0].status, ConnectionStatus::Disconnected);
        assert_eq!(devices[1].status, ConnectionStatus::Unknown);
    }

    #[test]
    fn test_listing_tolerates_hosts_without_bluetooth_devices() {
        let listing = LIST_SCRIPT
            .lines()
            .find(|line| line.contains("Get-PnpDevice -Class Bluetooth"))
            .unwrap();
        assert!(listing.contains("-ErrorAction SilentlyContinue"));
        assert!(LIST_SCRIPT.contains("ConvertTo-Json -InputObject @($devices)"));
        assert!(parse_pnp("[]").unwrap().is_empty());
    }

    #[test]
    fn test_blank_output_means_no_devices() {
        assert!(parse_pnp("\r\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_error_is_query_error() {
        assert!(matches!(
            parse_pnp("Get-PnpDevice : access denied"),
            Err(Error::OsQuery { backend: "pnp", .. })
        ));
    }

    #[test]
    fn test_reconnect_script_quotes_instance_id() {
        let script = reconnect_script("BTHENUM\\DEV_X\\7&O'NEIL");
        assert!(script.contains("Disable-PnpDevice -InstanceId 'BTHENUM\\DEV_X\\7&O''NEIL' -Confirm:$false"));
        assert!(script.contains("Enable-PnpDevice -InstanceId 'BTHENUM\\DEV_X\\7&O''NEIL' -Confirm:$false"));
    }
}
