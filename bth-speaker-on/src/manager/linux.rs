/*!
 * Linux Device Manager
 * Paired devices and reconnects via BlueZ over the system D-Bus
 */

use async_trait::async_trait;
use dbus::arg::{prop_cast, PropMap};
use dbus::nonblock::stdintf::org_freedesktop_dbus::ObjectManager;
use dbus::nonblock::{Proxy, SyncConnection};
use dbus::Path;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::DeviceManager;
use crate::device::{ConnectionStatus, Device};
use crate::error::{Error, Result};

const BACKEND: &str = "bluez";
const BLUEZ_SERVICE: &str = "org.bluez";
const DEVICE_INTERFACE: &str = "org.bluez.Device1";
const CALL_TIMEOUT: Duration = Duration::from_secs(25);

type ManagedObjects = HashMap<Path<'static>, HashMap<String, PropMap>>;

/// Paired `org.bluez.Device1` objects, ordered by object path. The object path
/// is the device id since that is what `Connect` is invoked on.
pub fn paired_devices(objects: &ManagedObjects) -> Vec<Device> {
    let mut devices: Vec<Device> = objects
        .iter()
        .filter_map(|(path, interfaces)| {
            let props = interfaces.get(DEVICE_INTERFACE)?;
            if prop_cast::<bool>(props, "Paired").copied() != Some(true) {
                return None;
            }

            let status = ConnectionStatus::from(prop_cast::<bool>(props, "Connected").copied());
            let device = Device::new(path.to_string(), status);
            let name = prop_cast::<String>(props, "Alias").or_else(|| prop_cast::<String>(props, "Name"));
            Some(match name {
                Some(name) => device.with_name(name.clone()),
                None => device,
            })
        })
        .collect();

    devices.sort_by(|a, b| a.id.cmp(&b.id));
    devices
}

pub struct BluezManager {
    conn: Arc<SyncConnection>,
    io: JoinHandle<()>,
}

impl BluezManager {
    pub async fn new() -> Result<Self> {
        let (resource, conn) = dbus_tokio::connection::new_system_sync().map_err(|e| Error::Init {
            backend: BACKEND,
            reason: e.to_string(),
        })?;

        // The resource drives the connection; it only resolves once the bus is gone.
        let io = tokio::spawn(async move {
            let err = resource.await;
            tracing::error!("Lost connection to system D-Bus: {}", err);
        });

        tracing::info!("Connected to system D-Bus");
        Ok(Self { conn, io })
    }

    fn proxy<'a>(&self, path: impl Into<Path<'a>>) -> Proxy<'a, Arc<SyncConnection>> {
        Proxy::new(BLUEZ_SERVICE, path, CALL_TIMEOUT, self.conn.clone())
    }
}

impl Drop for BluezManager {
    fn drop(&mut self) {
        self.io.abort();
    }
}

#[async_trait]
impl DeviceManager for BluezManager {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn devices(&self) -> Result<Vec<Device>> {
        let objects = self
            .proxy("/")
            .get_managed_objects()
            .await
            .map_err(|e| Error::OsQuery {
                backend: BACKEND,
                reason: e.to_string(),
            })?;
        Ok(paired_devices(&objects))
    }

    async fn connect(&self, device: &Device) -> Result<()> {
        let connect_error = |reason: String| Error::Connect {
            device: device.id.clone(),
            reason,
        };

        let path = Path::new(device.id.as_str()).map_err(connect_error)?;
        self.proxy(path)
            .method_call::<(), _, _, _>(DEVICE_INTERFACE, "Connect", ())
            .await
            .map_err(|e| connect_error(e.to_string()))
    }
}
