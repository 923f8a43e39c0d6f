/*!
 * Bluetooth Device Model
 * A snapshot of one paired peripheral, re-read on every poll
 */

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Unknown,
}

impl From<Option<bool>> for ConnectionStatus {
    fn from(connected: Option<bool>) -> Self {
        match connected {
            Some(true) => ConnectionStatus::Connected,
            Some(false) => ConnectionStatus::Disconnected,
            None => ConnectionStatus::Unknown,
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// OS-assigned identifier: a MAC address, a D-Bus path or a PnP instance id.
    pub id: String,
    pub name: Option<String>,
    pub status: ConnectionStatus,
}

impl Device {
    pub fn new(id: impl Into<String>, status: ConnectionStatus) -> Self {
        Self {
            id: id.into(),
            name: None,
            status,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn needs_reconnect(&self) -> bool {
        self.status == ConnectionStatus::Disconnected
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", name, self.id),
            None => f.write_str(&self.id),
        }
    }
}
