//! Scripted device manager for loop and decorator tests.

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use super::DeviceManager;
use crate::device::Device;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Devices { ok: bool },
    Connect(String),
}

/// Replays one scripted `devices()` result per call; once the script runs
/// out every call returns an empty list.
pub struct ScriptedManager {
    script: Mutex<VecDeque<Result<Vec<Device>>>>,
    failing: HashSet<String>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedManager {
    pub fn new(script: Vec<Result<Vec<Device>>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_connect(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn query_error() -> Error {
        Error::OsQuery {
            backend: "scripted",
            reason: "adapter unavailable".into(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn connected_ids(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Connect(id) => Some(id),
                Call::Devices { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl DeviceManager for ScriptedManager {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn devices(&self) -> Result<Vec<Device>> {
        let next = self.script.lock().unwrap().pop_front().unwrap_or(Ok(Vec::new()));
        self.calls.lock().unwrap().push(Call::Devices { ok: next.is_ok() });
        next
    }

    async fn connect(&self, device: &Device) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Connect(device.id.clone()));
        if self.failing.contains(&device.id) {
            return Err(Error::Connect {
                device: device.id.clone(),
                reason: "page timeout".into(),
            });
        }
        Ok(())
    }
}
