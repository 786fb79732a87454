// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Stub transport for running without a Braille device.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::info;

use super::Transport;
use crate::session::Device;

#[derive(Default)]
struct StubState {
    devices: Vec<Device>,
    disabled: bool,
    refuse_connect: bool,
    fail_writes: bool,
    link: Option<String>,
    connect_calls: usize,
    writes_started: usize,
    writes: Vec<String>,
    write_gate: Option<Arc<Notify>>,
    connect_gate: Option<Arc<Notify>>,
}

/// In-memory transport that records everything written to it.
#[derive(Default)]
pub struct StubTransport {
    state: Mutex<StubState>,
}

impl StubTransport {
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            state: Mutex::new(StubState {
                devices,
                ..Default::default()
            }),
        }
    }

    /// Two fake bonded devices.
    pub fn with_demo_devices() -> Self {
        Self::new(vec![
            Device::new("00:11:22:33:44:55", "Netraa Braille"),
            Device::new("66:77:88:99:AA:BB", "HC-05"),
        ])
    }

    /// Adapter refuses to power on.
    pub fn disabled(self) -> Self {
        self.state.lock().disabled = true;
        self
    }

    /// Every connect attempt reports failure.
    pub fn refuse_connections(self) -> Self {
        self.state.lock().refuse_connect = true;
        self
    }

    /// Every write fails.
    pub fn fail_writes(self) -> Self {
        self.state.lock().fail_writes = true;
        self
    }

    /// Writes block until the gate is notified.
    pub fn gate_writes(self, gate: Arc<Notify>) -> Self {
        self.state.lock().write_gate = Some(gate);
        self
    }

    /// Connects block until the gate is notified.
    pub fn gate_connects(self, gate: Arc<Notify>) -> Self {
        self.state.lock().connect_gate = Some(gate);
        self
    }

    /// Simulate the remote side dropping the link.
    pub fn drop_link(&self) {
        self.state.lock().link = None;
    }

    /// Payloads successfully written, in order.
    pub fn writes(&self) -> Vec<String> {
        self.state.lock().writes.clone()
    }

    /// Writes entered, including ones still waiting on the gate.
    pub fn writes_started(&self) -> usize {
        self.state.lock().writes_started
    }

    pub fn connect_calls(&self) -> usize {
        self.state.lock().connect_calls
    }
}

#[async_trait]
impl Transport for StubTransport {
    fn backend_name(&self) -> &'static str {
        "Stub (in-memory)"
    }

    async fn request_enable(&self) -> Result<bool> {
        Ok(!self.state.lock().disabled)
    }

    async fn list(&self) -> Result<Vec<Device>> {
        let state = self.state.lock();
        if state.disabled {
            bail!("Bluetooth adapter is off");
        }
        Ok(state.devices.clone())
    }

    async fn connect(&self, id: &str) -> Result<bool> {
        let gate = {
            let mut state = self.state.lock();
            state.connect_calls += 1;
            state.connect_gate.clone()
        };

        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = self.state.lock();
        if state.refuse_connect {
            return Ok(false);
        }
        if !state.devices.iter().any(|d| d.id == id) {
            return Err(anyhow!("Device {} is not bonded", id));
        }

        info!("[STUB] Link opened to {}", id);
        state.link = Some(id.to_string());
        Ok(true)
    }

    async fn is_connected(&self) -> Result<bool> {
        Ok(self.state.lock().link.is_some())
    }

    async fn write(&self, text: &str) -> Result<()> {
        let gate = {
            let mut state = self.state.lock();
            state.writes_started += 1;
            state.write_gate.clone()
        };

        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = self.state.lock();
        if state.link.is_none() {
            bail!("No link open");
        }
        if state.fail_writes {
            bail!("Device rejected write");
        }

        info!("[STUB] Would write: {:?}", text);
        state.writes.push(text.to_string());
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        if let Some(id) = self.state.lock().link.take() {
            info!("[STUB] Link to {} closed", id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_records_writes() {
        let transport = StubTransport::with_demo_devices();
        assert!(transport.connect("00:11:22:33:44:55").await.unwrap());

        transport.write("hello\n").await.unwrap();
        assert_eq!(transport.writes(), vec!["hello\n".to_string()]);
    }

    #[tokio::test]
    async fn test_stub_write_without_link_fails() {
        let transport = StubTransport::with_demo_devices();
        assert!(transport.write("hello\n").await.is_err());
        assert!(transport.writes().is_empty());
    }

    #[tokio::test]
    async fn test_stub_unknown_device() {
        let transport = StubTransport::with_demo_devices();
        assert!(transport.connect("FF:FF:FF:FF:FF:FF").await.is_err());
        assert!(!transport.is_connected().await.unwrap());
    }

    #[tokio::test]
    async fn test_stub_disabled_adapter() {
        let transport = StubTransport::with_demo_devices().disabled();
        assert!(!transport.request_enable().await.unwrap());
        assert!(transport.list().await.is_err());
    }
}
