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

//! Bluetooth transport module.
//!
//! Serial link to a paired Braille device over RFCOMM (SPP), plus a stub
//! backend for running without hardware.

mod rfcomm;
mod stub;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::config::BluetoothConfig;
use crate::session::Device;

pub use rfcomm::RfcommTransport;
pub use stub::StubTransport;

/// Serial transport to a paired device.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Get the backend name (e.g., "RFCOMM", "Stub").
    fn backend_name(&self) -> &'static str;

    /// Make sure the local adapter is powered. Returns whether it is usable.
    async fn request_enable(&self) -> Result<bool>;

    /// List bonded devices.
    async fn list(&self) -> Result<Vec<Device>>;

    /// Open a link to the device with the given id.
    async fn connect(&self, id: &str) -> Result<bool>;

    /// Whether the link is currently up.
    async fn is_connected(&self) -> Result<bool>;

    /// Write raw text to the open link.
    async fn write(&self, text: &str) -> Result<()>;

    /// Close the open link, if any.
    async fn disconnect(&self) -> Result<()>;
}

/// Create the transport selected by the configuration.
///
/// - "rfcomm": BlueZ RFCOMM client
/// - "stub": in-memory loopback with demo devices
pub async fn create_transport(config: &BluetoothConfig) -> Result<Arc<dyn Transport>> {
    match config.backend.to_lowercase().as_str() {
        "rfcomm" => {
            info!("Using RFCOMM transport on channel {}", config.rfcomm_channel);
            Ok(Arc::new(RfcommTransport::new(config.rfcomm_channel).await?))
        }
        "stub" => {
            info!("Using stub transport");
            Ok(Arc::new(StubTransport::with_demo_devices()))
        }
        other => Err(anyhow!("Unknown Bluetooth backend: {}", other)),
    }
}
