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

//! Bluetooth RFCOMM client transport.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bluer::rfcomm::{SocketAddr, Stream};
use bluer::Address;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::Transport;
use crate::session::Device;

/// An open serial link.
struct Link {
    address: Address,
    stream: Stream,
}

/// RFCOMM transport backed by the default BlueZ adapter.
pub struct RfcommTransport {
    adapter: bluer::Adapter,
    channel: u8,
    link: Mutex<Option<Link>>,
}

impl RfcommTransport {
    /// Create a transport on the default adapter.
    pub async fn new(channel: u8) -> Result<Self> {
        info!("Initializing Bluetooth transport...");

        let session = bluer::Session::new().await?;
        info!("BlueZ session created");

        let adapter = session.default_adapter().await?;
        info!("Using Bluetooth adapter: {}", adapter.name());

        Ok(Self {
            adapter,
            channel,
            link: Mutex::new(None),
        })
    }

    fn parse_address(id: &str) -> Result<Address> {
        id.parse::<Address>()
            .map_err(|e| anyhow!("Invalid Bluetooth address '{}': {}", id, e))
    }
}

#[async_trait]
impl Transport for RfcommTransport {
    fn backend_name(&self) -> &'static str {
        "RFCOMM"
    }

    async fn request_enable(&self) -> Result<bool> {
        if !self.adapter.is_powered().await? {
            info!("Powering on Bluetooth adapter...");
            self.adapter.set_powered(true).await?;
        }
        Ok(self.adapter.is_powered().await?)
    }

    async fn list(&self) -> Result<Vec<Device>> {
        let mut devices = Vec::new();

        for addr in self.adapter.device_addresses().await? {
            let device = self.adapter.device(addr)?;
            if device.is_paired().await? {
                let name = device.alias().await.unwrap_or_else(|_| addr.to_string());
                devices.push(Device::new(addr.to_string(), name));
            }
        }

        debug!("Found {} paired devices", devices.len());
        Ok(devices)
    }

    async fn connect(&self, id: &str) -> Result<bool> {
        let address = Self::parse_address(id)?;
        let mut link = self.link.lock().await;

        if let Some(existing) = link.as_ref() {
            if existing.address == address {
                debug!("Link to {} already open", address);
                return Ok(true);
            }
        }

        info!("Connecting to {} on RFCOMM channel {}", address, self.channel);
        let stream = Stream::connect(SocketAddr::new(address, self.channel)).await?;
        info!("RFCOMM link established with {}", address);

        *link = Some(Link { address, stream });
        Ok(true)
    }

    async fn is_connected(&self) -> Result<bool> {
        let address = match self.link.lock().await.as_ref() {
            Some(link) => link.address,
            None => return Ok(false),
        };
        let device = self.adapter.device(address)?;
        Ok(device.is_connected().await?)
    }

    async fn write(&self, text: &str) -> Result<()> {
        let mut link = self.link.lock().await;
        let link = link
            .as_mut()
            .ok_or_else(|| anyhow!("No RFCOMM link open"))?;

        debug!("Writing {} bytes to {}", text.len(), link.address);
        link.stream.write_all(text.as_bytes()).await?;
        link.stream.flush().await?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        if let Some(mut link) = self.link.lock().await.take() {
            info!("Closing RFCOMM link to {}", link.address);
            if let Err(e) = link.stream.shutdown().await {
                warn!("Error shutting down RFCOMM stream: {}", e);
            }
        }
        Ok(())
    }
}
