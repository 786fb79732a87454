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

//! Device discovery and connection management.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::bluetooth::Transport;
use crate::session::{Device, SessionStore};

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("Bluetooth is not enabled")]
    AdapterDisabled,

    #[error("already connected to {current}, disconnect first")]
    AlreadyConnected { current: Device },

    #[error("could not connect to {0}")]
    ConnectFailed(Device),

    #[error("no paired device matches '{0}'")]
    UnknownDevice(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Result of a successful connect call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// A new link was opened.
    Connected,
    /// The requested device was already the connected one.
    AlreadyConnected,
}

/// Owns the session store and is its only writer.
///
/// Connects and disconnects are serialized, so overlapping calls observe
/// each other's result.
pub struct ConnectionManager {
    session: Arc<SessionStore>,
    transport: Arc<dyn Transport>,
    transition: Mutex<()>,
}

impl ConnectionManager {
    pub fn new(session: Arc<SessionStore>, transport: Arc<dyn Transport>) -> Self {
        Self {
            session,
            transport,
            transition: Mutex::new(()),
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn connected_device(&self) -> Option<Device> {
        self.session.connected_device()
    }

    pub fn backend_name(&self) -> &'static str {
        self.transport.backend_name()
    }

    /// List bonded devices, enabling the adapter first.
    pub async fn list_paired(&self) -> Result<Vec<Device>, ConnectError> {
        let enabled = self
            .transport
            .request_enable()
            .await
            .map_err(|e| ConnectError::Transport(format!("{:#}", e)))?;
        if !enabled {
            return Err(ConnectError::AdapterDisabled);
        }

        let devices = self
            .transport
            .list()
            .await
            .map_err(|e| ConnectError::Transport(format!("{:#}", e)))?;
        info!("{} paired devices", devices.len());
        Ok(devices)
    }

    /// Connect to `device`.
    ///
    /// A second device is refused while one is connected.
    pub async fn connect(&self, device: &Device) -> Result<ConnectOutcome, ConnectError> {
        let _transition = self.transition.lock().await;

        if let Some(current) = self.session.connected_device() {
            if current.id == device.id {
                return Ok(ConnectOutcome::AlreadyConnected);
            }
            warn!("Refusing to connect to {} while connected to {}", device, current);
            return Err(ConnectError::AlreadyConnected { current });
        }

        info!("Connecting to {}", device);
        match self.transport.connect(&device.id).await {
            Ok(true) => {
                self.session.set_connected_device(Some(device.clone()));
                info!("Connected to {}", device);
                Ok(ConnectOutcome::Connected)
            }
            Ok(false) => {
                warn!("Transport refused connection to {}", device);
                Err(ConnectError::ConnectFailed(device.clone()))
            }
            Err(e) => {
                warn!("Connect error for {}: {:#}", device, e);
                Err(ConnectError::ConnectFailed(device.clone()))
            }
        }
    }

    /// Resolve `query` by address or name among paired devices, then connect.
    pub async fn connect_by_id(&self, query: &str) -> Result<(Device, ConnectOutcome), ConnectError> {
        let devices = self.list_paired().await?;
        let device = devices
            .into_iter()
            .find(|d| d.id.eq_ignore_ascii_case(query) || d.name.eq_ignore_ascii_case(query))
            .ok_or_else(|| ConnectError::UnknownDevice(query.to_string()))?;

        let outcome = self.connect(&device).await?;
        Ok((device, outcome))
    }

    /// Close the link and clear the session.
    pub async fn disconnect(&self) -> Result<Option<Device>, ConnectError> {
        let _transition = self.transition.lock().await;

        let Some(device) = self.session.connected_device() else {
            return Ok(None);
        };

        self.transport
            .disconnect()
            .await
            .map_err(|e| ConnectError::Transport(format!("{:#}", e)))?;
        self.session.set_connected_device(None);
        info!("Disconnected from {}", device);
        Ok(Some(device))
    }

    /// Ask the transport whether the link is still up.
    pub async fn link_alive(&self) -> bool {
        match self.transport.is_connected().await {
            Ok(up) => up,
            Err(e) => {
                warn!("Link check failed: {:#}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bluetooth::StubTransport;
    use tokio::sync::Notify;

    fn manager(transport: Arc<StubTransport>) -> ConnectionManager {
        ConnectionManager::new(SessionStore::new(), transport)
    }

    #[tokio::test]
    async fn test_list_paired() {
        let transport = Arc::new(StubTransport::with_demo_devices());
        let devices = manager(transport).list_paired().await.unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].name, "Netraa Braille");
    }

    #[tokio::test]
    async fn test_list_paired_adapter_disabled() {
        let transport = Arc::new(StubTransport::with_demo_devices().disabled());
        assert!(matches!(
            manager(transport).list_paired().await,
            Err(ConnectError::AdapterDisabled)
        ));
    }

    #[tokio::test]
    async fn test_connect_stores_device() {
        let transport = Arc::new(StubTransport::with_demo_devices());
        let manager = manager(transport.clone());
        let device = Device::new("00:11:22:33:44:55", "Netraa Braille");

        assert_eq!(manager.connect(&device).await.unwrap(), ConnectOutcome::Connected);
        assert_eq!(manager.connected_device(), Some(device));
        assert!(manager.link_alive().await);
    }

    #[tokio::test]
    async fn test_connect_same_device_is_noop() {
        let transport = Arc::new(StubTransport::with_demo_devices());
        let manager = manager(transport.clone());
        let device = Device::new("00:11:22:33:44:55", "Netraa Braille");

        manager.connect(&device).await.unwrap();
        assert_eq!(
            manager.connect(&device).await.unwrap(),
            ConnectOutcome::AlreadyConnected
        );
        assert_eq!(transport.connect_calls(), 1);
    }

    #[tokio::test]
    async fn test_connect_other_device_leaves_session_unchanged() {
        let transport = Arc::new(StubTransport::with_demo_devices());
        let manager = manager(transport.clone());
        let first = Device::new("00:11:22:33:44:55", "Netraa Braille");
        let second = Device::new("66:77:88:99:AA:BB", "HC-05");

        manager.connect(&first).await.unwrap();
        match manager.connect(&second).await {
            Err(ConnectError::AlreadyConnected { current }) => assert_eq!(current, first),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(manager.connected_device(), Some(first));
        assert_eq!(transport.connect_calls(), 1);
    }

    #[tokio::test]
    async fn test_overlapping_connects_admit_one_device() {
        let gate = Arc::new(Notify::new());
        let transport = Arc::new(StubTransport::with_demo_devices().gate_connects(gate.clone()));
        let manager = Arc::new(manager(transport.clone()));
        let first = Device::new("00:11:22:33:44:55", "Netraa Braille");
        let second = Device::new("66:77:88:99:AA:BB", "HC-05");

        let a = tokio::spawn({
            let manager = manager.clone();
            let first = first.clone();
            async move { manager.connect(&first).await }
        });
        while transport.connect_calls() == 0 {
            tokio::task::yield_now().await;
        }

        let b = tokio::spawn({
            let manager = manager.clone();
            async move { manager.connect(&second).await }
        });
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        gate.notify_one();

        assert_eq!(a.await.unwrap().unwrap(), ConnectOutcome::Connected);
        match b.await.unwrap() {
            Err(ConnectError::AlreadyConnected { current }) => assert_eq!(current, first),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(manager.connected_device(), Some(first));
        assert_eq!(transport.connect_calls(), 1);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let transport = Arc::new(StubTransport::with_demo_devices().refuse_connections());
        let manager = manager(transport);
        let device = Device::new("00:11:22:33:44:55", "Netraa Braille");

        assert!(matches!(
            manager.connect(&device).await,
            Err(ConnectError::ConnectFailed(_))
        ));
        assert!(manager.connected_device().is_none());
    }

    #[tokio::test]
    async fn test_connect_by_name_and_disconnect() {
        let transport = Arc::new(StubTransport::with_demo_devices());
        let manager = manager(transport.clone());

        let (device, outcome) = manager.connect_by_id("hc-05").await.unwrap();
        assert_eq!(device.id, "66:77:88:99:AA:BB");
        assert_eq!(outcome, ConnectOutcome::Connected);

        assert_eq!(manager.disconnect().await.unwrap(), Some(device));
        assert!(manager.connected_device().is_none());
        assert!(!manager.link_alive().await);
        assert_eq!(manager.disconnect().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_connect_by_unknown_id() {
        let transport = Arc::new(StubTransport::with_demo_devices());
        assert!(matches!(
            manager(transport).connect_by_id("nope").await,
            Err(ConnectError::UnknownDevice(_))
        ));
    }
}
