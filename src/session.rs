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

//! Device session store.
//!
//! Process-lifetime record of which paired device, if any, is connected.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// A paired serial endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Transport-level identifier (Bluetooth address for RFCOMM).
    pub id: String,
    /// Human readable alias.
    pub name: String,
}

impl Device {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Connection state, derived from the session contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "Not Connected",
            ConnectionState::Connected => "Device Connected",
        }
    }
}

/// Holds zero or one connected device.
///
/// No validation happens here; the connection workflow is the only writer.
#[derive(Debug, Default)]
pub struct SessionStore {
    connected_device: RwLock<Option<Device>>,
}

impl SessionStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn connected_device(&self) -> Option<Device> {
        self.connected_device.read().clone()
    }

    pub fn set_connected_device(&self, device: Option<Device>) {
        *self.connected_device.write() = device;
    }

    pub fn is_connected(&self) -> bool {
        self.connected_device.read().is_some()
    }

    pub fn connection_state(&self) -> ConnectionState {
        if self.is_connected() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_starts_empty() {
        let session = SessionStore::new();
        assert!(session.connected_device().is_none());
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_session_set_and_clear() {
        let session = SessionStore::new();
        let device = Device::new("00:11:22:33:44:55", "Braille Pad");

        session.set_connected_device(Some(device.clone()));
        assert_eq!(session.connected_device(), Some(device));
        assert_eq!(session.connection_state(), ConnectionState::Connected);

        session.set_connected_device(None);
        assert!(!session.is_connected());
    }

    #[test]
    fn test_device_display() {
        let device = Device::new("AA:BB:CC:DD:EE:FF", "Netraa");
        assert_eq!(device.to_string(), "Netraa (AA:BB:CC:DD:EE:FF)");
    }
}
