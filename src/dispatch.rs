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

//! Outgoing text dispatch.
//!
//! Gates every payload on a non-empty body and a connected device before it
//! reaches the transport. Only one write may be outstanding at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::bluetooth::Transport;
use crate::session::SessionStore;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("nothing to send")]
    EmptyPayload,

    #[error("no device connected")]
    NotConnected,

    #[error("another message is still being sent")]
    Busy,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Releases the in-flight slot when dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Validates and forwards text to the connected device.
pub struct Dispatcher {
    session: Arc<SessionStore>,
    transport: Arc<dyn Transport>,
    terminator: String,
    in_flight: AtomicBool,
}

impl Dispatcher {
    pub fn new(session: Arc<SessionStore>, transport: Arc<dyn Transport>) -> Self {
        Self::with_terminator(session, transport, "\n")
    }

    pub fn with_terminator(
        session: Arc<SessionStore>,
        transport: Arc<dyn Transport>,
        terminator: impl Into<String>,
    ) -> Self {
        Self {
            session,
            transport,
            terminator: terminator.into(),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a write is currently outstanding.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Send `text` to the connected device.
    pub async fn dispatch(&self, text: &str) -> Result<(), DispatchError> {
        if text.trim().is_empty() {
            debug!("Refusing to dispatch empty payload");
            return Err(DispatchError::EmptyPayload);
        }

        let device = self
            .session
            .connected_device()
            .ok_or(DispatchError::NotConnected)?;

        let _slot = InFlight::acquire(&self.in_flight).ok_or_else(|| {
            warn!("Dispatch rejected, previous write still in flight");
            DispatchError::Busy
        })?;

        let payload = format!("{}{}", text, self.terminator);
        self.transport.write(&payload).await.map_err(|e| {
            warn!("Write to {} failed: {:#}", device.id, e);
            DispatchError::Transport(format!("{:#}", e))
        })?;

        info!("Sent {} bytes to {}", payload.len(), device.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bluetooth::StubTransport;
    use crate::session::Device;
    use tokio::sync::Notify;

    fn connected_session() -> Arc<SessionStore> {
        let session = SessionStore::new();
        session.set_connected_device(Some(Device::new("00:11:22:33:44:55", "Netraa Braille")));
        session
    }

    async fn linked_stub() -> Arc<StubTransport> {
        let transport = Arc::new(StubTransport::with_demo_devices());
        transport.connect("00:11:22:33:44:55").await.unwrap();
        transport
    }

    #[tokio::test]
    async fn test_empty_payload_rejected_regardless_of_connection() {
        let transport = linked_stub().await;

        let disconnected = Dispatcher::new(SessionStore::new(), transport.clone());
        assert!(matches!(disconnected.dispatch("").await, Err(DispatchError::EmptyPayload)));

        let dispatcher = Dispatcher::new(connected_session(), transport.clone());
        assert!(matches!(dispatcher.dispatch("   \n\t").await, Err(DispatchError::EmptyPayload)));
        assert_eq!(transport.writes_started(), 0);
    }

    #[tokio::test]
    async fn test_not_connected_never_writes() {
        let transport = linked_stub().await;
        let dispatcher = Dispatcher::new(SessionStore::new(), transport.clone());

        assert!(matches!(dispatcher.dispatch("hello").await, Err(DispatchError::NotConnected)));
        assert_eq!(transport.writes_started(), 0);
    }

    #[tokio::test]
    async fn test_connected_writes_once_with_newline() {
        let transport = linked_stub().await;
        let dispatcher = Dispatcher::new(connected_session(), transport.clone());

        dispatcher.dispatch("hello").await.unwrap();
        assert_eq!(transport.writes(), vec!["hello\n".to_string()]);
        assert_eq!(transport.writes_started(), 1);
    }

    #[tokio::test]
    async fn test_custom_terminator() {
        let transport = linked_stub().await;
        let dispatcher = Dispatcher::with_terminator(connected_session(), transport.clone(), "\r\n");

        dispatcher.dispatch("A").await.unwrap();
        assert_eq!(transport.writes(), vec!["A\r\n".to_string()]);
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces() {
        let transport = Arc::new(StubTransport::with_demo_devices().fail_writes());
        transport.connect("00:11:22:33:44:55").await.unwrap();
        let dispatcher = Dispatcher::new(connected_session(), transport.clone());

        match dispatcher.dispatch("hello").await {
            Err(DispatchError::Transport(cause)) => assert!(cause.contains("rejected")),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!dispatcher.is_busy());
    }

    #[tokio::test]
    async fn test_second_dispatch_while_in_flight_is_busy() {
        let gate = Arc::new(Notify::new());
        let transport = Arc::new(StubTransport::with_demo_devices().gate_writes(gate.clone()));
        transport.connect("00:11:22:33:44:55").await.unwrap();
        let dispatcher = Arc::new(Dispatcher::new(connected_session(), transport.clone()));

        let first = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.dispatch("first").await })
        };
        while transport.writes_started() == 0 {
            tokio::task::yield_now().await;
        }

        assert!(dispatcher.is_busy());
        assert!(matches!(dispatcher.dispatch("second").await, Err(DispatchError::Busy)));

        gate.notify_one();
        first.await.unwrap().unwrap();
        assert!(!dispatcher.is_busy());
        assert_eq!(transport.writes(), vec!["first\n".to_string()]);

        // Gate is still installed, release it before the next write.
        gate.notify_one();
        dispatcher.dispatch("third").await.unwrap();
        assert_eq!(transport.writes().len(), 2);
    }
}
