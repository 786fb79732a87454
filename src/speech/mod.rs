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

//! Speech-to-text input.
//!
//! A recognizer hands out a [`SpeechSubscription`]: a stream of recognition
//! events that runs until it is stopped or dropped.

mod command;
mod scripted;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::config::SpeechConfig;

pub use command::CommandRecognizer;
pub use scripted::ScriptedRecognizer;

/// Events produced while listening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// Recognizer is listening.
    Started,
    /// Recognition alternatives, best first.
    Results(Vec<String>),
    /// Recognizer stopped listening.
    Ended,
    /// Recognition failed.
    Error(String),
}

impl SpeechEvent {
    /// Best transcript carried by a `Results` event.
    pub fn best_transcript(&self) -> Option<&str> {
        match self {
            SpeechEvent::Results(alternatives) => alternatives.first().map(String::as_str),
            _ => None,
        }
    }
}

/// Stops a subscription when `stop` is called or when dropped.
#[derive(Debug)]
pub struct StopHandle(Option<oneshot::Sender<()>>);

impl StopHandle {
    pub fn stop(mut self) {
        self.signal();
    }

    fn signal(&mut self) {
        if let Some(tx) = self.0.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for StopHandle {
    fn drop(&mut self) {
        self.signal();
    }
}

/// Live stream of recognition events.
#[derive(Debug)]
pub struct SpeechSubscription {
    events: mpsc::Receiver<SpeechEvent>,
    stop: StopHandle,
}

impl SpeechSubscription {
    /// Create a subscription plus the sender/stop pair a backend task drives.
    pub(crate) fn channel() -> (Self, mpsc::Sender<SpeechEvent>, oneshot::Receiver<()>) {
        let (event_tx, event_rx) = mpsc::channel(32);
        let (stop_tx, stop_rx) = oneshot::channel();
        let subscription = Self {
            events: event_rx,
            stop: StopHandle(Some(stop_tx)),
        };
        (subscription, event_tx, stop_rx)
    }

    /// Next event, or `None` once the recognizer has finished.
    pub async fn next(&mut self) -> Option<SpeechEvent> {
        self.events.recv().await
    }

    /// Ask the recognizer to stop. Remaining events, including `Ended`, can
    /// still be drained with [`next`](Self::next).
    pub fn stop(&mut self) {
        self.stop.signal();
    }

    /// Split into the event receiver and the stop handle.
    pub fn into_parts(self) -> (mpsc::Receiver<SpeechEvent>, StopHandle) {
        (self.events, self.stop)
    }
}

/// Speech recognizer backend.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Start listening in `locale`.
    async fn start(&self, locale: &str) -> Result<SpeechSubscription>;
}

/// Create the recognizer selected by the configuration.
pub fn create_recognizer(config: &SpeechConfig) -> Result<Arc<dyn SpeechRecognizer>> {
    if config.command.is_empty() {
        warn!("No speech command configured, speech input is scripted");
        return Ok(Arc::new(ScriptedRecognizer::new(Vec::new())));
    }

    let recognizer = CommandRecognizer::new(&config.command)?;
    info!("Speech recognizer: {}", config.command.join(" "));
    Ok(Arc::new(recognizer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_transcript() {
        let event = SpeechEvent::Results(vec!["hello".into(), "yellow".into()]);
        assert_eq!(event.best_transcript(), Some("hello"));
        assert_eq!(SpeechEvent::Results(vec![]).best_transcript(), None);
        assert_eq!(SpeechEvent::Started.best_transcript(), None);
    }

    #[tokio::test]
    async fn test_dropping_stop_handle_signals_backend() {
        let (subscription, _tx, stop_rx) = SpeechSubscription::channel();
        let (_events, stop) = subscription.into_parts();
        drop(stop);
        assert!(stop_rx.await.is_ok());
    }

    #[test]
    fn test_create_recognizer_without_command_is_scripted() {
        let recognizer = create_recognizer(&SpeechConfig::default()).unwrap();
        assert_eq!(recognizer.backend_name(), "Scripted");
    }
}
