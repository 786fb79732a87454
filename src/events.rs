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

//! Event processing and message dispatch.
//!
//! User actions and speech events come in as [`AppEvent`]s; every outcome
//! goes back out as a [`Notice`] for the user. No failure here is fatal.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::braille::{self, TeachError};
use crate::connection::{ConnectError, ConnectOutcome, ConnectionManager};
use crate::dispatch::{DispatchError, Dispatcher};
use crate::remote::{AskError, AssistantClient, ExtractError, PdfExtractor, ServiceClient};
use crate::speech::{SpeechEvent, SpeechRecognizer, StopHandle};
use crate::state::AppState;
use crate::storage::Message;

/// Events driving the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Refresh the paired device list.
    ListDevices,
    /// Connect by address or name.
    Connect(String),
    Disconnect,
    /// Replace the composer text.
    SetDraft(String),
    /// Send the given text, or the composer text when `None`.
    Send(Option<String>),
    /// Send one letter of the teaching alphabet.
    Teach(char),
    /// Ask the assistant, using the composer text when `None`.
    Ask(Option<String>),
    /// Send the last assistant reply.
    SendReply,
    /// Extract text from a PDF.
    ExtractPdf(PathBuf),
    /// Send the extracted PDF text.
    SendExtracted,
    StartListening,
    StopListening,
    /// Event from the speech subscription with the given generation.
    Speech { generation: u64, event: SpeechEvent },
    ShowHistory(usize),
    /// Case-insensitive search of sent messages.
    SearchHistory(String),
    /// Write the history to a text file.
    ExportHistory(PathBuf),
    ClearHistory,
    ShowAlphabet,
    Status,
}

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, title, body)
    }

    pub fn success(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title, body)
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, title, body)
    }

    fn new(level: NoticeLevel, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            body: body.into(),
        }
    }
}

impl From<&DispatchError> for Notice {
    fn from(e: &DispatchError) -> Self {
        match e {
            DispatchError::NotConnected => {
                Notice::error("Bluetooth", "No device connected! Connect to a Braille device first.")
            }
            DispatchError::EmptyPayload => Notice::error("Nothing to send", "The message is empty."),
            DispatchError::Busy => {
                Notice::error("Busy", "Still sending the previous message, try again.")
            }
            DispatchError::Transport(cause) => {
                Notice::error("Error", format!("Failed to send to Braille device: {}", cause))
            }
        }
    }
}

/// Process events from the console and the speech recognizer.
pub struct EventProcessor {
    connections: Arc<ConnectionManager>,
    dispatcher: Arc<Dispatcher>,
    assistant: AssistantClient,
    extractor: PdfExtractor,
    recognizer: Arc<dyn SpeechRecognizer>,
    locale: String,
    state: Arc<AppState>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
    speech_generation: u64,
    speech_stop: Option<StopHandle>,
}

impl EventProcessor {
    /// Create a new event processor.
    ///
    /// Speech events are fed back through `event_tx`.
    pub fn new(
        connections: Arc<ConnectionManager>,
        dispatcher: Arc<Dispatcher>,
        service: ServiceClient,
        recognizer: Arc<dyn SpeechRecognizer>,
        locale: impl Into<String>,
        state: Arc<AppState>,
        event_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            connections,
            dispatcher,
            assistant: AssistantClient::new(service.clone()),
            extractor: PdfExtractor::new(service),
            recognizer,
            locale: locale.into(),
            state,
            event_tx,
            speech_generation: 0,
            speech_stop: None,
        }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Process a single event.
    pub async fn process_event(&mut self, event: AppEvent) -> Option<Notice> {
        debug!("Processing event: {:?}", event);

        match event {
            AppEvent::ListDevices => Some(self.list_devices().await),
            AppEvent::Connect(query) => Some(self.connect(&query).await),
            AppEvent::Disconnect => Some(self.disconnect().await),
            AppEvent::SetDraft(text) => {
                self.state.set_draft(text);
                None
            }
            AppEvent::Send(text) => Some(self.send(text).await),
            AppEvent::Teach(letter) => Some(self.teach(letter).await),
            AppEvent::Ask(query) => Some(self.ask(query).await),
            AppEvent::SendReply => Some(self.send_reply().await),
            AppEvent::ExtractPdf(path) => Some(self.extract_pdf(path).await),
            AppEvent::SendExtracted => Some(self.send_extracted().await),
            AppEvent::StartListening => Some(self.start_listening().await),
            AppEvent::StopListening => self.stop_listening(),
            AppEvent::Speech { generation, event } => self.handle_speech(generation, event),
            AppEvent::ShowHistory(limit) => Some(self.show_history(limit)),
            AppEvent::SearchHistory(query) => Some(self.search_history(&query)),
            AppEvent::ExportHistory(path) => Some(self.export_history(&path)),
            AppEvent::ClearHistory => {
                self.state.history.clear();
                Some(Notice::info("History", "History cleared"))
            }
            AppEvent::ShowAlphabet => Some(self.show_alphabet()),
            AppEvent::Status => Some(self.status().await),
        }
    }

    async fn list_devices(&self) -> Notice {
        match self.connections.list_paired().await {
            Ok(devices) if devices.is_empty() => Notice::info(
                "No Devices Found",
                "Make sure Bluetooth is enabled and devices are paired in your system settings.",
            ),
            Ok(devices) => {
                let connected = self.connections.connected_device();
                let mut body = String::new();
                for device in &devices {
                    let marker = if connected.as_ref().map(|d| &d.id) == Some(&device.id) {
                        "  [connected]"
                    } else {
                        ""
                    };
                    let _ = writeln!(body, "{:<20} {}{}", device.name, device.id, marker);
                }
                Notice::info("Available Devices", body.trim_end())
            }
            Err(e) => {
                warn!("Listing devices failed: {}", e);
                Notice::error("Bluetooth", e.to_string())
            }
        }
    }

    async fn connect(&self, query: &str) -> Notice {
        match self.connections.connect_by_id(query).await {
            Ok((device, ConnectOutcome::Connected)) => {
                Notice::success("Connected", format!("Connected to {}", device))
            }
            Ok((device, ConnectOutcome::AlreadyConnected)) => {
                Notice::info("Connected", format!("Already connected to {}", device))
            }
            Err(e @ ConnectError::AlreadyConnected { .. }) => Notice::error("Bluetooth", e.to_string()),
            Err(e) => {
                error!("Connect error: {}", e);
                Notice::error("Connection failed", e.to_string())
            }
        }
    }

    async fn disconnect(&self) -> Notice {
        match self.connections.disconnect().await {
            Ok(Some(device)) => Notice::info("Disconnected", format!("Disconnected from {}", device)),
            Ok(None) => Notice::info("Bluetooth", "No device connected"),
            Err(e) => Notice::error("Bluetooth", e.to_string()),
        }
    }

    /// Dispatch `text` and record it on success.
    async fn deliver(&self, text: &str) -> Result<(), DispatchError> {
        self.dispatcher.dispatch(text).await?;
        self.state.history.add_sent(text);
        Ok(())
    }

    async fn send(&self, text: Option<String>) -> Notice {
        let from_draft = text.is_none();
        let text = text.unwrap_or_else(|| self.state.get_draft());

        match self.deliver(&text).await {
            Ok(()) => {
                if from_draft {
                    self.state.clear_draft();
                }
                Notice::success("Sent", format!("Message sent: {}", text))
            }
            Err(e) => Notice::from(&e),
        }
    }

    async fn teach(&self, letter: char) -> Notice {
        match braille::teach(&self.dispatcher, letter).await {
            Ok(cell) => {
                let letter = letter.to_ascii_uppercase();
                self.state.history.add_sent(&letter.to_string());
                Notice::success("Sent", format!("{} >> {}", letter, cell))
            }
            Err(TeachError::Dispatch(e)) => Notice::from(&e),
            Err(e) => Notice::error("Braille Alphabet", e.to_string()),
        }
    }

    async fn ask(&self, query: Option<String>) -> Notice {
        let query = query.unwrap_or_else(|| self.state.get_draft());

        self.state.set_loading(true);
        let result = self.assistant.ask(&query).await;
        self.state.set_loading(false);

        match result {
            Ok(response) => {
                self.state.set_ai_response(response.clone());
                Notice::success("AI Response", response)
            }
            Err(AskError::EmptyQuery) => Notice::error("AI Assistant", "Say something first"),
            Err(e) => {
                warn!("Assistant error: {}", e);
                Notice::error("AI Error", "Could not get response")
            }
        }
    }

    async fn send_reply(&self) -> Notice {
        let reply = self.state.get_ai_response().unwrap_or_default();
        if reply.trim().is_empty() {
            return Notice::error("Nothing to send", "Ask AI first");
        }

        match self.deliver(&reply).await {
            Ok(()) => Notice::success("Sent", "Braille message sent successfully!"),
            Err(e) => Notice::from(&e),
        }
    }

    async fn extract_pdf(&self, path: PathBuf) -> Notice {
        self.state.set_loading(true);
        let result = self.extractor.extract(&path).await;
        self.state.set_loading(false);

        match result {
            Ok(extract) => {
                let body = format!(
                    "{}: {} words extracted",
                    extract.file_name, extract.word_count
                );
                self.state.set_pdf(extract);
                Notice::success("PDF text extracted", body)
            }
            Err(e @ ExtractError::ServiceError(_)) => {
                warn!("Extraction failed: {}", e);
                Notice::error("Error", e.to_string())
            }
            Err(e) => Notice::error("Error", e.to_string()),
        }
    }

    async fn send_extracted(&self) -> Notice {
        if !self.connections.link_alive().await {
            return Notice::error(
                "Not Connected",
                "Please connect to Bluetooth device first",
            );
        }

        let text = self.state.get_pdf().map(|p| p.text).unwrap_or_default();
        if text.trim().is_empty() {
            return Notice::error("No Text", "No extracted text to send");
        }

        match self.deliver(&text).await {
            Ok(()) => Notice::success("Success", "Text sent to device successfully!"),
            Err(e) => Notice::from(&e),
        }
    }

    async fn start_listening(&mut self) -> Notice {
        if self.speech_stop.is_some() {
            return Notice::info("Speech", "Already listening");
        }

        let subscription = match self.recognizer.start(&self.locale).await {
            Ok(subscription) => subscription,
            Err(e) => {
                error!("Failed to start speech recognition: {:#}", e);
                return Notice::error("Speech", format!("Could not start listening: {}", e));
            }
        };

        self.speech_generation += 1;
        let generation = self.speech_generation;
        let (mut events, stop) = subscription.into_parts();
        self.speech_stop = Some(stop);

        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if event_tx.send(AppEvent::Speech { generation, event }).is_err() {
                    break;
                }
            }
        });

        info!("Listening ({}, {})", self.recognizer.backend_name(), self.locale);
        Notice::info("Speech", "Listening... speak clearly into the microphone")
    }

    fn stop_listening(&mut self) -> Option<Notice> {
        let stop = self.speech_stop.take()?;
        stop.stop();
        Some(Notice::info("Speech", "Stopped listening"))
    }

    fn handle_speech(&mut self, generation: u64, event: SpeechEvent) -> Option<Notice> {
        if generation != self.speech_generation {
            debug!("Ignoring event from old speech session {}", generation);
            return None;
        }

        self.state.apply_speech_event(&event);

        match event {
            SpeechEvent::Started => None,
            SpeechEvent::Results(alternatives) => alternatives
                .into_iter()
                .next()
                .map(|text| Notice::info("Heard", text)),
            SpeechEvent::Ended => {
                self.speech_stop = None;
                Some(Notice::info("Speech", "Recording ended"))
            }
            SpeechEvent::Error(e) => {
                warn!("Speech error: {}", e);
                Some(Notice::error("Speech error", e))
            }
        }
    }

    fn show_history(&self, limit: usize) -> Notice {
        let messages = self.state.history.get_recent(limit);
        if messages.is_empty() {
            return Notice::info("History", "No messages yet");
        }
        Notice::info("History", render_messages(&messages))
    }

    fn search_history(&self, query: &str) -> Notice {
        let messages = self.state.history.search(query, usize::MAX);
        if messages.is_empty() {
            return Notice::info("History", format!("No messages matching {:?}", query));
        }
        Notice::info("History", render_messages(&messages))
    }

    fn export_history(&self, path: &std::path::Path) -> Notice {
        match self.state.history.export(path) {
            Ok(count) => Notice::success(
                "History",
                format!("Exported {} messages to {}", count, path.display()),
            ),
            Err(e) => {
                warn!("History export failed: {:#}", e);
                Notice::error("History", format!("Export failed: {}", e))
            }
        }
    }

    fn show_alphabet(&self) -> Notice {
        let mut body = String::new();
        for (letter, cell) in braille::alphabet() {
            let _ = writeln!(body, "{} >> {}", letter, cell);
        }
        Notice::info("Braille Alphabet", body.trim_end())
    }

    async fn status(&self) -> Notice {
        let mut body = String::new();
        match self.connections.connected_device() {
            Some(device) => {
                let link = if self.connections.link_alive().await {
                    "up"
                } else {
                    "down"
                };
                let _ = writeln!(body, "Connected to {} (link {})", device, link);
            }
            None => {
                let _ = writeln!(body, "{}", self.connections.session().connection_state().as_str());
            }
        }
        let _ = writeln!(body, "Transport: {}", self.connections.backend_name());
        let _ = writeln!(
            body,
            "Microphone: {}",
            if self.state.is_listening() { "listening" } else { "idle" }
        );
        let _ = writeln!(body, "Draft: {:?}", self.state.get_draft());
        if let Some(response) = self.state.get_ai_response() {
            let _ = writeln!(body, "AI response: {} chars", response.len());
        }
        if let Some(pdf) = self.state.get_pdf() {
            let _ = writeln!(body, "PDF: {} ({} words)", pdf.file_name, pdf.word_count);
        }
        let _ = write!(body, "Messages sent: {}", self.state.history.count());
        Notice::info("Status", body)
    }
}

/// Oldest first, one line per message.
fn render_messages(messages: &[Message]) -> String {
    let mut body = String::new();
    for message in messages.iter().rev() {
        let _ = writeln!(
            body,
            "[{}] {}",
            message.timestamp.format("%H:%M:%S"),
            message.text
        );
    }
    body.trim_end().to_string()
}
