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

//! Application state management.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::remote::PdfExtract;
use crate::speech::SpeechEvent;
use crate::storage::History;

/// Screen-local state shared by the event processor and the console.
pub struct AppState {
    /// Composer text; typed input and speech results both land here.
    pub draft: RwLock<String>,

    /// Whether the microphone is listening.
    pub listening: RwLock<bool>,

    /// Last successful assistant reply.
    pub ai_response: RwLock<Option<String>>,

    /// A remote request is in progress.
    pub loading: RwLock<bool>,

    /// Most recent PDF extraction.
    pub pdf: RwLock<Option<PdfExtract>>,

    /// Messages sent this session.
    pub history: History,
}

impl AppState {
    pub fn new(max_history: usize) -> Arc<Self> {
        Arc::new(Self {
            draft: RwLock::new(String::new()),
            listening: RwLock::new(false),
            ai_response: RwLock::new(None),
            loading: RwLock::new(false),
            pdf: RwLock::new(None),
            history: History::new(max_history),
        })
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        *self.draft.write() = text.into();
    }

    pub fn get_draft(&self) -> String {
        self.draft.read().clone()
    }

    pub fn clear_draft(&self) {
        self.draft.write().clear();
    }

    pub fn set_listening(&self, listening: bool) {
        *self.listening.write() = listening;
    }

    pub fn is_listening(&self) -> bool {
        *self.listening.read()
    }

    pub fn set_ai_response(&self, response: String) {
        *self.ai_response.write() = Some(response);
    }

    pub fn get_ai_response(&self) -> Option<String> {
        self.ai_response.read().clone()
    }

    pub fn set_loading(&self, loading: bool) {
        *self.loading.write() = loading;
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.read()
    }

    pub fn set_pdf(&self, extract: PdfExtract) {
        *self.pdf.write() = Some(extract);
    }

    pub fn get_pdf(&self) -> Option<PdfExtract> {
        self.pdf.read().clone()
    }

    /// Fold a recognition event into the state.
    pub fn apply_speech_event(&self, event: &SpeechEvent) {
        match event {
            SpeechEvent::Started => self.set_listening(true),
            SpeechEvent::Ended | SpeechEvent::Error(_) => self.set_listening(false),
            SpeechEvent::Results(_) => {
                if let Some(text) = event.best_transcript() {
                    self.set_draft(text);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_results_fill_draft() {
        let state = AppState::new(10);
        state.set_draft("typed");

        state.apply_speech_event(&SpeechEvent::Started);
        assert!(state.is_listening());

        state.apply_speech_event(&SpeechEvent::Results(vec!["spoken".into(), "broken".into()]));
        assert_eq!(state.get_draft(), "spoken");

        state.apply_speech_event(&SpeechEvent::Results(vec![]));
        assert_eq!(state.get_draft(), "spoken");

        state.apply_speech_event(&SpeechEvent::Ended);
        assert!(!state.is_listening());
    }

    #[test]
    fn test_speech_error_stops_listening() {
        let state = AppState::new(10);
        state.apply_speech_event(&SpeechEvent::Started);
        state.apply_speech_event(&SpeechEvent::Error("no match".into()));
        assert!(!state.is_listening());
    }
}
