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

//! Recognizer that replays fixed transcripts.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::info;

use super::{SpeechEvent, SpeechRecognizer, SpeechSubscription};

/// Emits `Started`, one `Results` per transcript, then `Ended`.
pub struct ScriptedRecognizer {
    transcripts: Vec<String>,
}

impl ScriptedRecognizer {
    pub fn new(transcripts: Vec<String>) -> Self {
        Self { transcripts }
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    fn backend_name(&self) -> &'static str {
        "Scripted"
    }

    async fn start(&self, locale: &str) -> Result<SpeechSubscription> {
        info!("[SCRIPTED] Listening ({})", locale);

        let (subscription, event_tx, mut stop_rx) = SpeechSubscription::channel();
        let transcripts = self.transcripts.clone();

        tokio::spawn(async move {
            let _ = event_tx.send(SpeechEvent::Started).await;
            for text in transcripts {
                if !matches!(stop_rx.try_recv(), Err(TryRecvError::Empty)) {
                    break;
                }
                if event_tx.send(SpeechEvent::Results(vec![text])).await.is_err() {
                    break;
                }
            }
            let _ = event_tx.send(SpeechEvent::Ended).await;
        });

        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_transcripts() {
        let recognizer = ScriptedRecognizer::new(vec!["test".to_string()]);
        let mut subscription = recognizer.start("en-US").await.unwrap();

        assert_eq!(subscription.next().await, Some(SpeechEvent::Started));
        assert_eq!(
            subscription.next().await,
            Some(SpeechEvent::Results(vec!["test".to_string()]))
        );
        assert_eq!(subscription.next().await, Some(SpeechEvent::Ended));
        assert_eq!(subscription.next().await, None);
    }

    #[tokio::test]
    async fn test_empty_script() {
        let recognizer = ScriptedRecognizer::new(Vec::new());
        let mut subscription = recognizer.start("en-US").await.unwrap();

        assert_eq!(subscription.next().await, Some(SpeechEvent::Started));
        assert_eq!(subscription.next().await, Some(SpeechEvent::Ended));
    }
}
