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

//! Speech recognition through an external transcriber process.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{SpeechEvent, SpeechRecognizer, SpeechSubscription};

/// Runs a transcriber that prints one utterance per stdout line.
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
}

impl CommandRecognizer {
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| anyhow!("Speech command is empty"))?;

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl SpeechRecognizer for CommandRecognizer {
    fn backend_name(&self) -> &'static str {
        "External command"
    }

    async fn start(&self, locale: &str) -> Result<SpeechSubscription> {
        let args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace("{locale}", locale))
            .collect();

        debug!("Running: {} {:?}", self.program, args);

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| anyhow!("Failed to run {}: {}", self.program, e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("{} has no stdout", self.program))?;

        let (subscription, event_tx, mut stop_rx) = SpeechSubscription::channel();
        let program = self.program.clone();

        tokio::spawn(async move {
            let _ = event_tx.send(SpeechEvent::Started).await;
            let mut lines = BufReader::new(stdout).lines();

            loop {
                tokio::select! {
                    _ = &mut stop_rx => {
                        debug!("Stopping {}", program);
                        if let Err(e) = child.kill().await {
                            warn!("Failed to stop {}: {}", program, e);
                        }
                        break;
                    }
                    line = lines.next_line() => match line {
                        Ok(Some(line)) => {
                            let text = line.trim();
                            if text.is_empty() {
                                continue;
                            }
                            info!("Speech recognized: {}", text);
                            let event = SpeechEvent::Results(vec![text.to_string()]);
                            if event_tx.send(event).await.is_err() {
                                let _ = child.kill().await;
                                break;
                            }
                        }
                        Ok(None) => {
                            debug!("{} closed its output", program);
                            break;
                        }
                        Err(e) => {
                            let _ = event_tx.send(SpeechEvent::Error(e.to_string())).await;
                            let _ = child.kill().await;
                            break;
                        }
                    }
                }
            }

            match child.wait().await {
                Ok(status) if !status.success() && status.code().is_some() => {
                    let _ = event_tx
                        .send(SpeechEvent::Error(format!("{} exited with {}", program, status)))
                        .await;
                }
                Ok(_) => {}
                Err(e) => warn!("Failed to reap {}: {}", program, e),
            }

            let _ = event_tx.send(SpeechEvent::Ended).await;
        });

        Ok(subscription)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandRecognizer {
        CommandRecognizer::new(&["sh".to_string(), "-c".to_string(), script.to_string()]).unwrap()
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(CommandRecognizer::new(&[]).is_err());
    }

    #[tokio::test]
    async fn test_lines_become_results() {
        let recognizer = sh("printf 'hello world\\n\\nsecond\\n'");
        let mut subscription = recognizer.start("en-US").await.unwrap();

        let mut events = Vec::new();
        while let Some(event) = subscription.next().await {
            events.push(event);
        }

        assert_eq!(
            events,
            vec![
                SpeechEvent::Started,
                SpeechEvent::Results(vec!["hello world".to_string()]),
                SpeechEvent::Results(vec!["second".to_string()]),
                SpeechEvent::Ended,
            ]
        );
    }

    #[tokio::test]
    async fn test_locale_substitution() {
        let recognizer = CommandRecognizer::new(&[
            "echo".to_string(),
            "lang={locale}".to_string(),
        ])
        .unwrap();
        let mut subscription = recognizer.start("hi-IN").await.unwrap();

        assert_eq!(subscription.next().await, Some(SpeechEvent::Started));
        assert_eq!(
            subscription.next().await,
            Some(SpeechEvent::Results(vec!["lang=hi-IN".to_string()]))
        );
    }

    #[tokio::test]
    async fn test_stop_ends_long_running_command() {
        let recognizer = sh("echo ready; sleep 30");
        let mut subscription = recognizer.start("en-US").await.unwrap();

        assert_eq!(subscription.next().await, Some(SpeechEvent::Started));
        assert_eq!(
            subscription.next().await,
            Some(SpeechEvent::Results(vec!["ready".to_string()]))
        );

        subscription.stop();
        let mut last = None;
        while let Some(event) = subscription.next().await {
            last = Some(event);
        }
        assert_eq!(last, Some(SpeechEvent::Ended));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let recognizer =
            CommandRecognizer::new(&["/nonexistent/transcriber".to_string()]).unwrap();
        assert!(recognizer.start("en-US").await.is_err());
    }
}
