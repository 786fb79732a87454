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

//! Line-oriented console front end.

use anyhow::Result;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::events::{AppEvent, Notice, NoticeLevel};

const DEFAULT_HISTORY_LIMIT: usize = 20;

pub const HELP: &str = "\
Commands:
  devices              list paired devices
  connect <id|name>    connect to a paired device
  disconnect           close the current link
  type <text>          put text in the composer
  send [text]          send text, or the composer text
  listen | stop        start or stop speech input
  ask [question]       ask the AI assistant, or ask with the composer text
  reply                send the last AI response
  pdf <path>           extract text from a PDF
  sendpdf              send the extracted PDF text
  teach <letter>       send one letter of the Braille alphabet
  alphabet             show the Braille alphabet
  history [n]          show the last n sent messages
  history search <q>   find sent messages containing q
  history clear        forget all sent messages
  export <path>        write sent messages to a text file
  status               show connection and composer state
  help                 show this text
  quit                 exit";

/// Actions that can be triggered from the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleAction {
    Event(AppEvent),
    Help,
    Quit,
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<ConsoleAction>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    let optional = |rest: &str| (!rest.is_empty()).then(|| rest.to_string());

    let event = match command.to_ascii_lowercase().as_str() {
        "help" | "?" => return Ok(Some(ConsoleAction::Help)),
        "quit" | "exit" => return Ok(Some(ConsoleAction::Quit)),
        "devices" | "ls" => AppEvent::ListDevices,
        "connect" => {
            if rest.is_empty() {
                return Err("usage: connect <id|name>".to_string());
            }
            AppEvent::Connect(rest.to_string())
        }
        "disconnect" => AppEvent::Disconnect,
        "type" => AppEvent::SetDraft(rest.to_string()),
        "send" => AppEvent::Send(optional(rest)),
        "listen" => AppEvent::StartListening,
        "stop" => AppEvent::StopListening,
        "ask" => AppEvent::Ask(optional(rest)),
        "reply" => AppEvent::SendReply,
        "pdf" => {
            if rest.is_empty() {
                return Err("usage: pdf <path>".to_string());
            }
            AppEvent::ExtractPdf(PathBuf::from(rest))
        }
        "sendpdf" => AppEvent::SendExtracted,
        "teach" => {
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(letter), None) => AppEvent::Teach(letter),
                _ => return Err("usage: teach <letter>".to_string()),
            }
        }
        "alphabet" => AppEvent::ShowAlphabet,
        "history" => match rest.split_once(char::is_whitespace) {
            Some(("search", query)) if !query.trim().is_empty() => {
                AppEvent::SearchHistory(query.trim().to_string())
            }
            _ if rest == "search" => return Err("usage: history search <text>".to_string()),
            _ if rest == "clear" => AppEvent::ClearHistory,
            _ if rest.is_empty() => AppEvent::ShowHistory(DEFAULT_HISTORY_LIMIT),
            _ => AppEvent::ShowHistory(
                rest.parse()
                    .map_err(|_| format!("not a number: {}", rest))?,
            ),
        },
        "export" => {
            if rest.is_empty() {
                return Err("usage: export <path>".to_string());
            }
            AppEvent::ExportHistory(PathBuf::from(rest))
        }
        "status" => AppEvent::Status,
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };

    Ok(Some(ConsoleAction::Event(event)))
}

/// Render a notice for the terminal.
pub fn format_notice(notice: &Notice) -> String {
    let tag = match notice.level {
        NoticeLevel::Info => "*",
        NoticeLevel::Success => "+",
        NoticeLevel::Error => "!",
    };
    if notice.body.contains('\n') {
        let body: String = notice
            .body
            .lines()
            .map(|line| format!("    {}\n", line))
            .collect();
        format!("[{}] {}\n{}", tag, notice.title, body.trim_end())
    } else {
        format!("[{}] {}: {}", tag, notice.title, notice.body)
    }
}

pub fn print_notice(notice: &Notice) {
    println!("{}", format_notice(notice));
}

/// Read commands from stdin until EOF.
pub fn run_console() -> Result<mpsc::UnboundedReceiver<ConsoleAction>> {
    let (action_tx, action_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("stdin closed");
                    let _ = action_tx.send(ConsoleAction::Quit);
                    break;
                }
                Err(e) => {
                    eprintln!("Failed to read input: {}", e);
                    let _ = action_tx.send(ConsoleAction::Quit);
                    break;
                }
            };

            match parse_line(&line) {
                Ok(Some(action)) => {
                    if action_tx.send(action).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(message) => eprintln!("{}", message),
            }
        }
    });

    info!("Console started");

    Ok(action_rx)
}
