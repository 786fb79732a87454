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

//! In-memory message history.
//!
//! Messages live only as long as the process; nothing is written to disk
//! unless the user exports it.

use anyhow::Result;
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Direction of a message relative to this app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::Sent => "SENT",
            Direction::Received => "RECV",
        }
    }
}

/// A single history entry.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub direction: Direction,
    pub timestamp: DateTime<Local>,
}

impl Message {
    pub fn new(text: impl Into<String>, direction: Direction) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            direction,
            timestamp: Local::now(),
        }
    }

    pub fn sent(text: impl Into<String>) -> Self {
        Self::new(text, Direction::Sent)
    }
}

/// Bounded message log, newest last.
#[derive(Clone)]
pub struct History {
    entries: Arc<Mutex<VecDeque<Message>>>,
    max_entries: usize,
}

impl History {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::new())),
            max_entries: max_entries.max(1),
        }
    }

    /// Record a sent message.
    pub fn add_sent(&self, text: &str) -> Message {
        self.add(Message::sent(text))
    }

    /// Append a message, dropping the oldest beyond `max_entries`.
    pub fn add(&self, message: Message) -> Message {
        let mut entries = self.entries.lock();
        entries.push_back(message.clone());
        while entries.len() > self.max_entries {
            entries.pop_front();
        }
        message
    }

    /// Most recent messages, newest first.
    pub fn get_recent(&self, limit: usize) -> Vec<Message> {
        self.entries.lock().iter().rev().take(limit).cloned().collect()
    }

    /// Case-insensitive substring search, newest first.
    pub fn search(&self, query: &str, limit: usize) -> Vec<Message> {
        let needle = query.to_lowercase();
        self.entries
            .lock()
            .iter()
            .rev()
            .filter(|m| m.text.to_lowercase().contains(&needle))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Export history to a text file, oldest first.
    pub fn export(&self, path: &Path) -> Result<usize> {
        let entries: Vec<Message> = self.entries.lock().iter().cloned().collect();
        let mut content = String::new();

        for entry in &entries {
            content.push_str(&format!(
                "[{}] {}: {}\n",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                entry.direction.as_str(),
                entry.text
            ));
        }

        std::fs::write(path, content)?;
        info!("Exported {} messages to {:?}", entries.len(), path);
        Ok(entries.len())
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
        info!("History cleared");
    }

    pub fn count(&self) -> usize {
        self.entries.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_history_basic() {
        let history = History::new(10);

        history.add_sent("Hello world");
        history.add(Message::new("ACK", Direction::Received));

        let entries = history.get_recent(10);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "ACK");
        assert_eq!(entries[0].direction, Direction::Received);
        assert_eq!(entries[1].text, "Hello world");
        assert_eq!(entries[1].direction, Direction::Sent);
        assert_ne!(entries[0].id, entries[1].id);
    }

    #[test]
    fn test_history_search() {
        let history = History::new(10);

        history.add_sent("Hello world");
        history.add_sent("hello there");
        history.add_sent("Goodbye");

        let results = history.search("HELLO", 10);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "hello there");
    }

    #[test]
    fn test_history_is_bounded() {
        let history = History::new(2);
        history.add_sent("one");
        history.add_sent("two");
        history.add_sent("three");

        assert_eq!(history.count(), 2);
        let texts: Vec<_> = history.get_recent(5).into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["three", "two"]);
    }

    #[test]
    fn test_history_export_and_clear() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.txt");
        let history = History::new(10);
        history.add_sent("first");
        history.add_sent("second");

        assert_eq!(history.export(&path).unwrap(), 2);
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("SENT: first"));
        assert!(lines[1].ends_with("SENT: second"));

        history.clear();
        assert_eq!(history.count(), 0);
    }
}
