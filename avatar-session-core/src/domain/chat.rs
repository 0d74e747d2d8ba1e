use serde::{Deserialize, Serialize};
use std::fmt;

/// Message posted to an agent chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    pub created_at: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
            created_at: created_at.into(),
        }
    }
}

/// One line of the chat transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEntry {
    User(String),
    /// Agent answer, recorded once the avatar starts speaking it
    Agent(String),
    /// Text-only reply (account out of credits, no video)
    TextOnly(String),
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryEntry::User(text) => write!(f, "User: {}", text),
            HistoryEntry::Agent(text) => write!(f, "Agent: {}", text),
            HistoryEntry::TextOnly(text) => write!(f, "Agent (text only): {}", text),
        }
    }
}

/// Append-only chat transcript
#[derive(Debug, Clone, Default)]
pub struct MessageHistory {
    entries: Vec<HistoryEntry>,
}

impl MessageHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
