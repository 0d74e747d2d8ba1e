use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Observable connection facets shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusKey {
    IceGathering,
    Ice,
    Peer,
    Signaling,
    Streaming,
    StreamEvent,
}

impl StatusKey {
    pub const ALL: [StatusKey; 6] = [
        StatusKey::IceGathering,
        StatusKey::Ice,
        StatusKey::Peer,
        StatusKey::Signaling,
        StatusKey::Streaming,
        StatusKey::StreamEvent,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StatusKey::IceGathering => "ICE gathering status",
            StatusKey::Ice => "ICE status",
            StatusKey::Peer => "Peer connection status",
            StatusKey::Signaling => "Signaling status",
            StatusKey::Streaming => "Streaming status",
            StatusKey::StreamEvent => "Last stream event",
        }
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single status change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub key: StatusKey,
    pub value: String,
}

/// Latest value per status key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusBoard {
    values: BTreeMap<StatusKey, String>,
    tracks_stream_events: bool,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Board that also clears `StreamEvent` when the connection resets
    pub fn with_stream_events() -> Self {
        Self {
            values: BTreeMap::new(),
            tracks_stream_events: true,
        }
    }

    /// Set a value; returns the update when it differs from the current one
    pub fn update(&mut self, key: StatusKey, value: impl Into<String>) -> Option<StatusUpdate> {
        let value = value.into();
        if self.get(key) == value {
            return None;
        }

        self.values.insert(key, value.clone());
        Some(StatusUpdate { key, value })
    }

    pub fn get(&self, key: StatusKey) -> &str {
        self.values.get(&key).map(String::as_str).unwrap_or("")
    }

    /// Clear connection facets after the peer connection is gone.
    /// `Streaming` is left as-is.
    pub fn reset_connection(&mut self) -> Vec<StatusUpdate> {
        let mut keys = vec![
            StatusKey::IceGathering,
            StatusKey::Signaling,
            StatusKey::Ice,
            StatusKey::Peer,
        ];
        if self.tracks_stream_events {
            keys.push(StatusKey::StreamEvent);
        }

        keys.into_iter()
            .filter_map(|key| self.update(key, ""))
            .collect()
    }

    pub fn snapshot(&self) -> Vec<(StatusKey, String)> {
        StatusKey::ALL
            .iter()
            .map(|key| (*key, self.get(*key).to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_reports_changes_only() {
        let mut board = StatusBoard::new();

        let update = board.update(StatusKey::Peer, "connecting").unwrap();
        assert_eq!(update.key, StatusKey::Peer);
        assert_eq!(update.value, "connecting");

        assert!(board.update(StatusKey::Peer, "connecting").is_none());
        assert_eq!(board.get(StatusKey::Peer), "connecting");
    }

    #[test]
    fn test_unset_key_is_empty() {
        let board = StatusBoard::new();
        assert_eq!(board.get(StatusKey::Ice), "");
        assert_eq!(board.snapshot().len(), 6);
    }

    #[test]
    fn test_reset_keeps_streaming() {
        let mut board = StatusBoard::new();
        board.update(StatusKey::Ice, "connected");
        board.update(StatusKey::Peer, "connected");
        board.update(StatusKey::Streaming, "streaming");
        board.update(StatusKey::StreamEvent, "done");

        let updates = board.reset_connection();
        assert_eq!(updates.len(), 2);
        assert_eq!(board.get(StatusKey::Ice), "");
        assert_eq!(board.get(StatusKey::Streaming), "streaming");
        assert_eq!(board.get(StatusKey::StreamEvent), "done");
    }

    #[test]
    fn test_reset_clears_stream_event_when_tracked() {
        let mut board = StatusBoard::with_stream_events();
        board.update(StatusKey::StreamEvent, "ready");

        board.reset_connection();
        assert_eq!(board.get(StatusKey::StreamEvent), "");
    }
}
