//! Starred, pinned, and saved-for-later items.

use serde::Deserialize;

use super::message::{FileInfo, Message};

#[derive(Debug, Deserialize)]
pub struct StarsResponse {
    #[serde(default)]
    pub items: Vec<StarredItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StarredItem {
    /// "message", "channel", "im", or "file".
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub file: Option<FileInfo>,
}

#[derive(Debug, Deserialize)]
pub struct PinsResponse {
    #[serde(default)]
    pub items: Vec<PinnedItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PinnedItem {
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct SavedResponse {
    #[serde(default)]
    pub saved_items: Vec<SavedItem>,
    #[serde(default)]
    pub counts: Option<SavedCounts>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavedItem {
    /// Channel id the saved message lives in.
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub ts: String,
    /// "in_progress" or "completed".
    #[serde(default)]
    pub state: Option<String>,
    /// Epoch seconds.
    #[serde(default)]
    pub date_created: Option<i64>,
}

impl SavedItem {
    pub fn is_completed(&self) -> bool {
        self.state.as_deref() == Some("completed")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SavedCounts {
    #[serde(default)]
    pub uncompleted_count: u32,
    #[serde(default)]
    pub completed_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stars_mixed_item_kinds() {
        let json = r#"{
            "ok": true,
            "items": [
                {"type": "message", "channel": "C1",
                 "message": {"user": "U1", "text": "starred", "ts": "1.0"}},
                {"type": "channel", "channel": "C2"},
                {"type": "file", "file": {"name": "doc.txt"}}
            ]
        }"#;
        let stars: StarsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(stars.items.len(), 3);
        assert_eq!(stars.items[0].kind, "message");
        assert!(stars.items[1].message.is_none());
    }

    #[test]
    fn test_parse_saved_items() {
        let json = r#"{
            "ok": true,
            "saved_items": [
                {"item_id": "C1", "ts": "1712345678.000200", "state": "in_progress",
                 "date_created": 1712345000},
                {"item_id": "C2", "ts": "1712345679.000300", "state": "completed"}
            ],
            "counts": {"uncompleted_count": 1, "completed_count": 1}
        }"#;
        let saved: SavedResponse = serde_json::from_str(json).unwrap();
        assert_eq!(saved.saved_items.len(), 2);
        assert!(!saved.saved_items[0].is_completed());
        assert!(saved.saved_items[1].is_completed());
        assert_eq!(saved.counts.unwrap().uncompleted_count, 1);
    }
}
