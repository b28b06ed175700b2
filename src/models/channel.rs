use serde::Deserialize;

/// A conversation: public/private channel, group DM, or DM.
#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_normalized: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub num_members: Option<u32>,
    /// Counterpart user id, present for DMs only.
    #[serde(default)]
    pub user: Option<String>,
}

impl Channel {
    /// True if `name` matches either the display or normalized name.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name) || self.name_normalized.as_deref() == Some(name)
    }
}

/// Cursor marker shared by all paginated list responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConversationsList {
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct OpenedConversation {
    pub channel: ConversationRef,
}

#[derive(Debug, Deserialize)]
pub struct ConversationRef {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_conversations_list() {
        let json = r#"{
            "ok": true,
            "channels": [
                {"id": "C08A8AQ2AFP", "name": "ai-coding", "name_normalized": "ai-coding",
                 "is_private": false, "num_members": 12},
                {"id": "D0AAAAAAA", "user": "U0BBBBBBB", "is_private": true}
            ],
            "response_metadata": {"next_cursor": "dGVhbTpD"}
        }"#;

        let list: ConversationsList = serde_json::from_str(json).unwrap();
        assert_eq!(list.channels.len(), 2);
        assert!(list.channels[0].is_named("ai-coding"));
        assert_eq!(list.channels[1].user.as_deref(), Some("U0BBBBBBB"));
        assert_eq!(
            list.response_metadata.unwrap().next_cursor.as_deref(),
            Some("dGVhbTpD")
        );
    }
}
