use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub ts: String,
    #[serde(default)]
    pub reply_count: Option<u32>,
    #[serde(default)]
    pub files: Vec<FileInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mimetype: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
pub struct PostedMessage {
    #[serde(default)]
    pub ts: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub messages: Option<SearchResults>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub matches: Vec<SearchMatch>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchMatch {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub ts: String,
    #[serde(default)]
    pub channel: Option<SearchChannel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchChannel {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_history_with_files_and_threads() {
        let json = r#"{
            "ok": true,
            "messages": [
                {"user": "U123", "text": "see attached", "ts": "1712345678.000200",
                 "reply_count": 3,
                 "files": [{"name": "plan.pdf", "mimetype": "application/pdf"}]},
                {"user": "U456", "text": "plain", "ts": "1712345679.000300"}
            ]
        }"#;

        let history: HistoryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(history.messages.len(), 2);
        assert_eq!(history.messages[0].reply_count, Some(3));
        assert_eq!(history.messages[0].files[0].name.as_deref(), Some("plan.pdf"));
        assert!(history.messages[1].files.is_empty());
    }

    #[test]
    fn test_parse_search_response() {
        let json = r#"{
            "ok": true,
            "messages": {
                "total": 2,
                "matches": [
                    {"user": "U123", "text": "hit", "ts": "1.2",
                     "channel": {"id": "C1", "name": "general"}}
                ]
            }
        }"#;

        let search: SearchResponse = serde_json::from_str(json).unwrap();
        let results = search.messages.unwrap();
        assert_eq!(results.total, 2);
        assert_eq!(
            results.matches[0].channel.as_ref().unwrap().name.as_deref(),
            Some("general")
        );
    }
}
