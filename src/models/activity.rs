//! Unread/mention counts and notification preferences.
//!
//! `client.counts` and `users.prefs.get` are client-session endpoints used
//! by the official apps rather than the documented bot API; their shapes
//! here are parsed tolerantly.

use std::collections::HashSet;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ClientCounts {
    #[serde(default)]
    pub channels: Vec<ConversationCount>,
    #[serde(default)]
    pub mpims: Vec<ConversationCount>,
    #[serde(default)]
    pub ims: Vec<ConversationCount>,
    #[serde(default)]
    pub threads: Option<ThreadCounts>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationCount {
    pub id: String,
    #[serde(default)]
    pub has_unreads: bool,
    #[serde(default)]
    pub mention_count: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreadCounts {
    #[serde(default)]
    pub has_unreads: bool,
    #[serde(default)]
    pub mention_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct PrefsResponse {
    #[serde(default)]
    pub prefs: UserPrefs,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserPrefs {
    /// Nested JSON string: `{"channels": {"C…": {"muted": true}}}`.
    #[serde(default)]
    pub all_notifications_prefs: Option<String>,
    /// Comma-separated user ids.
    #[serde(default)]
    pub vip_users: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NotificationPrefs {
    #[serde(default)]
    channels: std::collections::HashMap<String, ChannelNotificationPrefs>,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelNotificationPrefs {
    #[serde(default)]
    muted: bool,
}

impl UserPrefs {
    /// Channel ids the user has muted. Unparseable prefs read as none.
    pub fn muted_channels(&self) -> HashSet<String> {
        let Some(raw) = self.all_notifications_prefs.as_deref() else {
            return HashSet::new();
        };
        match serde_json::from_str::<NotificationPrefs>(raw) {
            Ok(prefs) => prefs
                .channels
                .into_iter()
                .filter(|(_, p)| p.muted)
                .map(|(id, _)| id)
                .collect(),
            Err(_) => HashSet::new(),
        }
    }

    pub fn vip_user_ids(&self) -> Vec<String> {
        self.vip_users
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muted_channels_from_nested_json() {
        let prefs = UserPrefs {
            all_notifications_prefs: Some(
                r#"{"channels": {"C1": {"muted": true}, "C2": {"muted": false}, "C3": {"muted": true}}}"#
                    .to_string(),
            ),
            vip_users: None,
        };
        let muted = prefs.muted_channels();
        assert_eq!(muted.len(), 2);
        assert!(muted.contains("C1"));
        assert!(muted.contains("C3"));
    }

    #[test]
    fn test_muted_channels_tolerates_garbage() {
        let prefs = UserPrefs {
            all_notifications_prefs: Some("not json".to_string()),
            vip_users: None,
        };
        assert!(prefs.muted_channels().is_empty());
        assert!(UserPrefs::default().muted_channels().is_empty());
    }

    #[test]
    fn test_vip_users_split() {
        let prefs = UserPrefs {
            all_notifications_prefs: None,
            vip_users: Some("U1,U2,".to_string()),
        };
        assert_eq!(prefs.vip_user_ids(), vec!["U1", "U2"]);
        assert!(UserPrefs::default().vip_user_ids().is_empty());
    }

    #[test]
    fn test_parse_client_counts() {
        let json = r#"{
            "ok": true,
            "channels": [{"id": "C1", "has_unreads": true, "mention_count": 2}],
            "mpims": [],
            "ims": [{"id": "D1", "has_unreads": false, "mention_count": 0}],
            "threads": {"has_unreads": true, "mention_count": 1}
        }"#;
        let counts: ClientCounts = serde_json::from_str(json).unwrap();
        assert_eq!(counts.channels[0].mention_count, 2);
        assert!(counts.threads.unwrap().has_unreads);
    }
}
