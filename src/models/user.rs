use serde::Deserialize;

use super::channel::ResponseMetadata;

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub profile: Option<UserProfile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub status_text: Option<String>,
}

impl User {
    /// Best human-readable name: real name, then display name, then the
    /// login name, then the raw id.
    pub fn display_name(&self) -> &str {
        self.real_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.profile
                    .as_ref()
                    .and_then(|p| p.display_name.as_deref())
                    .filter(|s| !s.is_empty())
            })
            .or_else(|| self.name.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or(&self.id)
    }

    /// Case-insensitive match against any of the user's names.
    pub fn matches_name(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [
            self.name.as_deref(),
            self.real_name.as_deref(),
            self.profile.as_ref().and_then(|p| p.display_name.as_deref()),
        ]
        .iter()
        .flatten()
        .any(|n| n.to_lowercase() == needle)
    }
}

#[derive(Debug, Deserialize)]
pub struct UsersList {
    #[serde(default)]
    pub members: Vec<User>,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

/// `auth.test` identity check.
#[derive(Debug, Deserialize)]
pub struct AuthTest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}
