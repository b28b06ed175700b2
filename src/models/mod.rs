//! Data models for the Slack Web API surface this tool touches.
//!
//! All response types parse tolerantly: Slack omits fields freely between
//! conversation kinds and app versions, so nearly everything is
//! `#[serde(default)]` and optional.
//!
//! - `Channel` and conversation listing/opening responses
//! - `Message`, history/replies/search/post responses
//! - `User`, `AuthTest`
//! - `ClientCounts`, `UserPrefs`: unread activity and muted/VIP prefs
//! - `StarredItem`, `PinnedItem`, `SavedItem`

pub mod activity;
pub mod channel;
pub mod message;
pub mod saved;
pub mod user;

pub use activity::{ClientCounts, ConversationCount, PrefsResponse, ThreadCounts, UserPrefs};
pub use channel::{Channel, ConversationsList, OpenedConversation, ResponseMetadata};
pub use message::{
    FileInfo, HistoryResponse, Message, PostedMessage, SearchResponse, SearchResults,
};
pub use saved::{PinnedItem, PinsResponse, SavedItem, SavedResponse, StarredItem, StarsResponse};
pub use user::{AuthTest, User, UserProfile, UsersList};
