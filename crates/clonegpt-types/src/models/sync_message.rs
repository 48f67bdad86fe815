//! Messages broadcast between tabs of one session.

use serde::{Deserialize, Serialize};

/// Session-affecting events. Serialized as `{ "type": "LOGOUT", "payload": {..} }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionSyncMessage {
    /// The user signed out in another tab
    Logout {
        #[serde(rename = "userId", default)]
        user_id: Option<String>,
    },
    /// Another tab established a new session; caches tied to the old one are stale
    SessionRefreshed {
        #[serde(rename = "userId")]
        user_id: String,
    },
}

impl SessionSyncMessage {
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::Logout { .. } => "LOGOUT",
            Self::SessionRefreshed { .. } => "SESSION_REFRESHED",
        }
    }
}
