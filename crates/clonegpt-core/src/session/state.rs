use serde::{Deserialize, Serialize};

/// Who the current tab is signed in as.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Anonymous,
    Guest { id: String },
    Authenticated { user_id: String },
}

impl SessionState {
    /// Identity used to scope per-user cache entries.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Guest { id } => Some(id),
            Self::Authenticated { user_id } => Some(user_id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}
