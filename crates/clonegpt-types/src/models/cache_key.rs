//! Composite keys for client-side cache entries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One component of a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyPart {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{}", i),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for KeyPart {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&String> for KeyPart {
    fn from(s: &String) -> Self {
        Self::Str(s.clone())
    }
}

impl From<i64> for KeyPart {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<u32> for KeyPart {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<bool> for KeyPart {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Ordered tuple of primitives identifying one cached entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(Vec<KeyPart>);

impl CacheKey {
    pub fn new<I, P>(parts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<KeyPart>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// Append a component, returning the extended key.
    pub fn with(mut self, part: impl Into<KeyPart>) -> Self {
        self.0.push(part.into());
        self
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Prefix match, used to drop whole families of entries at once.
    pub fn starts_with(&self, prefix: &CacheKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

/// Build a [`CacheKey`] from heterogeneous parts.
///
/// ```
/// use clonegpt_types::cache_key;
/// let key = cache_key!["chats", "user-1", 2_i64];
/// assert_eq!(key.to_string(), "chats/user-1/2");
/// ```
#[macro_export]
macro_rules! cache_key {
    ($($part:expr),* $(,)?) => {
        $crate::models::CacheKey::default()$(.with($part))*
    };
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_and_display() {
        let key = CacheKey::new(["rate-limit", "messages", "user-1"]);
        assert!(key.starts_with(&CacheKey::new(["rate-limit"])));
        assert!(!key.starts_with(&CacheKey::new(["chats"])));
        assert_eq!(key.to_string(), "rate-limit/messages/user-1");
    }

    #[test]
    fn test_mixed_parts_serialize_as_tuple() {
        let key = cache_key!["chat", 7_i64, true];
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#"["chat",7,true]"#);
        let back: CacheKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
