//! Post and comment models as served by the social API.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Identifier of a post.
///
/// The API hands out numeric ids, but the saved-posts list has historically
/// held strings too. `Number(42)` and `Text("42")` are different ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostId {
    /// Numeric identifier.
    Number(i64),
    /// String identifier.
    Text(String),
}

impl PostId {
    /// Accept a JSON value only if it is an integral number or a string.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_i64().map(Self::Number),
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }
}

impl FromStr for PostId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(s.parse::<i64>()
            .map_or_else(|_| Self::Text(s.to_string()), Self::Number))
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for PostId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

/// Author reference embedded in posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// User id (absent on some comment payloads).
    #[serde(default)]
    pub id: Option<UserId>,
    /// Display name.
    pub username: String,
    /// Avatar path or URL.
    #[serde(default)]
    pub avatar: Option<String>,
}

/// A post in the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Post identifier.
    pub id: PostId,
    /// Title.
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub content: String,
    /// Image path or URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Who wrote it.
    pub author: Author,
    /// Number of likes.
    #[serde(default)]
    pub likes_count: u32,
    /// Whether the current viewer liked it.
    #[serde(default)]
    pub liked_by_user: bool,
    /// When the post was created.
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Whether the given viewer wrote this post.
    pub fn is_owned_by(&self, viewer: Option<UserId>) -> bool {
        viewer.is_some() && self.author.id == viewer
    }
}

/// A comment on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment identifier.
    pub id: i64,
    /// Comment text.
    pub text: String,
    /// Who wrote it.
    pub author: Author,
    /// When it was written.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Fields submitted when creating or editing a post.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    /// Local image file to upload.
    pub image: Option<PathBuf>,
}
