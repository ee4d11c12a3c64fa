//! User and authentication payloads.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Numeric user identifier issued by the API.
pub type UserId = i64;

/// Profile of a user, either the current one or a public profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    /// Only present on the current user's own profile.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Login credentials.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Registration form.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Changes to the current user's profile.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: String,
    pub bio: String,
    /// Local avatar file to upload.
    pub avatar: Option<PathBuf>,
}
