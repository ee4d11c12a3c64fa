//! Client-side form checks that run before any request is sent.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::models::{Credentials, PostDraft, Registration};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// A form field failed a required/format check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

fn require(value: &str, message: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError(message.to_string()));
    }
    Ok(())
}

/// Check that an email is present and well-formed.
pub fn email(value: &str) -> Result<(), ValidationError> {
    require(value, "Email is required.")?;
    if !EMAIL.is_match(value.trim()) {
        return Err(ValidationError("Enter a valid email address.".to_string()));
    }
    Ok(())
}

/// Login form.
pub fn credentials(creds: &Credentials) -> Result<(), ValidationError> {
    email(&creds.email)?;
    require(&creds.password, "Password is required.")
}

/// Registration form.
pub fn registration(reg: &Registration) -> Result<(), ValidationError> {
    require(&reg.username, "Username is required.")?;
    email(&reg.email)?;
    require(&reg.password, "Password is required.")
}

/// New post form.
pub fn new_post(draft: &PostDraft) -> Result<(), ValidationError> {
    if draft.title.is_empty() || draft.content.is_empty() {
        return Err(ValidationError(
            "Title and content are required.".to_string(),
        ));
    }
    Ok(())
}
