//! API error type and error payload interpretation.

use std::path::PathBuf;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Failures talking to the social API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The action needs a logged-in session.
    #[error("{0}")]
    NotAuthenticated(String),

    /// A client-side check failed; nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// The post is not part of the loaded feed.
    #[error("{0}")]
    NotFound(String),

    /// The server answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Rejected {
        status: StatusCode,
        /// Decoded response body, if any.
        body: Option<Value>,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotAuthenticated(msg) | Self::Validation(msg) | Self::NotFound(msg) => {
                msg.clone()
            }
            Self::Rejected { message, .. } => message.clone(),
            Self::Network(_) => "Could not reach the server. Please try again.".to_string(),
            Self::Decode(_) => "The server sent an unexpected response.".to_string(),
            Self::Io { .. } => self.to_string(),
        }
    }

    /// Decoded body of a rejected response.
    pub const fn body(&self) -> Option<&Value> {
        match self {
            Self::Rejected { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

/// The first validation message in an error payload.
///
/// A bare string is returned as is. For an object, the first field is
/// looked at and the first entry of its message list is used. Anything
/// else yields `None`.
pub fn first_error_message(body: &Value) -> Option<String> {
    match body {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => {
            let (_, first) = map.iter().next()?;
            let messages = first.as_array()?;
            messages.first().map(value_text)
        }
        _ => None,
    }
}

/// Best effort message for a rejected response.
pub fn describe_rejection(status: StatusCode, body: Option<&Value>) -> String {
    let detail = body.and_then(|b| {
        b.get("detail")
            .and_then(Value::as_str)
            .map(String::from)
            .or_else(|| first_error_message(b))
    });

    detail.unwrap_or_else(|| {
        format!(
            "Request failed: {}",
            status.canonical_reason().unwrap_or("unknown error")
        )
    })
}

fn value_text(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), String::from)
}
