//! HTTP client for the Campus Creatives API.
//!
//! Every request goes through [`ApiClient`], which attaches the session
//! credential when there is one and turns non-success responses into
//! [`ApiError::Rejected`] with a displayable message.
//!
//! Endpoints:
//! - POST /auth/token/login/ - Issue a token
//! - GET, PATCH /auth/users/me/ - Current user
//! - POST /api/users/register/ - Register
//! - GET /api/users/public/{id}/ - Public profile
//! - GET, POST /api/posts/ - List (optionally by author) / create posts
//! - GET, PATCH, DELETE /api/posts/{id}/ - Single post
//! - POST, DELETE /api/posts/{id}/likes/ - Like / unlike
//! - GET, POST /api/posts/{id}/comments/ - Comments

mod auth;
mod error;
mod posts;
mod upload;

use std::time::Duration;

use reqwest::{header, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

pub use error::{describe_rejection, first_error_message, ApiError};
pub use upload::ProgressFn;

/// Avatar shown when a user has none.
pub const DEFAULT_AVATAR: &str = "/default-avatar.png";

const USER_AGENT: &str = concat!("campus/", env!("CARGO_PKG_VERSION"));

/// `Authorization` header value for a session token.
pub fn token_header(token: &str) -> String {
    format!("Token {token}")
}

/// Client for the social API, optionally carrying a session credential.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    /// Ready-made `Authorization` value.
    auth: Option<String>,
}

impl ApiClient {
    /// Create an anonymous client. No timeout is applied unless given.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: None,
        })
    }

    /// Same client, carrying `token`.
    #[must_use]
    pub fn with_token(&self, token: Option<String>) -> Self {
        self.with_auth_header(token.as_deref().map(token_header))
    }

    /// Same client, attaching `header` verbatim as `Authorization`.
    #[must_use]
    pub fn with_auth_header(&self, header: Option<String>) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            auth: header,
        }
    }

    /// The `Authorization` value every request carries.
    pub fn auth_header(&self) -> Option<&str> {
        self.auth.as_deref()
    }

    /// Whether a credential will be attached.
    pub const fn has_token(&self) -> bool {
        self.auth.is_some()
    }

    /// Resolve an avatar or image path returned by the API.
    ///
    /// Absolute URLs pass through, relative paths are served by the API
    /// host, and a missing value falls back to [`DEFAULT_AVATAR`].
    pub fn media_url(&self, path: Option<&str>) -> String {
        match path.filter(|p| !p.is_empty()) {
            None => DEFAULT_AVATAR.to_string(),
            Some(p) if p.starts_with("http") => p.to_string(),
            Some(p) => format!("{}{p}", self.base_url),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Build a request, attaching the credential if present.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(%method, %url, authorized = self.has_token(), "API request");

        let builder = self.http.request(method, url);
        match self.auth_header() {
            Some(value) => builder.header(header::AUTHORIZATION, value),
            None => builder,
        }
    }

    /// Build a request that must carry a credential.
    fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        if !self.has_token() {
            return Err(ApiError::NotAuthenticated(
                "You must be logged in to do that.".to_string(),
            ));
        }
        Ok(self.request(method, path))
    }

    async fn send(builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body = if text.trim().is_empty() {
            None
        } else {
            Some(
                serde_json::from_str(&text)
                    .unwrap_or_else(|_| serde_json::Value::String(text.clone())),
            )
        };
        let message = describe_rejection(status, body.as_ref());

        Err(ApiError::Rejected {
            status,
            body,
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
        Self::send(builder)
            .await?
            .json()
            .await
            .map_err(ApiError::Decode)
    }

    async fn send_empty(builder: RequestBuilder) -> Result<(), ApiError> {
        Self::send(builder).await.map(|_| ())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-process fake of the social API.

    use axum::Router;
    use tokio::net::TcpListener;

    /// Serve `router` on an ephemeral port and return its base URL.
    pub async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_urls() {
        let api = ApiClient::new("https://api.campus.test/", None).unwrap();
        assert_eq!(api.media_url(None), DEFAULT_AVATAR);
        assert_eq!(api.media_url(Some("")), DEFAULT_AVATAR);
        assert_eq!(
            api.media_url(Some("/media/avatars/a.png")),
            "https://api.campus.test/media/avatars/a.png"
        );
        assert_eq!(
            api.media_url(Some("https://cdn.test/a.png")),
            "https://cdn.test/a.png"
        );
    }

    #[test]
    fn token_is_carried_by_clone() {
        let api = ApiClient::new("http://localhost", None).unwrap();
        assert!(!api.has_token());
        let authed = api.with_token(Some("abc".to_string()));
        assert!(authed.has_token());
        assert_eq!(authed.auth_header(), Some("Token abc"));
        assert!(!authed.with_token(None).has_token());
    }
}
