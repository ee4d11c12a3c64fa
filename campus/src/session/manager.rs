//! Session token lifecycle.

use thiserror::Error;
use tracing::{debug, error, info};

use crate::api::{first_error_message, token_header, ApiClient, ApiError, DEFAULT_AVATAR};
use crate::models::{Credentials, ProfileUpdate, Registration, UserId, UserProfile};
use crate::prompt::Confirm;
use crate::store::{Preferences, StoreError, AUTH_TOKEN};
use crate::validate::{self, ValidationError};

const LOGIN_FAILED: &str = "Login failed. Please try again.";
const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";
const LOGOUT_QUESTION: &str = "Do you really want to logout?";

/// Who is logged in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque credential issued by the API.
    pub token: Option<String>,
    /// Filled once the profile has been fetched.
    pub user_id: Option<UserId>,
    pub username: String,
    pub avatar_url: String,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            token: None,
            user_id: None,
            username: String::new(),
            avatar_url: DEFAULT_AVATAR.to_string(),
        }
    }
}

impl Session {
    /// Whether a token is held.
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Failures from login and registration, already phrased for display.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a logout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// Token cleared. The caller should return to the home view.
    LoggedOut,
    /// The user said no. Nothing changed.
    Declined,
}

/// Owns the session and its persisted token.
#[derive(Debug)]
pub struct SessionManager {
    prefs: Preferences,
    api: ApiClient,
    session: Session,
}

impl SessionManager {
    /// Create an unauthenticated manager. Call [`Self::restore`] to pick up
    /// a persisted token.
    pub fn new(prefs: Preferences, api: ApiClient) -> Self {
        Self {
            prefs,
            api: api.with_token(None),
            session: Session::default(),
        }
    }

    /// Current session state.
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// API client carrying [`Self::current_auth_header`].
    pub fn api(&self) -> ApiClient {
        self.api.with_auth_header(self.current_auth_header())
    }

    /// Value of the `Authorization` header for authenticated calls.
    pub fn current_auth_header(&self) -> Option<String> {
        self.session.token.as_deref().map(token_header)
    }

    /// Pick up a persisted token and try to load the profile.
    ///
    /// A failed profile fetch is logged and otherwise ignored: the session
    /// stays authenticated without profile fields.
    pub async fn restore(&mut self) {
        let Some(token) = self.prefs.get(AUTH_TOKEN).filter(|t| !t.is_empty()) else {
            debug!("No stored session");
            return;
        };

        self.session.token = Some(token);
        self.refresh_profile().await;
    }

    /// Fetch the profile for the held token, logging failures.
    pub async fn refresh_profile(&mut self) {
        if !self.session.is_authenticated() {
            return;
        }

        match self.api().current_user().await {
            Ok(profile) => self.apply_profile(&profile),
            Err(e) => error!(error = %e, "Failed to fetch user"),
        }
    }

    /// Log in, persisting the issued token.
    ///
    /// Form checks run first; a failing check sends nothing.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<String, AuthError> {
        validate::credentials(credentials)?;

        let token = self.api.login(credentials).await.map_err(|e| {
            error!(error = %e, "Login failed");
            AuthError::Rejected(login_error_message(&e))
        })?;

        self.prefs.set(AUTH_TOKEN, &token)?;
        self.session = Session {
            token: Some(token.clone()),
            ..Session::default()
        };
        info!("Logged in");
        Ok(token)
    }

    /// Register a new account. Does not log in.
    pub async fn register(&self, registration: &Registration) -> Result<(), AuthError> {
        validate::registration(registration)?;

        self.api.register(registration).await.map_err(|e| {
            error!(error = %e, "Registration failed");
            AuthError::Rejected(REGISTRATION_FAILED.to_string())
        })
    }

    /// Ask for confirmation, then forget the token.
    pub fn logout(&mut self, prompt: &dyn Confirm) -> Result<LogoutOutcome, StoreError> {
        if !prompt.confirm(LOGOUT_QUESTION) {
            return Ok(LogoutOutcome::Declined);
        }

        self.prefs.remove(AUTH_TOKEN)?;
        self.session = Session::default();
        info!("Logged out");
        Ok(LogoutOutcome::LoggedOut)
    }

    /// Update the current user's profile and the session's copy of it.
    pub async fn update_profile(&mut self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        let profile = self.api().update_profile(update).await?;
        self.apply_profile(&profile);
        Ok(profile)
    }

    fn apply_profile(&mut self, profile: &UserProfile) {
        self.session.user_id = Some(profile.id);
        self.session.username.clone_from(&profile.username);
        if profile.avatar.as_deref().is_some_and(|a| !a.is_empty()) {
            self.session.avatar_url = self.api.media_url(profile.avatar.as_deref());
        }
    }
}

/// Message shown for a failed login.
fn login_error_message(error: &ApiError) -> String {
    error
        .body()
        .and_then(first_error_message)
        .unwrap_or_else(|| LOGIN_FAILED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::serve;
    use crate::prompt::FixedAnswer;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn router(hits: Arc<AtomicUsize>) -> Router {
        let login = move |Json(body): Json<Value>| {
            let hits = Arc::clone(&hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                match body["password"].as_str() {
                    Some("secret") => (StatusCode::OK, Json(json!({"auth_token": "tok-1"}))),
                    Some("plain") => (StatusCode::BAD_REQUEST, Json(json!("Account disabled"))),
                    Some("odd") => (StatusCode::BAD_REQUEST, Json(json!({"detail": "nope"}))),
                    _ => (
                        StatusCode::BAD_REQUEST,
                        Json(json!({
                            "non_field_errors": ["Unable to log in with provided credentials."]
                        })),
                    ),
                }
            }
        };

        let me = |headers: HeaderMap| async move {
            match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                Some("Token tok-1") => (
                    StatusCode::OK,
                    Json(json!({"id": 5, "username": "ana", "avatar": "/media/ana.png"})),
                ),
                _ => (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"detail": "Invalid token."})),
                ),
            }
        };

        Router::new()
            .route("/auth/token/login/", post(login))
            .route(
                "/auth/users/me/",
                get(me).patch(|headers: HeaderMap| async move {
                    if headers.get("authorization").is_some() {
                        (
                            StatusCode::OK,
                            Json(json!({"id": 5, "username": "ana_k", "bio": "Painter"})),
                        )
                    } else {
                        (StatusCode::UNAUTHORIZED, Json(json!({})))
                    }
                }),
            )
            .route(
                "/api/users/register/",
                post(|Json(body): Json<Value>| async move {
                    if body["username"] == "ben" {
                        (StatusCode::CREATED, Json(json!({"id": 6, "username": "ben"})))
                    } else {
                        (StatusCode::BAD_REQUEST, Json(json!({"email": ["taken"]})))
                    }
                }),
            )
    }

    async fn manager(prefs: &Preferences) -> (SessionManager, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = serve(router(Arc::clone(&hits))).await;
        let api = ApiClient::new(&base, None).unwrap();
        (SessionManager::new(prefs.clone(), api), hits)
    }

    fn creds(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn login_persists_token() {
        let prefs = Preferences::in_memory();
        let (mut sessions, _) = manager(&prefs).await;

        let token = sessions.login(&creds("ana@campus.edu", "secret")).await.unwrap();
        assert_eq!(token, "tok-1");
        assert_eq!(prefs.get(AUTH_TOKEN).as_deref(), Some("tok-1"));
        assert_eq!(sessions.current_auth_header().as_deref(), Some("Token tok-1"));
    }

    #[tokio::test]
    async fn api_client_sends_current_auth_header() {
        let prefs = Preferences::in_memory();
        let (mut sessions, _) = manager(&prefs).await;
        assert_eq!(sessions.api().auth_header(), None);

        sessions.login(&creds("ana@campus.edu", "secret")).await.unwrap();
        let api = sessions.api();
        assert_eq!(api.auth_header(), sessions.current_auth_header().as_deref());

        // The fake only accepts the exact header value.
        let me = api.current_user().await.unwrap();
        assert_eq!(me.username, "ana");
    }

    #[tokio::test]
    async fn malformed_email_never_reaches_network() {
        let prefs = Preferences::in_memory();
        let (mut sessions, hits) = manager(&prefs).await;

        let err = sessions.login(&creds("not-an-email", "secret")).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(prefs.get(AUTH_TOKEN), None);
    }

    #[tokio::test]
    async fn login_failures_are_normalized() {
        let prefs = Preferences::in_memory();
        let (mut sessions, _) = manager(&prefs).await;

        let err = sessions.login(&creds("ana@campus.edu", "wrong")).await.unwrap_err();
        assert_eq!(err.to_string(), "Unable to log in with provided credentials.");

        let err = sessions.login(&creds("ana@campus.edu", "plain")).await.unwrap_err();
        assert_eq!(err.to_string(), "Account disabled");

        let err = sessions.login(&creds("ana@campus.edu", "odd")).await.unwrap_err();
        assert_eq!(err.to_string(), LOGIN_FAILED);

        assert_eq!(prefs.get(AUTH_TOKEN), None);
        assert!(!sessions.session().is_authenticated());
    }

    #[tokio::test]
    async fn unreachable_server_gives_generic_message() {
        let prefs = Preferences::in_memory();
        let api = ApiClient::new("http://127.0.0.1:9", None).unwrap();
        let mut sessions = SessionManager::new(prefs, api);

        let err = sessions.login(&creds("ana@campus.edu", "secret")).await.unwrap_err();
        assert_eq!(err.to_string(), LOGIN_FAILED);
    }

    #[tokio::test]
    async fn restore_loads_profile() {
        let prefs = Preferences::in_memory();
        prefs.set(AUTH_TOKEN, "tok-1").unwrap();
        let (mut sessions, _) = manager(&prefs).await;

        sessions.restore().await;
        let session = sessions.session();
        assert!(session.is_authenticated());
        assert_eq!(session.user_id, Some(5));
        assert_eq!(session.username, "ana");
        assert!(session.avatar_url.ends_with("/media/ana.png"));
    }

    #[tokio::test]
    async fn restore_with_rejected_token_stays_authenticated() {
        let prefs = Preferences::in_memory();
        prefs.set(AUTH_TOKEN, "expired").unwrap();
        let (mut sessions, _) = manager(&prefs).await;

        sessions.restore().await;
        let session = sessions.session();
        assert!(session.is_authenticated());
        assert_eq!(session.user_id, None);
        assert_eq!(session.avatar_url, DEFAULT_AVATAR);
        assert_eq!(prefs.get(AUTH_TOKEN).as_deref(), Some("expired"));
    }

    #[tokio::test]
    async fn restore_without_token_is_anonymous() {
        let prefs = Preferences::in_memory();
        prefs.set(AUTH_TOKEN, "").unwrap();
        let (mut sessions, _) = manager(&prefs).await;

        sessions.restore().await;
        assert!(!sessions.session().is_authenticated());
        assert_eq!(sessions.current_auth_header(), None);
    }

    #[tokio::test]
    async fn declined_logout_keeps_token() {
        let prefs = Preferences::in_memory();
        prefs.set(AUTH_TOKEN, "tok-1").unwrap();
        let (mut sessions, _) = manager(&prefs).await;
        sessions.restore().await;

        let outcome = sessions.logout(&FixedAnswer(false)).unwrap();
        assert_eq!(outcome, LogoutOutcome::Declined);
        assert_eq!(prefs.get(AUTH_TOKEN).as_deref(), Some("tok-1"));
        assert!(sessions.session().is_authenticated());

        let outcome = sessions.logout(&FixedAnswer(true)).unwrap();
        assert_eq!(outcome, LogoutOutcome::LoggedOut);
        assert_eq!(prefs.get(AUTH_TOKEN), None);
        assert_eq!(sessions.session(), &Session::default());
    }

    #[tokio::test]
    async fn update_profile_refreshes_session() {
        let prefs = Preferences::in_memory();
        prefs.set(AUTH_TOKEN, "tok-1").unwrap();
        let (mut sessions, _) = manager(&prefs).await;
        sessions.restore().await;

        let update = ProfileUpdate {
            username: "ana_k".to_string(),
            bio: "Painter".to_string(),
            avatar: None,
        };
        let profile = sessions.update_profile(&update).await.unwrap();
        assert_eq!(profile.bio.as_deref(), Some("Painter"));
        assert_eq!(sessions.session().username, "ana_k");
        assert!(sessions.session().avatar_url.ends_with("/media/ana.png"));
    }

    #[tokio::test]
    async fn registration_failure_is_generic() {
        let prefs = Preferences::in_memory();
        let (sessions, _) = manager(&prefs).await;

        let reg = Registration {
            username: "ana".to_string(),
            email: "ana@campus.edu".to_string(),
            password: "secret".to_string(),
        };
        let err = sessions.register(&reg).await.unwrap_err();
        assert_eq!(err.to_string(), REGISTRATION_FAILED);
    }

    #[tokio::test]
    async fn registration_success_does_not_log_in() {
        let prefs = Preferences::in_memory();
        let (sessions, hits) = manager(&prefs).await;

        let reg = Registration {
            username: "ben".to_string(),
            email: "ben@campus.edu".to_string(),
            password: "secret".to_string(),
        };
        sessions.register(&reg).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(!sessions.session().is_authenticated());
        assert_eq!(prefs.get(AUTH_TOKEN), None);
    }
}
