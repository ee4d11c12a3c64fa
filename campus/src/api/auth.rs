//! Authentication and user endpoints.

use reqwest::multipart::Form;
use reqwest::Method;
use serde::Deserialize;

use super::{upload, ApiClient, ApiError};
use crate::models::{Credentials, ProfileUpdate, Registration, UserId, UserProfile};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    auth_token: String,
}

impl ApiClient {
    /// Exchange credentials for a token.
    pub async fn login(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let builder = self
            .request(Method::POST, "/auth/token/login/")
            .json(credentials);
        let response: TokenResponse = Self::send_json(builder).await?;
        Ok(response.auth_token)
    }

    /// Create an account. New accounts wait for admin approval.
    pub async fn register(&self, registration: &Registration) -> Result<(), ApiError> {
        let builder = self
            .request(Method::POST, "/api/users/register/")
            .json(registration);
        Self::send_empty(builder).await
    }

    /// Profile of the token's owner.
    pub async fn current_user(&self) -> Result<UserProfile, ApiError> {
        Self::send_json(self.authorized(Method::GET, "/auth/users/me/")?).await
    }

    /// Update the current user's profile.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        let mut form = Form::new()
            .text("username", update.username.clone())
            .text("bio", update.bio.clone());
        if let Some(path) = &update.avatar {
            form = form.part("avatar", upload::file_part(path, None).await?);
        }

        let builder = self
            .authorized(Method::PATCH, "/auth/users/me/")?
            .multipart(form);
        Self::send_json(builder).await
    }

    /// Public profile of any user.
    pub async fn public_user(&self, id: UserId) -> Result<UserProfile, ApiError> {
        Self::send_json(self.request(Method::GET, &format!("/api/users/public/{id}/"))).await
    }
}
