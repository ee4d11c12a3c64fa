//! Post, like and comment endpoints.

use reqwest::multipart::Form;
use reqwest::Method;

use super::{upload, ApiClient, ApiError, ProgressFn};
use crate::models::{Comment, Post, PostDraft, PostId, UserId};

impl ApiClient {
    /// All posts, or only those by `author`.
    pub async fn list_posts(&self, author: Option<UserId>) -> Result<Vec<Post>, ApiError> {
        let path = author.map_or_else(
            || "/api/posts/".to_string(),
            |id| format!("/api/posts/?author={}", urlencoding::encode(&id.to_string())),
        );
        Self::send_json(self.request(Method::GET, &path)).await
    }

    /// A single post.
    pub async fn get_post(&self, id: &PostId) -> Result<Post, ApiError> {
        Self::send_json(self.request(Method::GET, &post_path(id, ""))).await
    }

    /// Publish a post, reporting image upload progress.
    pub async fn create_post(
        &self,
        draft: &PostDraft,
        progress: Option<ProgressFn>,
    ) -> Result<Post, ApiError> {
        let form = post_form(draft, progress).await?;
        let builder = self
            .authorized(Method::POST, "/api/posts/")?
            .multipart(form);
        Self::send_json(builder).await
    }

    /// Edit a post.
    pub async fn update_post(&self, id: &PostId, draft: &PostDraft) -> Result<Post, ApiError> {
        let form = post_form(draft, None).await?;
        let builder = self
            .authorized(Method::PATCH, &post_path(id, ""))?
            .multipart(form);
        Self::send_json(builder).await
    }

    /// Delete a post.
    pub async fn delete_post(&self, id: &PostId) -> Result<(), ApiError> {
        Self::send_empty(self.authorized(Method::DELETE, &post_path(id, ""))?).await
    }

    /// Like a post.
    pub async fn like(&self, id: &PostId) -> Result<(), ApiError> {
        let builder = self
            .authorized(Method::POST, &post_path(id, "likes/"))?
            .json(&serde_json::json!({}));
        Self::send_empty(builder).await
    }

    /// Remove a like.
    pub async fn unlike(&self, id: &PostId) -> Result<(), ApiError> {
        Self::send_empty(self.authorized(Method::DELETE, &post_path(id, "likes/"))?).await
    }

    /// Comments on a post. Readable without a session.
    pub async fn comments(&self, id: &PostId) -> Result<Vec<Comment>, ApiError> {
        Self::send_json(self.request(Method::GET, &post_path(id, "comments/"))).await
    }

    /// Comment on a post.
    pub async fn add_comment(&self, id: &PostId, text: &str) -> Result<(), ApiError> {
        let builder = self
            .authorized(Method::POST, &post_path(id, "comments/"))?
            .json(&serde_json::json!({ "text": text }));
        Self::send_empty(builder).await
    }
}

fn post_path(id: &PostId, suffix: &str) -> String {
    format!(
        "/api/posts/{}/{suffix}",
        urlencoding::encode(&id.to_string())
    )
}

async fn post_form(draft: &PostDraft, progress: Option<ProgressFn>) -> Result<Form, ApiError> {
    let mut form = Form::new()
        .text("title", draft.title.clone())
        .text("content", draft.content.clone());
    if let Some(path) = &draft.image {
        form = form.part("image", upload::file_part(path, progress).await?);
    }
    Ok(form)
}
