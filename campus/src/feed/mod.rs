//! The post feed and its optimistic interactions.
//!
//! Likes, edits and deletes are applied to the local copy first. Each one is
//! recorded in a [`MutationLog`]; if the server refuses it, the post is put
//! back the way it was and the mutation is marked failed.

mod mutation;

use std::collections::HashMap;

use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::api::{ApiClient, ApiError, ProgressFn};
use crate::models::{Comment, Post, PostDraft, PostId, UserId};
use crate::prompt::Confirm;
use crate::validate;

pub use mutation::{Mutation, MutationKind, MutationLog, MutationState};

const DELETE_QUESTION: &str = "Are you sure you want to delete this post?";

/// Posts plus comments keyed by post.
#[derive(Debug, Default)]
pub struct Feed {
    posts: Vec<Post>,
    comments: HashMap<PostId, Vec<Comment>>,
    mutations: MutationLog,
}

impl Feed {
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            posts,
            ..Self::default()
        }
    }

    /// Fetch every post, then all of their comments.
    pub async fn load(api: &ApiClient) -> Result<Self, ApiError> {
        let mut feed = Self::new(api.list_posts(None).await?);
        feed.load_comments(api).await;
        Ok(feed)
    }

    /// Fetch the posts written by one user. Comments are not loaded.
    pub async fn load_by_author(api: &ApiClient, author: UserId) -> Result<Self, ApiError> {
        Ok(Self::new(api.list_posts(Some(author)).await?))
    }

    /// Fetch comments for every post concurrently.
    ///
    /// Responses are applied as they arrive. A failed fetch is logged and
    /// leaves that post without comments.
    pub async fn load_comments(&mut self, api: &ApiClient) {
        let mut tasks = JoinSet::new();
        for post in &self.posts {
            let api = api.clone();
            let id = post.id.clone();
            tasks.spawn(async move {
                let result = api.comments(&id).await;
                (id, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, Ok(comments))) => {
                    self.comments.insert(id, comments);
                }
                Ok((id, Err(e))) => {
                    error!(post = %id, error = %e, "Failed to fetch comments for post");
                }
                Err(e) => error!(error = %e, "Comment fetch task failed"),
            }
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn post(&self, id: &PostId) -> Option<&Post> {
        self.posts.iter().find(|p| &p.id == id)
    }

    /// Loaded comments for a post; empty if none were fetched.
    pub fn comments(&self, id: &PostId) -> &[Comment] {
        self.comments.get(id).map_or(&[], Vec::as_slice)
    }

    pub const fn mutations(&self) -> &MutationLog {
        &self.mutations
    }

    /// Publish a new post and put it at the top of the feed.
    pub async fn create(
        &mut self,
        api: &ApiClient,
        draft: &PostDraft,
        progress: Option<ProgressFn>,
    ) -> Result<&Post, ApiError> {
        require_login(api, "You must be logged in to create a post.")?;
        validate::new_post(draft).map_err(|e| ApiError::Validation(e.0))?;

        let post = api.create_post(draft, progress).await.map_err(|e| {
            error!(error = %e, "Error creating post");
            e
        })?;
        debug!(post = %post.id, "Post created");
        self.posts.insert(0, post);
        Ok(&self.posts[0])
    }

    /// Like or unlike a post. Returns whether it is now liked.
    pub async fn toggle_like(&mut self, api: &ApiClient, id: &PostId) -> Result<bool, ApiError> {
        require_login(api, "Please log in to like posts")?;
        let index = self.index_of(id)?;

        let before = self.posts[index].clone();
        let liked = before.liked_by_user;
        {
            let post = &mut self.posts[index];
            post.liked_by_user = !liked;
            post.likes_count = if liked {
                post.likes_count.saturating_sub(1)
            } else {
                post.likes_count.saturating_add(1)
            };
        }

        let kind = if liked {
            MutationKind::Unlike
        } else {
            MutationKind::Like
        };
        let mutation = self.mutations.begin(kind, id.clone());

        let result = if liked {
            api.unlike(id).await
        } else {
            api.like(id).await
        };

        match result {
            Ok(()) => {
                self.mutations.confirm(mutation);
                Ok(!liked)
            }
            Err(e) => {
                error!(post = %id, error = %e, "Like/unlike failed");
                self.restore_post(before, index);
                self.mutations.fail(mutation, e.user_message());
                Err(e)
            }
        }
    }

    /// Comment on a post, then reload its comments.
    ///
    /// Blank text is ignored without a request. Returns whether a comment
    /// was posted.
    pub async fn add_comment(
        &mut self,
        api: &ApiClient,
        id: &PostId,
        text: &str,
    ) -> Result<bool, ApiError> {
        require_login(api, "Please log in to comment")?;
        if text.trim().is_empty() {
            return Ok(false);
        }
        self.index_of(id)?;

        let mutation = self.mutations.begin(MutationKind::Comment, id.clone());
        if let Err(e) = api.add_comment(id, text).await {
            error!(post = %id, error = %e, "Failed to post comment");
            self.mutations.fail(mutation, e.user_message());
            return Err(e);
        }
        self.mutations.confirm(mutation);

        match api.comments(id).await {
            Ok(comments) => {
                self.comments.insert(id.clone(), comments);
            }
            Err(e) => warn!(post = %id, error = %e, "Failed to reload comments"),
        }
        Ok(true)
    }

    /// Delete a post after confirmation. Returns whether it was deleted.
    pub async fn delete(
        &mut self,
        api: &ApiClient,
        id: &PostId,
        prompt: &dyn Confirm,
    ) -> Result<bool, ApiError> {
        require_login(api, "Please log in to delete posts")?;
        let index = self.index_of(id)?;

        if !prompt.confirm(DELETE_QUESTION) {
            return Ok(false);
        }

        let removed = self.posts.remove(index);
        let removed_comments = self.comments.remove(id);
        let mutation = self.mutations.begin(MutationKind::Delete, id.clone());

        match api.delete_post(id).await {
            Ok(()) => {
                self.mutations.confirm(mutation);
                debug!(post = %id, "Post deleted");
                Ok(true)
            }
            Err(e) => {
                error!(post = %id, error = %e, "Delete failed");
                self.posts.insert(index.min(self.posts.len()), removed);
                if let Some(comments) = removed_comments {
                    self.comments.insert(id.clone(), comments);
                }
                self.mutations.fail(mutation, e.user_message());
                Err(e)
            }
        }
    }

    /// Edit a post's title and content, optionally replacing its image.
    pub async fn edit(
        &mut self,
        api: &ApiClient,
        id: &PostId,
        draft: &PostDraft,
    ) -> Result<(), ApiError> {
        require_login(api, "Please log in to edit posts")?;
        let index = self.index_of(id)?;

        let before = self.posts[index].clone();
        {
            let post = &mut self.posts[index];
            post.title.clone_from(&draft.title);
            post.content.clone_from(&draft.content);
        }
        let mutation = self.mutations.begin(MutationKind::Edit, id.clone());

        match api.update_post(id, draft).await {
            Ok(updated) => {
                self.replace_post(updated);
                self.mutations.confirm(mutation);
                Ok(())
            }
            Err(e) => {
                error!(post = %id, error = %e, "Update failed");
                self.restore_post(before, index);
                self.mutations.fail(mutation, e.user_message());
                Err(e)
            }
        }
    }

    fn index_of(&self, id: &PostId) -> Result<usize, ApiError> {
        self.posts
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("Post {id} not found.")))
    }

    /// Put back a snapshot, preferring its old position.
    fn restore_post(&mut self, snapshot: Post, index: usize) {
        if let Some(slot) = self.posts.iter_mut().find(|p| p.id == snapshot.id) {
            *slot = snapshot;
        } else {
            self.posts.insert(index.min(self.posts.len()), snapshot);
        }
    }

    fn replace_post(&mut self, post: Post) {
        if let Some(slot) = self.posts.iter_mut().find(|p| p.id == post.id) {
            *slot = post;
        }
    }
}

fn require_login(api: &ApiClient, message: &str) -> Result<(), ApiError> {
    if api.has_token() {
        Ok(())
    } else {
        Err(ApiError::NotAuthenticated(message.to_string()))
    }
}
