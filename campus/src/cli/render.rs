//! Plain-text rendering of posts, profiles and photos.

use std::fmt::Write;

use crate::api::ApiClient;
use crate::feed::{Mutation, MutationKind, MutationState};
use crate::models::{Author, Comment, Photo, Post, UserId, UserProfile};
use crate::session::Session;

/// Width of the separator between posts.
const RULE: usize = 60;

/// Per-post context for rendering.
pub struct PostView<'a> {
    pub viewer: Option<UserId>,
    pub saved: bool,
    pub comments: &'a [Comment],
}

pub fn post(api: &ApiClient, post: &Post, view: &PostView<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#{} {}", post.id, post.title);
    let _ = writeln!(
        out,
        "by {} on {}",
        author(&post.author),
        post.created_at.format("%Y-%m-%d %H:%M")
    );
    if let Some(image) = post.image.as_deref().filter(|i| !i.is_empty()) {
        let _ = writeln!(out, "image: {}", api.media_url(Some(image)));
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", post.content);
    let _ = writeln!(out);

    let mut status = format!(
        "{} {}",
        if post.liked_by_user { "♥" } else { "♡" },
        post.likes_count
    );
    if view.saved {
        status.push_str("  [saved]");
    }
    if post.is_owned_by(view.viewer) {
        let _ = write!(status, "  [yours: campus edit {0} / campus delete {0}]", post.id);
    }
    let _ = writeln!(out, "{status}");

    for comment in view.comments {
        let _ = writeln!(out, "  {}: {}", author(&comment.author), comment.text);
    }
    out
}

fn author(author: &Author) -> String {
    match (author.username.as_str(), author.id) {
        ("", Some(id)) => format!("user {id}"),
        ("", None) => "unknown".to_string(),
        (name, _) => name.to_string(),
    }
}

/// Message for a change the server refused.
pub fn failed_change(mutation: &Mutation) -> String {
    let action = match mutation.kind {
        MutationKind::Like => "Like",
        MutationKind::Unlike => "Unlike",
        MutationKind::Comment => "Comment",
        MutationKind::Edit => "Update",
        MutationKind::Delete => "Delete",
    };
    let reason = match &mutation.state {
        MutationState::Failed(reason) => reason.as_str(),
        MutationState::Pending | MutationState::Confirmed => "",
    };
    let mut out = format!("{action} of post {} failed: {reason}", mutation.post_id);
    if mutation.kind != MutationKind::Comment {
        out.push_str(" The post was restored.");
    }
    out
}

pub fn rule() -> String {
    "-".repeat(RULE)
}

pub fn session(session: &Session) -> String {
    match (&session.token, session.user_id) {
        (None, _) => "Not logged in.".to_string(),
        (Some(_), None) => "Logged in (profile unavailable).".to_string(),
        (Some(_), Some(id)) => format!(
            "Logged in as {} (id {id})\navatar: {}",
            session.username, session.avatar_url
        ),
    }
}

pub fn profile(api: &ApiClient, profile: &UserProfile) -> String {
    let mut out = format!("{} (id {})\n", profile.username, profile.id);
    if let Some(email) = &profile.email {
        let _ = writeln!(out, "email: {email}");
    }
    let _ = writeln!(out, "avatar: {}", api.media_url(profile.avatar.as_deref()));
    match profile.bio.as_deref().filter(|b| !b.is_empty()) {
        Some(bio) => {
            let _ = writeln!(out, "bio: {bio}");
        }
        None => {
            let _ = writeln!(out, "bio: -");
        }
    }
    out
}

pub fn photos(photos: &[&Photo]) -> String {
    let mut out = format!("{:<8} {:<20} {}\n", "ID", "CATEGORY", "TITLE");
    for photo in photos {
        let _ = writeln!(out, "{:<8} {:<20} {}", photo.id, photo.category, photo.title);
    }
    out
}
