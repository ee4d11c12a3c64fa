//! Data models for Campus Creatives entities.

mod photo;
mod post;
mod user;

pub use photo::{Category, Photo};
pub use post::{Author, Comment, Post, PostDraft, PostId};
pub use user::{Credentials, ProfileUpdate, Registration, UserId, UserProfile};
