//! Locally saved posts.
//!
//! The set lives in client storage under [`SAVED_POSTS`] as a JSON array of
//! ids. Ids whose post has since disappeared stay in the set; they are only
//! skipped when the set is matched against the server's posts.

use tracing::{debug, warn};

use crate::models::{Post, PostId};
use crate::store::{Preferences, StoreError, SAVED_POSTS};

/// Result of saving a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Newly added.
    Saved,
    /// Already in the set; nothing changed.
    AlreadySaved,
}

impl SaveOutcome {
    /// Message shown to the user.
    pub const fn message(self) -> &'static str {
        match self {
            Self::Saved => "Post saved!",
            Self::AlreadySaved => "Post already saved.",
        }
    }
}

/// The user's saved post ids.
#[derive(Debug)]
pub struct SavedSet {
    prefs: Preferences,
    ids: Vec<PostId>,
}

impl SavedSet {
    /// Read the persisted set, ignoring entries that are not ids.
    pub fn load(prefs: &Preferences) -> Self {
        let ids = prefs
            .get(SAVED_POSTS)
            .map(|raw| parse_ids(&raw))
            .unwrap_or_default();
        Self {
            prefs: prefs.clone(),
            ids,
        }
    }

    pub fn contains(&self, id: &PostId) -> bool {
        self.ids.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Save a post. Saving twice is a no-op.
    pub fn add(&mut self, id: PostId) -> Result<SaveOutcome, StoreError> {
        if self.contains(&id) {
            return Ok(SaveOutcome::AlreadySaved);
        }

        let mut next = self.ids.clone();
        next.push(id);
        self.persist(&next)?;
        self.ids = next;
        Ok(SaveOutcome::Saved)
    }

    /// Forget a post. Returns whether it was saved.
    pub fn remove(&mut self, id: &PostId) -> Result<bool, StoreError> {
        if !self.contains(id) {
            return Ok(false);
        }

        let next: Vec<PostId> = self.ids.iter().filter(|s| *s != id).cloned().collect();
        self.persist(&next)?;
        self.ids = next;
        Ok(true)
    }

    /// The saved posts among `posts`, in the order `posts` lists them.
    pub fn reconcile<'a>(&self, posts: &'a [Post]) -> Vec<&'a Post> {
        posts.iter().filter(|p| self.contains(&p.id)).collect()
    }

    fn persist(&self, ids: &[PostId]) -> Result<(), StoreError> {
        let json = serde_json::to_string(ids)?;
        self.prefs.set(SAVED_POSTS, &json)?;
        debug!(count = ids.len(), "Saved posts persisted");
        Ok(())
    }
}

/// Decode the persisted list, keeping only numbers and strings.
fn parse_ids(raw: &str) -> Vec<PostId> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Saved posts are not valid JSON, ignoring them");
            return Vec::new();
        }
    };

    let Some(entries) = value.as_array() else {
        warn!("Saved posts are not a list, ignoring them");
        return Vec::new();
    };

    let mut ids: Vec<PostId> = Vec::with_capacity(entries.len());
    for id in entries.iter().filter_map(PostId::from_value) {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Author;
    use chrono::Utc;

    fn post(id: i64) -> Post {
        Post {
            id: PostId::Number(id),
            title: format!("Post {id}"),
            content: String::new(),
            image: None,
            author: Author {
                id: Some(1),
                username: "ana".to_string(),
                avatar: None,
            },
            likes_count: 0,
            liked_by_user: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn add_is_idempotent() {
        let prefs = Preferences::in_memory();
        let mut saved = SavedSet::load(&prefs);
        assert!(saved.is_empty());

        assert_eq!(saved.add(PostId::Number(42)).unwrap(), SaveOutcome::Saved);
        assert_eq!(prefs.get(SAVED_POSTS).as_deref(), Some("[42]"));

        assert_eq!(
            saved.add(PostId::Number(42)).unwrap(),
            SaveOutcome::AlreadySaved
        );
        assert_eq!(prefs.get(SAVED_POSTS).as_deref(), Some("[42]"));
        assert_eq!(saved.ids.len(), 1);
    }

    #[test]
    fn add_then_remove_restores_set() {
        let prefs = Preferences::in_memory();
        prefs.set(SAVED_POSTS, r#"[3,"draft-9"]"#).unwrap();
        let mut saved = SavedSet::load(&prefs);
        let before = saved.ids.clone();

        saved.add(PostId::Number(7)).unwrap();
        assert!(saved.remove(&PostId::Number(7)).unwrap());

        assert_eq!(saved.ids, before);
        assert_eq!(prefs.get(SAVED_POSTS).as_deref(), Some(r#"[3,"draft-9"]"#));
    }

    #[test]
    fn remove_missing_is_noop() {
        let prefs = Preferences::in_memory();
        let mut saved = SavedSet::load(&prefs);
        assert!(!saved.remove(&PostId::Number(1)).unwrap());
        assert_eq!(prefs.get(SAVED_POSTS), None);
    }

    #[test]
    fn load_filters_foreign_entries() {
        let prefs = Preferences::in_memory();
        prefs
            .set(SAVED_POSTS, r#"[1, null, {"id": 2}, "3", [4], true, 1.5, 1]"#)
            .unwrap();

        let saved = SavedSet::load(&prefs);
        assert_eq!(
            saved.ids,
            &[PostId::Number(1), PostId::Text("3".to_string())]
        );
    }

    #[test]
    fn load_tolerates_garbage() {
        for raw in ["not json", "{\"a\": 1}", "null", "42", ""] {
            let prefs = Preferences::in_memory();
            prefs.set(SAVED_POSTS, raw).unwrap();
            assert!(SavedSet::load(&prefs).is_empty(), "input {raw:?}");
        }
    }

    #[test]
    fn reconcile_keeps_server_order_and_skips_stale_ids() {
        let prefs = Preferences::in_memory();
        prefs.set(SAVED_POSTS, "[3,1,99]").unwrap();
        let saved = SavedSet::load(&prefs);

        let posts = vec![post(1), post(2), post(3)];
        let shown: Vec<_> = saved.reconcile(&posts).iter().map(|p| p.id.clone()).collect();

        assert_eq!(shown, vec![PostId::Number(1), PostId::Number(3)]);
        assert_eq!(
            saved.ids,
            &[PostId::Number(3), PostId::Number(1), PostId::Number(99)]
        );
        assert_eq!(prefs.get(SAVED_POSTS).as_deref(), Some("[3,1,99]"));
    }

    #[test]
    fn numeric_and_text_ids_differ() {
        let prefs = Preferences::in_memory();
        prefs.set(SAVED_POSTS, r#"["1"]"#).unwrap();
        let saved = SavedSet::load(&prefs);
        assert!(saved.reconcile(&[post(1)]).is_empty());
    }
}
