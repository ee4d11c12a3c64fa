//! Tracking of optimistic feed changes.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::PostId;

/// What a mutation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Like,
    Unlike,
    Comment,
    Edit,
    Delete,
}

impl MutationKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Unlike => "unlike",
            Self::Comment => "comment",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a mutation stands with the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationState {
    /// Applied locally, waiting for the server.
    Pending,
    /// The server accepted it.
    Confirmed,
    /// The server refused it or could not be reached; the local change was
    /// rolled back.
    Failed(String),
}

/// One optimistic change.
#[derive(Debug, Clone)]
pub struct Mutation {
    pub id: Uuid,
    pub kind: MutationKind,
    pub post_id: PostId,
    pub state: MutationState,
    pub started_at: DateTime<Utc>,
}

/// Every mutation issued against a feed, oldest first.
#[derive(Debug, Default)]
pub struct MutationLog {
    entries: Vec<Mutation>,
}

impl MutationLog {
    /// Record a new pending mutation.
    pub fn begin(&mut self, kind: MutationKind, post_id: PostId) -> Uuid {
        let id = Uuid::now_v7();
        self.entries.push(Mutation {
            id,
            kind,
            post_id,
            state: MutationState::Pending,
            started_at: Utc::now(),
        });
        id
    }

    pub fn confirm(&mut self, id: Uuid) {
        self.set_state(id, MutationState::Confirmed);
    }

    pub fn fail(&mut self, id: Uuid, reason: String) {
        self.set_state(id, MutationState::Failed(reason));
    }

    /// Mutations the server refused.
    pub fn failed(&self) -> impl Iterator<Item = &Mutation> {
        self.entries
            .iter()
            .filter(|m| matches!(m.state, MutationState::Failed(_)))
    }

    pub fn entries(&self) -> &[Mutation] {
        &self.entries
    }

    fn set_state(&mut self, id: Uuid, state: MutationState) {
        if let Some(entry) = self.entries.iter_mut().find(|m| m.id == id) {
            entry.state = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle() {
        let mut log = MutationLog::default();
        let a = log.begin(MutationKind::Like, PostId::Number(1));
        let b = log.begin(MutationKind::Delete, PostId::Number(2));
        assert!(log
            .entries()
            .iter()
            .all(|m| m.state == MutationState::Pending));

        log.confirm(a);
        log.fail(b, "Not found.".to_string());

        assert_eq!(log.entries()[0].state, MutationState::Confirmed);
        let failed: Vec<&Mutation> = log.failed().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].id, b);
        assert_eq!(failed[0].kind, MutationKind::Delete);
        assert_eq!(
            failed[0].state,
            MutationState::Failed("Not found.".to_string())
        );
    }
}
