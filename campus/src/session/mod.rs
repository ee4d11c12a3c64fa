//! Client session: token persistence, login, logout and profile.

mod manager;

pub use manager::{LogoutOutcome, Session, SessionManager};
