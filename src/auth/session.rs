//! In-memory session state. One `SessionCell` exists per client instance;
//! only the manager mutates it, every other component reads a fresh snapshot
//! instead of caching a copy across an await.

use parking_lot::RwLock;

use crate::models::{Role, User};

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Session lifecycle: `Restoring` before the startup lookup resolves, then
/// `Anonymous` ⇄ `Authenticated` for the rest of the client's lifetime.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthState {
    #[default]
    Restoring,
    Anonymous,
    Authenticated(Session),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    /// Mirrors the UI readiness flag: true only during initial restore.
    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Restoring)
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Authenticated(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Default)]
pub struct SessionCell {
    inner: RwLock<AuthState>,
}

impl SessionCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> AuthState {
        self.inner.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.read().session().map(|s| s.token.clone())
    }

    pub fn user(&self) -> Option<User> {
        self.inner.read().session().map(|s| s.user.clone())
    }

    pub fn role(&self) -> Option<Role> {
        self.inner.read().session().map(|s| s.user.role)
    }

    pub fn is_loading(&self) -> bool {
        self.inner.read().is_loading()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.read().is_authenticated()
    }

    // Mutation is reserved for the manager: no partial sessions can exist, a
    // token is set if and only if a user is set.
    pub(crate) fn set_authenticated(&self, session: Session) {
        *self.inner.write() = AuthState::Authenticated(session);
    }

    pub(crate) fn set_anonymous(&self) {
        *self.inner.write() = AuthState::Anonymous;
    }

    /// Swap in a new user snapshot without touching the token. Returns false
    /// when there is no authenticated session to update.
    pub(crate) fn replace_user(&self, user: User) -> bool {
        let mut state = self.inner.write();
        match &mut *state {
            AuthState::Authenticated(s) => {
                s.user = user;
                true
            }
            _ => false,
        }
    }
}
