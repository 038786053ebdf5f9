//! Persistence port - the storage contract the state machine depends on.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::machine::UserState;
use crate::user::{Toggle, User};

/// A durable state change requested by one transition.
#[derive(Debug, Clone, PartialEq)]
pub struct StateUpdate {
    /// Target state of the transition.
    pub next: UserState,
    /// New private-mode setting, when the transition flips it.
    pub private_mode: Option<Toggle>,
    /// New shuffle setting, when the transition flips it.
    pub shuffle_mode: Option<Toggle>,
}

impl StateUpdate {
    pub fn to(next: UserState) -> Self {
        Self {
            next,
            private_mode: None,
            shuffle_mode: None,
        }
    }

    pub fn with_private_mode(mut self, mode: Toggle) -> Self {
        self.private_mode = Some(mode);
        self
    }

    pub fn with_shuffle_mode(mut self, mode: Toggle) -> Self {
        self.shuffle_mode = Some(mode);
        self
    }
}

/// Storage-facing contract consumed, not owned, by the core.
///
/// Implementations must be atomic per user: `set_user_state` checks the
/// durable state against `user.state` (the caller's view) and fails with
/// [`StoreError::StaleState`] when another writer got there first, so
/// concurrent transitions for one user serialize instead of losing an
/// update. Reads are read-after-write consistent.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Durably record `update` for `user`.
    ///
    /// The in-memory user is not touched here; the caller applies the
    /// update only after this returns Ok.
    async fn set_user_state(&self, user: &User, update: &StateUpdate)
        -> Result<User, StoreError>;

    /// Fetch the durable record for `id`.
    async fn get_user(&self, id: i64) -> Result<User, StoreError>;

    /// Fetch the durable record for `id`, creating it on first contact.
    ///
    /// A non-blank `username` that differs from the stored one replaces
    /// it, so records track platform-side renames.
    async fn ensure_user(&self, id: i64, username: &str) -> Result<User, StoreError>;
}
