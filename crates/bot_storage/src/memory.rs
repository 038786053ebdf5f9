//! In-memory user store.

use async_trait::async_trait;
use dashmap::DashMap;

use bot_core::{StateUpdate, StoreError, User, UserStore};

/// Concurrent map of user records, keyed by user id.
///
/// The compare-and-set in `set_user_state` runs under the map's entry
/// lock, so two racing transitions for one user serialize and exactly
/// one of them wins.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<i64, User>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn set_user_state(&self, user: &User, update: &StateUpdate) -> Result<User, StoreError> {
        let mut entry = self
            .users
            .get_mut(&user.id)
            .ok_or(StoreError::UserNotFound(user.id))?;

        if entry.state != user.state {
            return Err(StoreError::StaleState {
                id: user.id,
                expected: user.state.tag().to_string(),
                found: entry.state.tag().to_string(),
            });
        }

        entry.apply(update);
        Ok(entry.clone())
    }

    async fn get_user(&self, id: i64) -> Result<User, StoreError> {
        self.users
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(StoreError::UserNotFound(id))
    }

    async fn ensure_user(&self, id: i64, username: &str) -> Result<User, StoreError> {
        let mut entry = self
            .users
            .entry(id)
            .or_insert_with(|| User::new(id, username));
        entry.refresh_username(username);
        Ok(entry.clone())
    }
}
