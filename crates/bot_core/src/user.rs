//! User entity - identity, mode attributes, and the current state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::machine::UserState;
use crate::storage::StateUpdate;

/// Two-valued mode attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Toggle {
    Enabled,
    #[default]
    Disabled,
}

impl Toggle {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled)
    }
}

/// One end user of the bot.
///
/// This struct doubles as the durable record: stores serialize it as-is,
/// so in-memory state mirrors persisted state after any successful read.
/// Users are created on first contact and never deleted here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub private_mode: Toggle,
    #[serde(default)]
    pub shuffle_mode: Toggle,
    #[serde(default)]
    pub state: UserState,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            username: username.into(),
            private_mode: Toggle::Disabled,
            shuffle_mode: Toggle::Disabled,
            state: UserState::Idle,
            created_at: now,
            updated_at: now,
        }
    }

    /// Take over a newer platform-supplied username.
    ///
    /// A blank name never replaces a known one; transports may deliver
    /// events without it. Returns whether anything changed so stores
    /// know to write the record back.
    pub fn refresh_username(&mut self, username: &str) -> bool {
        if username.is_empty() || self.username == username {
            return false;
        }
        self.username = username.to_string();
        self.updated_at = Utc::now();
        true
    }

    /// Apply a committed update.
    ///
    /// Only called after the matching durable write was confirmed, by the
    /// state machine on the in-memory user and by stores on the stored
    /// record. Failed transitions never reach this.
    pub fn apply(&mut self, update: &StateUpdate) {
        self.state = update.next.clone();
        if let Some(mode) = update.private_mode {
            self.private_mode = mode;
        }
        if let Some(mode) = update.shuffle_mode {
            self.shuffle_mode = mode;
        }
        self.updated_at = Utc::now();
    }
}
