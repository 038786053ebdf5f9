//! User states - Defines all points of the per-user interaction lifecycle.

use serde::{Deserialize, Serialize};

/// Where a confirmation or mode sub-flow was entered from.
///
/// Sub-flows return to their origin when they finish, so a registered
/// user keeps registration across a rejected revoke or a mode toggle.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlowOrigin {
    Idle,
    Registered,
}

impl FlowOrigin {
    /// The state this origin stands for.
    pub fn state(self) -> UserState {
        match self {
            FlowOrigin::Idle => UserState::Idle,
            FlowOrigin::Registered => UserState::Registered,
        }
    }
}

/// Defines the possible states of a user's interaction lifecycle.
///
/// Exactly one state is current per user at any time. Transitions are
/// mediated by the persistence port: the durable record moves first, the
/// in-memory value follows only on a confirmed write.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UserState {
    /// Awaiting user input; most commands are only legal from here.
    #[default]
    Idle,

    /// Registration requested, awaiting confirmation or rejection.
    AwaitingStart,

    /// Registration confirmed.
    Registered,

    /// Revocation requested, awaiting confirmation or rejection.
    AwaitingRevoke { origin: FlowOrigin },

    /// Access revoked.
    Revoked,

    /// Private-mode sub-flow: the enable/disable choice is pending.
    PrivateMode { origin: FlowOrigin },

    /// Shuffle sub-flow: the enable/disable choice is pending.
    Shuffle { origin: FlowOrigin },
}

impl UserState {
    /// Check if this state is waiting on a confirm/reject style decision.
    pub fn awaits_decision(&self) -> bool {
        matches!(
            self,
            Self::AwaitingStart
                | Self::AwaitingRevoke { .. }
                | Self::PrivateMode { .. }
                | Self::Shuffle { .. }
        )
    }

    /// Short tag used in logs.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingStart => "awaiting_start",
            Self::Registered => "registered",
            Self::AwaitingRevoke { .. } => "awaiting_revoke",
            Self::Revoked => "revoked",
            Self::PrivateMode { .. } => "private_mode",
            Self::Shuffle { .. } => "shuffle",
        }
    }

    /// Human readable description of the current state.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::AwaitingStart => "Waiting for registration confirmation",
            Self::Registered => "Registered",
            Self::AwaitingRevoke { .. } => "Waiting for revocation confirmation",
            Self::Revoked => "Access revoked",
            Self::PrivateMode { .. } => "Choosing private mode setting",
            Self::Shuffle { .. } => "Choosing shuffle setting",
        }
    }
}
