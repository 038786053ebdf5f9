//! User events - Defines the inbound vocabulary that drives transitions.
//!
//! The transport layer maps platform command and callback names onto
//! these events; the name mapping lives in the `FromStr` impl.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when an external name maps to no known event.
///
/// This is a caller error, never silently defaulted to some event.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown event name: {0}")]
pub struct ParseEventError(pub String);

/// The fixed set of inbound events the state machine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserEvent {
    Start,
    StartConfirmation,
    StartRejection,
    Revoke,
    RevokeConfirmation,
    RevokeRejection,
    PrivateMode,
    PrivateModeEnabled,
    PrivateModeDisabled,
    Shuffle,
    ShuffleEnabled,
    ShuffleDisabled,
    Idle,
}

impl UserEvent {
    /// Check if this event arrives as a slash command.
    pub fn is_command(&self) -> bool {
        matches!(
            self,
            Self::Start | Self::Revoke | Self::PrivateMode | Self::Shuffle | Self::Idle
        )
    }

    /// Check if this event arrives as a button-press callback.
    pub fn is_callback(&self) -> bool {
        !self.is_command()
    }

    /// Canonical wire name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::StartConfirmation => "start_confirm",
            Self::StartRejection => "start_reject",
            Self::Revoke => "revoke",
            Self::RevokeConfirmation => "revoke_confirm",
            Self::RevokeRejection => "revoke_reject",
            Self::PrivateMode => "private_mode",
            Self::PrivateModeEnabled => "private_on",
            Self::PrivateModeDisabled => "private_off",
            Self::Shuffle => "shuffle",
            Self::ShuffleEnabled => "shuffle_on",
            Self::ShuffleDisabled => "shuffle_off",
            Self::Idle => "idle",
        }
    }
}

impl fmt::Display for UserEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UserEvent {
    type Err = ParseEventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Commands arrive with a leading slash, callbacks without.
        let name = s.trim().trim_start_matches('/');
        match name {
            "start" => Ok(Self::Start),
            "start_confirm" | "start_confirmation" => Ok(Self::StartConfirmation),
            "start_reject" | "start_rejection" => Ok(Self::StartRejection),
            "revoke" => Ok(Self::Revoke),
            "revoke_confirm" | "revoke_confirmation" => Ok(Self::RevokeConfirmation),
            "revoke_reject" | "revoke_rejection" => Ok(Self::RevokeRejection),
            "private" | "private_mode" => Ok(Self::PrivateMode),
            "private_on" | "private_mode_enabled" => Ok(Self::PrivateModeEnabled),
            "private_off" | "private_mode_disabled" => Ok(Self::PrivateModeDisabled),
            "shuffle" => Ok(Self::Shuffle),
            "shuffle_on" | "shuffle_enabled" => Ok(Self::ShuffleEnabled),
            "shuffle_off" | "shuffle_disabled" => Ok(Self::ShuffleDisabled),
            "idle" | "cancel" => Ok(Self::Idle),
            other => Err(ParseEventError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names_parse() {
        assert_eq!("/start".parse::<UserEvent>().unwrap(), UserEvent::Start);
        assert_eq!("/revoke".parse::<UserEvent>().unwrap(), UserEvent::Revoke);
        assert_eq!(
            "/private".parse::<UserEvent>().unwrap(),
            UserEvent::PrivateMode
        );
        assert_eq!("/cancel".parse::<UserEvent>().unwrap(), UserEvent::Idle);
    }

    #[test]
    fn test_callback_names_parse() {
        assert_eq!(
            "start_confirm".parse::<UserEvent>().unwrap(),
            UserEvent::StartConfirmation
        );
        assert_eq!(
            "shuffle_off".parse::<UserEvent>().unwrap(),
            UserEvent::ShuffleDisabled
        );
    }

    #[test]
    fn test_unknown_name_is_an_error() {
        let err = "teleport".parse::<UserEvent>().unwrap_err();
        assert_eq!(err, ParseEventError("teleport".to_string()));
    }

    #[test]
    fn test_command_callback_split() {
        assert!(UserEvent::Start.is_command());
        assert!(UserEvent::StartConfirmation.is_callback());
        assert!(!UserEvent::RevokeRejection.is_command());
    }

    #[test]
    fn test_canonical_names_round_trip() {
        for event in [
            UserEvent::Start,
            UserEvent::StartConfirmation,
            UserEvent::RevokeRejection,
            UserEvent::PrivateModeEnabled,
            UserEvent::ShuffleDisabled,
            UserEvent::Idle,
        ] {
            assert_eq!(event.name().parse::<UserEvent>().unwrap(), event);
        }
    }
}
