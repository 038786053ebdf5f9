//! bot_core - Per-user state machine and persistence contract
//!
//! This crate is the core of the bot backend: for any inbound event it
//! decides whether the requested action is legal from the user's current
//! state, what the resulting state is, and how that decision is durably
//! recorded through the [`UserStore`] port.
//!
//! - `machine` - states, events, and the transition logic
//! - `user` - the user entity and its mode attributes
//! - `storage` - the persistence port consumed by the machine
//! - `handlers` - capability traits forwarding events to the current state

pub mod error;
pub mod handlers;
pub mod machine;
pub mod storage;
pub mod user;

// Re-export commonly used types
pub use error::StoreError;
pub use handlers::{
    IdleHandler, PrivateModeHandler, RevokeHandler, ShuffleHandler, StartHandler, UserAccess,
};
pub use machine::{FlowOrigin, ParseEventError, StateMachine, Transition, UserEvent, UserState};
pub use storage::{StateUpdate, UserStore};
pub use user::{Toggle, User};
