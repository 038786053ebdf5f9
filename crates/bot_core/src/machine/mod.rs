//! State machine module
//!
//! Contains the FSM implementation for the per-user interaction
//! lifecycle: the closed state set, the inbound event vocabulary, and
//! the persistence-mediated transition logic.

mod events;
mod states;
mod transitions;

pub use events::{ParseEventError, UserEvent};
pub use states::{FlowOrigin, UserState};
pub use transitions::{StateMachine, Transition};
