//! Event dispatch - routes a named event for a user into the state machine.

use std::sync::Arc;

use serde::Serialize;

use bot_core::{
    IdleHandler, PrivateModeHandler, RevokeHandler, ShuffleHandler, StartHandler, StoreError,
    Transition, User, UserAccess, UserEvent, UserStore,
};

/// One user's handler stack for the duration of a single delivery.
struct BotUser {
    user: User,
    store: Arc<dyn UserStore>,
}

impl UserAccess for BotUser {
    fn user(&self) -> &User {
        &self.user
    }

    fn user_mut(&mut self) -> &mut User {
        &mut self.user
    }

    fn store(&self) -> Arc<dyn UserStore> {
        Arc::clone(&self.store)
    }
}

impl StartHandler for BotUser {}
impl RevokeHandler for BotUser {}
impl PrivateModeHandler for BotUser {}
impl ShuffleHandler for BotUser {}
impl IdleHandler for BotUser {}

/// What a delivery attempt produced, in wire-ready form.
#[derive(Debug, Serialize)]
pub struct EventOutcome {
    pub accepted: bool,
    pub state: String,
    pub status: String,
    pub private_mode: bool,
    pub shuffle_mode: bool,
}

impl EventOutcome {
    fn new(transition: &Transition, user: &User) -> Self {
        Self {
            accepted: transition.succeeded(),
            state: transition.state().tag().to_string(),
            status: transition.state().description().to_string(),
            private_mode: user.private_mode.is_enabled(),
            shuffle_mode: user.shuffle_mode.is_enabled(),
        }
    }
}

pub struct Dispatcher {
    store: Arc<dyn UserStore>,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Deliver one event to one user.
    ///
    /// The user record is loaded (created on first contact), the event is
    /// run through the state machine, and the resulting view is returned.
    /// Rejected and unpersisted transitions come back as `accepted: false`
    /// rather than an error; `Err` means the record itself was unusable.
    pub async fn dispatch(
        &self,
        user_id: i64,
        username: &str,
        event: UserEvent,
    ) -> Result<EventOutcome, StoreError> {
        let user = self.store.ensure_user(user_id, username).await?;
        let mut handler = BotUser {
            user,
            store: Arc::clone(&self.store),
        };

        let transition = match event {
            UserEvent::Start => handler.handle_start().await,
            UserEvent::StartConfirmation => handler.handle_start_confirmation().await,
            UserEvent::StartRejection => handler.handle_start_rejection().await,
            UserEvent::Revoke => handler.handle_revoke().await,
            UserEvent::RevokeConfirmation => handler.handle_revoke_confirmation().await,
            UserEvent::RevokeRejection => handler.handle_revoke_rejection().await,
            UserEvent::PrivateMode => handler.handle_private_mode().await,
            UserEvent::PrivateModeEnabled => handler.handle_private_mode_enabled().await,
            UserEvent::PrivateModeDisabled => handler.handle_private_mode_disabled().await,
            UserEvent::Shuffle => handler.handle_shuffle().await,
            UserEvent::ShuffleEnabled => handler.handle_shuffle_enabled().await,
            UserEvent::ShuffleDisabled => handler.handle_shuffle_disabled().await,
            UserEvent::Idle => handler.handle_idle().await,
        };

        Ok(EventOutcome::new(&transition, handler.user()))
    }
}
