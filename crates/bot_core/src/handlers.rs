//! Handler traits - capability seams the transport layer implements.
//!
//! Each trait covers one interaction flow and forwards to the state
//! machine by default, so a transport type only supplies access to its
//! user and store and opts into the flows it serves.

use std::sync::Arc;

use async_trait::async_trait;

use crate::machine::{StateMachine, Transition};
use crate::storage::UserStore;
use crate::user::User;

/// Access to the user record and the persistence port behind a handler.
pub trait UserAccess {
    fn user(&self) -> &User;
    fn user_mut(&mut self) -> &mut User;
    fn store(&self) -> Arc<dyn UserStore>;
}

/// Registration flow.
#[async_trait]
pub trait StartHandler: UserAccess + Send {
    async fn handle_start(&mut self) -> Transition {
        let store = self.store();
        StateMachine::new(self.user_mut(), store.as_ref()).on_start().await
    }

    async fn handle_start_confirmation(&mut self) -> Transition {
        let store = self.store();
        StateMachine::new(self.user_mut(), store.as_ref())
            .on_start_confirmation()
            .await
    }

    async fn handle_start_rejection(&mut self) -> Transition {
        let store = self.store();
        StateMachine::new(self.user_mut(), store.as_ref())
            .on_start_rejection()
            .await
    }
}

/// Revocation flow.
#[async_trait]
pub trait RevokeHandler: UserAccess + Send {
    async fn handle_revoke(&mut self) -> Transition {
        let store = self.store();
        StateMachine::new(self.user_mut(), store.as_ref()).on_revoke().await
    }

    async fn handle_revoke_confirmation(&mut self) -> Transition {
        let store = self.store();
        StateMachine::new(self.user_mut(), store.as_ref())
            .on_revoke_confirmation()
            .await
    }

    async fn handle_revoke_rejection(&mut self) -> Transition {
        let store = self.store();
        StateMachine::new(self.user_mut(), store.as_ref())
            .on_revoke_rejection()
            .await
    }
}

/// Private-mode sub-flow.
#[async_trait]
pub trait PrivateModeHandler: UserAccess + Send {
    async fn handle_private_mode(&mut self) -> Transition {
        let store = self.store();
        StateMachine::new(self.user_mut(), store.as_ref())
            .on_private_mode()
            .await
    }

    async fn handle_private_mode_enabled(&mut self) -> Transition {
        let store = self.store();
        StateMachine::new(self.user_mut(), store.as_ref())
            .on_private_mode_enabled()
            .await
    }

    async fn handle_private_mode_disabled(&mut self) -> Transition {
        let store = self.store();
        StateMachine::new(self.user_mut(), store.as_ref())
            .on_private_mode_disabled()
            .await
    }
}

/// Shuffle sub-flow.
#[async_trait]
pub trait ShuffleHandler: UserAccess + Send {
    async fn handle_shuffle(&mut self) -> Transition {
        let store = self.store();
        StateMachine::new(self.user_mut(), store.as_ref()).on_shuffle().await
    }

    async fn handle_shuffle_enabled(&mut self) -> Transition {
        let store = self.store();
        StateMachine::new(self.user_mut(), store.as_ref())
            .on_shuffle_enabled()
            .await
    }

    async fn handle_shuffle_disabled(&mut self) -> Transition {
        let store = self.store();
        StateMachine::new(self.user_mut(), store.as_ref())
            .on_shuffle_disabled()
            .await
    }
}

/// Reset flow.
#[async_trait]
pub trait IdleHandler: UserAccess + Send {
    async fn handle_idle(&mut self) -> Transition {
        let store = self.store();
        StateMachine::new(self.user_mut(), store.as_ref()).on_idle().await
    }
}
