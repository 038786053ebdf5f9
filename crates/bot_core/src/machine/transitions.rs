//! State transitions - per-event legality and the commit protocol.
//!
//! Legality is an explicit match per event with a default rejection arm.
//! A transition is durable before the in-memory user moves: the store
//! write commits first, and only then is the update applied. On any
//! write failure the user is left exactly where it was.

use std::time::Duration;

use tokio::time::timeout;

use crate::error::StoreError;
use crate::machine::states::{FlowOrigin, UserState};
use crate::storage::{StateUpdate, UserStore};
use crate::user::{Toggle, User};

/// How long a persistence write may take before it counts as failed.
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of one transition attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Event accepted; carries the new current state.
    Success(UserState),
    /// Event rejected or the write failed; carries the retained state.
    Failure(UserState),
}

impl Transition {
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The state the user is in after this attempt.
    pub fn state(&self) -> &UserState {
        match self {
            Self::Success(state) | Self::Failure(state) => state,
        }
    }
}

/// Per-user state machine, borrowed over one event delivery.
///
/// Events for one user must not run concurrently; the persistence
/// port's compare-and-set is the backstop when they do.
pub struct StateMachine<'a> {
    user: &'a mut User,
    store: &'a dyn UserStore,
}

impl<'a> StateMachine<'a> {
    pub fn new(user: &'a mut User, store: &'a dyn UserStore) -> Self {
        Self { user, store }
    }

    pub async fn on_start(&mut self) -> Transition {
        match self.user.state {
            UserState::Idle | UserState::Revoked => {
                self.commit("start", StateUpdate::to(UserState::AwaitingStart))
                    .await
            }
            _ => self.reject("start"),
        }
    }

    pub async fn on_start_confirmation(&mut self) -> Transition {
        match self.user.state {
            UserState::AwaitingStart => {
                self.commit(
                    "start_confirmation",
                    StateUpdate::to(UserState::Registered),
                )
                .await
            }
            _ => self.reject("start_confirmation"),
        }
    }

    pub async fn on_start_rejection(&mut self) -> Transition {
        match self.user.state {
            UserState::AwaitingStart => {
                self.commit("start_rejection", StateUpdate::to(UserState::Idle))
                    .await
            }
            _ => self.reject("start_rejection"),
        }
    }

    pub async fn on_revoke(&mut self) -> Transition {
        match self.user.state {
            UserState::Idle => {
                self.commit(
                    "revoke",
                    StateUpdate::to(UserState::AwaitingRevoke {
                        origin: FlowOrigin::Idle,
                    }),
                )
                .await
            }
            UserState::Registered => {
                self.commit(
                    "revoke",
                    StateUpdate::to(UserState::AwaitingRevoke {
                        origin: FlowOrigin::Registered,
                    }),
                )
                .await
            }
            _ => self.reject("revoke"),
        }
    }

    pub async fn on_revoke_confirmation(&mut self) -> Transition {
        match self.user.state {
            UserState::AwaitingRevoke { .. } => {
                self.commit("revoke_confirmation", StateUpdate::to(UserState::Revoked))
                    .await
            }
            _ => self.reject("revoke_confirmation"),
        }
    }

    pub async fn on_revoke_rejection(&mut self) -> Transition {
        match self.user.state {
            UserState::AwaitingRevoke { origin } => {
                self.commit("revoke_rejection", StateUpdate::to(origin.state()))
                    .await
            }
            _ => self.reject("revoke_rejection"),
        }
    }

    pub async fn on_private_mode(&mut self) -> Transition {
        match self.user.state {
            UserState::Idle => {
                self.commit(
                    "private_mode",
                    StateUpdate::to(UserState::PrivateMode {
                        origin: FlowOrigin::Idle,
                    }),
                )
                .await
            }
            UserState::Registered => {
                self.commit(
                    "private_mode",
                    StateUpdate::to(UserState::PrivateMode {
                        origin: FlowOrigin::Registered,
                    }),
                )
                .await
            }
            _ => self.reject("private_mode"),
        }
    }

    pub async fn on_private_mode_enabled(&mut self) -> Transition {
        match self.user.state {
            UserState::PrivateMode { origin } => {
                self.commit(
                    "private_mode_enabled",
                    StateUpdate::to(origin.state()).with_private_mode(Toggle::Enabled),
                )
                .await
            }
            _ => self.reject("private_mode_enabled"),
        }
    }

    pub async fn on_private_mode_disabled(&mut self) -> Transition {
        match self.user.state {
            UserState::PrivateMode { origin } => {
                self.commit(
                    "private_mode_disabled",
                    StateUpdate::to(origin.state()).with_private_mode(Toggle::Disabled),
                )
                .await
            }
            _ => self.reject("private_mode_disabled"),
        }
    }

    pub async fn on_shuffle(&mut self) -> Transition {
        match self.user.state {
            UserState::Idle => {
                self.commit(
                    "shuffle",
                    StateUpdate::to(UserState::Shuffle {
                        origin: FlowOrigin::Idle,
                    }),
                )
                .await
            }
            UserState::Registered => {
                self.commit(
                    "shuffle",
                    StateUpdate::to(UserState::Shuffle {
                        origin: FlowOrigin::Registered,
                    }),
                )
                .await
            }
            _ => self.reject("shuffle"),
        }
    }

    pub async fn on_shuffle_enabled(&mut self) -> Transition {
        match self.user.state {
            UserState::Shuffle { origin } => {
                self.commit(
                    "shuffle_enabled",
                    StateUpdate::to(origin.state()).with_shuffle_mode(Toggle::Enabled),
                )
                .await
            }
            _ => self.reject("shuffle_enabled"),
        }
    }

    pub async fn on_shuffle_disabled(&mut self) -> Transition {
        match self.user.state {
            UserState::Shuffle { origin } => {
                self.commit(
                    "shuffle_disabled",
                    StateUpdate::to(origin.state()).with_shuffle_mode(Toggle::Disabled),
                )
                .await
            }
            _ => self.reject("shuffle_disabled"),
        }
    }

    /// Reset to Idle. Legal from every state, including Idle itself,
    /// but still goes through the store and can fail like any write.
    pub async fn on_idle(&mut self) -> Transition {
        self.commit("idle", StateUpdate::to(UserState::Idle)).await
    }

    async fn commit(&mut self, event: &'static str, update: StateUpdate) -> Transition {
        let write = timeout(WRITE_TIMEOUT, self.store.set_user_state(self.user, &update));
        let result = match write.await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout),
        };

        match result {
            Ok(_) => {
                self.user.apply(&update);
                log::debug!(
                    "user {}: {} -> {}",
                    self.user.id,
                    event,
                    self.user.state.tag()
                );
                Transition::Success(self.user.state.clone())
            }
            Err(err) => {
                log::warn!("user {}: {} not persisted: {}", self.user.id, event, err);
                Transition::Failure(self.user.state.clone())
            }
        }
    }

    fn reject(&self, event: &'static str) -> Transition {
        log::trace!(
            "user {}: {} not legal from {}",
            self.user.id,
            event,
            self.user.state.tag()
        );
        Transition::Failure(self.user.state.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::UserEvent;

    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Store double: remembers the last committed record and can be
    /// switched to fail every write.
    #[derive(Default)]
    struct StubStore {
        saved: Mutex<Option<User>>,
        fail_writes: AtomicBool,
    }

    impl StubStore {
        fn failing() -> Self {
            let store = Self::default();
            store.fail_writes.store(true, Ordering::SeqCst);
            store
        }

        fn saved_state(&self) -> Option<UserState> {
            self.saved.lock().unwrap().as_ref().map(|u| u.state.clone())
        }
    }

    #[async_trait]
    impl UserStore for StubStore {
        async fn set_user_state(
            &self,
            user: &User,
            update: &StateUpdate,
        ) -> Result<User, StoreError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "injected write failure",
                )));
            }
            let mut updated = user.clone();
            updated.apply(update);
            *self.saved.lock().unwrap() = Some(updated.clone());
            Ok(updated)
        }

        async fn get_user(&self, id: i64) -> Result<User, StoreError> {
            self.saved
                .lock()
                .unwrap()
                .clone()
                .ok_or(StoreError::UserNotFound(id))
        }

        async fn ensure_user(&self, id: i64, username: &str) -> Result<User, StoreError> {
            Ok(User::new(id, username))
        }
    }

    /// Store double whose writes never complete.
    struct HangingStore;

    #[async_trait]
    impl UserStore for HangingStore {
        async fn set_user_state(
            &self,
            _user: &User,
            _update: &StateUpdate,
        ) -> Result<User, StoreError> {
            std::future::pending().await
        }

        async fn get_user(&self, id: i64) -> Result<User, StoreError> {
            Err(StoreError::UserNotFound(id))
        }

        async fn ensure_user(&self, id: i64, username: &str) -> Result<User, StoreError> {
            Ok(User::new(id, username))
        }
    }

    fn user_in(state: UserState) -> User {
        let mut user = User::new(7, "ada");
        user.state = state;
        user
    }

    async fn fire(machine: &mut StateMachine<'_>, event: UserEvent) -> Transition {
        match event {
            UserEvent::Start => machine.on_start().await,
            UserEvent::StartConfirmation => machine.on_start_confirmation().await,
            UserEvent::StartRejection => machine.on_start_rejection().await,
            UserEvent::Revoke => machine.on_revoke().await,
            UserEvent::RevokeConfirmation => machine.on_revoke_confirmation().await,
            UserEvent::RevokeRejection => machine.on_revoke_rejection().await,
            UserEvent::PrivateMode => machine.on_private_mode().await,
            UserEvent::PrivateModeEnabled => machine.on_private_mode_enabled().await,
            UserEvent::PrivateModeDisabled => machine.on_private_mode_disabled().await,
            UserEvent::Shuffle => machine.on_shuffle().await,
            UserEvent::ShuffleEnabled => machine.on_shuffle_enabled().await,
            UserEvent::ShuffleDisabled => machine.on_shuffle_disabled().await,
            UserEvent::Idle => machine.on_idle().await,
        }
    }

    #[tokio::test]
    async fn test_start_legal_from_idle() {
        let store = StubStore::default();
        let mut user = user_in(UserState::Idle);

        let result = StateMachine::new(&mut user, &store).on_start().await;

        assert_eq!(result, Transition::Success(UserState::AwaitingStart));
        assert_eq!(user.state, UserState::AwaitingStart);
        assert_eq!(store.saved_state(), Some(UserState::AwaitingStart));
    }

    #[tokio::test]
    async fn test_start_legal_from_revoked() {
        let store = StubStore::default();
        let mut user = user_in(UserState::Revoked);

        let result = StateMachine::new(&mut user, &store).on_start().await;

        assert_eq!(result, Transition::Success(UserState::AwaitingStart));
    }

    #[tokio::test]
    async fn test_illegal_event_retains_current_state() {
        let store = StubStore::default();
        let mut user = user_in(UserState::Idle);

        // Confirmation without a preceding start request.
        let result = StateMachine::new(&mut user, &store)
            .on_start_confirmation()
            .await;

        assert_eq!(result, Transition::Failure(UserState::Idle));
        assert_eq!(user.state, UserState::Idle);
        assert_eq!(store.saved_state(), None);
    }

    #[tokio::test]
    async fn test_every_decision_event_rejected_from_idle() {
        let store = StubStore::default();
        let mut user = user_in(UserState::Idle);
        let mut machine = StateMachine::new(&mut user, &store);

        for result in [
            machine.on_start_confirmation().await,
            machine.on_start_rejection().await,
            machine.on_revoke_confirmation().await,
            machine.on_revoke_rejection().await,
            machine.on_private_mode_enabled().await,
            machine.on_private_mode_disabled().await,
            machine.on_shuffle_enabled().await,
            machine.on_shuffle_disabled().await,
        ] {
            assert_eq!(result, Transition::Failure(UserState::Idle));
        }
        assert_eq!(store.saved_state(), None);
    }

    #[tokio::test]
    async fn test_registration_flow() {
        let store = StubStore::default();
        let mut user = user_in(UserState::Idle);
        let mut machine = StateMachine::new(&mut user, &store);

        assert!(machine.on_start().await.succeeded());
        let confirmed = machine.on_start_confirmation().await;

        assert_eq!(confirmed, Transition::Success(UserState::Registered));
        assert_eq!(user.state, UserState::Registered);
        assert_eq!(store.saved_state(), Some(UserState::Registered));
    }

    #[tokio::test]
    async fn test_start_rejection_returns_to_idle() {
        let store = StubStore::default();
        let mut user = user_in(UserState::AwaitingStart);

        let result = StateMachine::new(&mut user, &store).on_start_rejection().await;

        assert_eq!(result, Transition::Success(UserState::Idle));
    }

    #[tokio::test]
    async fn test_revoke_rejection_restores_origin() {
        let store = StubStore::default();
        let mut user = user_in(UserState::Registered);
        let mut machine = StateMachine::new(&mut user, &store);

        assert!(machine.on_revoke().await.succeeded());
        assert_eq!(
            user.state,
            UserState::AwaitingRevoke {
                origin: FlowOrigin::Registered
            }
        );

        let mut machine = StateMachine::new(&mut user, &store);
        let result = machine.on_revoke_rejection().await;

        assert_eq!(result, Transition::Success(UserState::Registered));
    }

    #[tokio::test]
    async fn test_revoke_confirmation_revokes() {
        let store = StubStore::default();
        let mut user = user_in(UserState::AwaitingRevoke {
            origin: FlowOrigin::Idle,
        });

        let result = StateMachine::new(&mut user, &store)
            .on_revoke_confirmation()
            .await;

        assert_eq!(result, Transition::Success(UserState::Revoked));
    }

    #[tokio::test]
    async fn test_idle_reset_is_idempotent() {
        let store = StubStore::default();
        let mut user = user_in(UserState::Shuffle {
            origin: FlowOrigin::Idle,
        });
        let mut machine = StateMachine::new(&mut user, &store);

        assert_eq!(
            machine.on_idle().await,
            Transition::Success(UserState::Idle)
        );
        assert_eq!(
            machine.on_idle().await,
            Transition::Success(UserState::Idle)
        );
    }

    #[tokio::test]
    async fn test_failed_write_leaves_user_untouched() {
        let store = StubStore::failing();
        let mut user = user_in(UserState::Idle);

        let result = StateMachine::new(&mut user, &store).on_start().await;

        assert_eq!(result, Transition::Failure(UserState::Idle));
        assert_eq!(user.state, UserState::Idle);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_mode_untouched() {
        let store = StubStore::failing();
        let mut user = user_in(UserState::PrivateMode {
            origin: FlowOrigin::Idle,
        });

        let result = StateMachine::new(&mut user, &store)
            .on_private_mode_enabled()
            .await;

        assert!(!result.succeeded());
        assert_eq!(
            user.state,
            UserState::PrivateMode {
                origin: FlowOrigin::Idle
            }
        );
        assert!(!user.private_mode.is_enabled());
    }

    // Paused clock: the runtime advances past the write deadline as soon
    // as the pending write is the only thing left to wait on.
    #[tokio::test(start_paused = true)]
    async fn test_timed_out_write_is_a_failed_transition() {
        let store = HangingStore;
        let mut user = user_in(UserState::Idle);

        let result = StateMachine::new(&mut user, &store).on_start().await;

        assert_eq!(result, Transition::Failure(UserState::Idle));
        assert_eq!(user.state, UserState::Idle);
    }

    #[tokio::test]
    async fn test_failed_write_fails_every_legal_transition() {
        let legal_pairs = [
            (UserState::Idle, UserEvent::Start),
            (UserState::Revoked, UserEvent::Start),
            (UserState::AwaitingStart, UserEvent::StartConfirmation),
            (UserState::AwaitingStart, UserEvent::StartRejection),
            (UserState::Idle, UserEvent::Revoke),
            (UserState::Registered, UserEvent::Revoke),
            (
                UserState::AwaitingRevoke {
                    origin: FlowOrigin::Idle,
                },
                UserEvent::RevokeConfirmation,
            ),
            (
                UserState::AwaitingRevoke {
                    origin: FlowOrigin::Registered,
                },
                UserEvent::RevokeRejection,
            ),
            (UserState::Idle, UserEvent::PrivateMode),
            (UserState::Registered, UserEvent::PrivateMode),
            (
                UserState::PrivateMode {
                    origin: FlowOrigin::Idle,
                },
                UserEvent::PrivateModeEnabled,
            ),
            (
                UserState::PrivateMode {
                    origin: FlowOrigin::Registered,
                },
                UserEvent::PrivateModeDisabled,
            ),
            (UserState::Idle, UserEvent::Shuffle),
            (UserState::Registered, UserEvent::Shuffle),
            (
                UserState::Shuffle {
                    origin: FlowOrigin::Idle,
                },
                UserEvent::ShuffleEnabled,
            ),
            (
                UserState::Shuffle {
                    origin: FlowOrigin::Registered,
                },
                UserEvent::ShuffleDisabled,
            ),
            (UserState::Idle, UserEvent::Idle),
            (UserState::Registered, UserEvent::Idle),
        ];

        for (state, event) in legal_pairs {
            let store = StubStore::failing();
            let mut user = user_in(state.clone());

            let result = fire(&mut StateMachine::new(&mut user, &store), event).await;

            assert_eq!(
                result,
                Transition::Failure(state.clone()),
                "{} from {}",
                event,
                state.tag()
            );
            assert_eq!(user.state, state, "{} from {}", event, state.tag());
            assert!(!user.private_mode.is_enabled());
            assert!(!user.shuffle_mode.is_enabled());
            assert_eq!(store.saved_state(), None);
        }
    }

    #[tokio::test]
    async fn test_mode_toggle_guard_outside_sub_flow() {
        let store = StubStore::default();
        let mut user = user_in(UserState::Idle);

        // Skipping the sub-flow entry must not flip the attribute.
        let result = StateMachine::new(&mut user, &store)
            .on_private_mode_enabled()
            .await;

        assert_eq!(result, Transition::Failure(UserState::Idle));
        assert!(!user.private_mode.is_enabled());
    }

    #[tokio::test]
    async fn test_mode_toggles_flip_attribute_and_return_to_origin() {
        let store = StubStore::default();
        let mut user = user_in(UserState::Registered);
        let mut machine = StateMachine::new(&mut user, &store);

        assert!(machine.on_shuffle().await.succeeded());
        let result = machine.on_shuffle_enabled().await;

        assert_eq!(result, Transition::Success(UserState::Registered));
        assert!(user.shuffle_mode.is_enabled());

        let mut machine = StateMachine::new(&mut user, &store);
        assert!(machine.on_shuffle().await.succeeded());
        assert!(machine.on_shuffle_disabled().await.succeeded());
        assert!(!user.shuffle_mode.is_enabled());
    }

    #[tokio::test]
    async fn test_private_mode_entry_illegal_while_awaiting_start() {
        let store = StubStore::default();
        let mut user = user_in(UserState::AwaitingStart);

        let result = StateMachine::new(&mut user, &store).on_private_mode().await;

        assert_eq!(
            result,
            Transition::Failure(UserState::AwaitingStart)
        );
    }
}
