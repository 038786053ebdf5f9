use thiserror::Error;

/// Failures reported by the persistence port.
///
/// Everything here is recoverable from the state machine's point of view:
/// a failed write resolves to a failed transition, never a panic. A
/// corrupt record is fatal to the enclosing operation only.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user {0} not found")]
    UserNotFound(i64),

    /// The durable state no longer matches the caller's view; another
    /// writer committed first.
    #[error("stale state for user {id}: caller saw {expected}, store has {found}")]
    StaleState {
        id: i64,
        expected: String,
        found: String,
    },

    /// A stored record does not resolve to any known state variant.
    #[error("corrupt user record: {0}")]
    CorruptRecord(String),

    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage operation timed out")]
    Timeout,
}
