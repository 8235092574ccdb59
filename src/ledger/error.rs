use derive_more::Display;

/// Failure taxonomy of the ledger. Every variant is terminal for the
/// triggering call; nothing here is retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum LedgerError {
    /// Malformed, missing or out-of-range input.
    #[display(fmt = "{}", _0)]
    Validation(String),
    /// Overlapping leave ranges or a duplicate attendance record.
    #[display(fmt = "{}", _0)]
    Conflict(String),
    /// Illegal state-machine transition.
    #[display(fmt = "{}", _0)]
    State(String),
}

impl std::error::Error for LedgerError {}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        LedgerError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        LedgerError::Conflict(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        LedgerError::State(msg.into())
    }
}
