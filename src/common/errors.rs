use thiserror::Error;

/// Errors surfaced by the relay core. None of these are fatal; the HTTP
/// layer maps them to status codes and the sweeper defers to its next cycle.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Registration with an empty or blank display name.
    #[error("display name must not be blank")]
    InvalidName,

    /// Registration with a name that is already present.
    #[error("participant `{0}` is already registered")]
    DuplicateName(String),

    /// Heartbeat or post from a name the registry does not know.
    #[error("participant `{0}` is not registered")]
    UnknownParticipant(String),

    /// Message rejected before it reached the log.
    #[error("invalid message: {0}")]
    ValidationFailed(String),

    /// Persistence mirror failure.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}
