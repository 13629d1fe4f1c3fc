use thiserror::Error;

/// Error type for session-level operations in `iolite-core`.
///
/// Per-entity data errors never surface here — the session logs them
/// and continues. What does surface is fatal to the session: transport
/// failure, or a protocol state the session cannot recover from.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Transport or protocol failure from the API layer.
    #[error(transparent)]
    Api(#[from] iolite_api::Error),

    /// The session ended in a state it could not recover from.
    #[error("session failed: {message}")]
    Session { message: String },
}

impl CoreError {
    /// Returns `true` if re-running the OAuth exchange might help.
    pub fn is_auth_rejected(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_auth_rejected())
    }
}
