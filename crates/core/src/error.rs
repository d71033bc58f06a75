//! Session error types.

/// Errors that end a session.
///
/// Everything else (failed connects, lost links, missing job fields) is
/// reported through the status log and does not stop the session.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SessionError {
    /// The wireless link subsystem cannot be used at all.
    #[error("wireless link is not available")]
    RadioUnavailable,
}

impl SessionError {
    /// Whether retrying the session could succeed.
    ///
    /// Session errors are final by definition.
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::RadioUnavailable => false,
        }
    }
}
