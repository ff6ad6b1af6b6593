use thiserror::Error;

/// Local session store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session store contains invalid data: {0}")]
    Corrupt(String),

    #[error("session store lock poisoned")]
    Poisoned,
}

/// Outcome of a guarded operation that could not proceed.
///
/// Every refresh failure leaves the guard in `SessionState::Invalid`; callers
/// treat any of these as "must log in again" except `RetryExhausted`, which is
/// a final failure of a single request.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no refresh token available")]
    RefreshTokenMissing,

    #[error("refresh token was rejected: {0}")]
    RefreshTokenInvalid(String),

    #[error("refresh request failed: {0}")]
    RefreshNetworkError(String),

    #[error("refresh request timed out after {0:?}")]
    RefreshTimeout(std::time::Duration),

    #[error("session is invalid; re-authentication required")]
    SessionInvalid,

    #[error("request was still unauthorized after refreshing the session")]
    RetryExhausted,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Whether the caller must send the user back to the login entry point.
    pub fn requires_login(&self) -> bool {
        !matches!(self, SessionError::RetryExhausted)
    }
}
