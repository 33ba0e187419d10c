//! Auth error types.

use thiserror::Error;

use tidebook_state::StateError;

/// Result type alias for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors that can occur while signing users in and out.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("an account with email {0} already exists")]
    EmailTaken(String),

    #[error("no account with email {0}")]
    UnknownUser(String),

    #[error("incorrect password")]
    IncorrectPassword,

    #[error("selected role does not match the account")]
    RoleMismatch,

    #[error("state store error: {0}")]
    State(#[from] StateError),
}
