//! Authentication error types.

use skydeck_core::{EmailError, ErrorKind};
use thiserror::Error;

use crate::identity::IdentityError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Full name missing at registration.
    #[error("full name is required")]
    MissingName,

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid email or password")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("an account with this email already exists")]
    EmailInUse,

    /// The identity exists but may not use this side of the shop.
    #[error("{0}")]
    NotPermitted(String),

    /// The account was deactivated or deleted.
    #[error("this account is no longer active")]
    Inactive,

    /// The operation needs a signed-in user.
    #[error("not signed in")]
    NotSignedIn,

    /// Identity provider failure.
    #[error("{0}")]
    Provider(IdentityError),
}

impl AuthError {
    /// The caller-facing category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidEmail(_)
            | Self::WeakPassword(_)
            | Self::MissingName
            | Self::EmailInUse => ErrorKind::Validation,
            Self::InvalidCredentials
            | Self::NotPermitted(_)
            | Self::Inactive
            | Self::NotSignedIn => ErrorKind::Unauthorized,
            Self::Provider(_) => ErrorKind::ExternalService,
        }
    }
}

impl From<IdentityError> for AuthError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredentials => Self::InvalidCredentials,
            IdentityError::EmailInUse => Self::EmailInUse,
            IdentityError::WeakPassword(reason) => Self::WeakPassword(reason),
            IdentityError::NotSignedIn => Self::NotSignedIn,
            other @ (IdentityError::AlreadySubscribed | IdentityError::Provider(_)) => {
                Self::Provider(other)
            }
        }
    }
}
