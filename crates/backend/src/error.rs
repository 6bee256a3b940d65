//! Unified error handling with Sentry integration.
//!
//! Every service returns `Result<T, ServiceError>`. UI-layer callers turn that
//! into the `{success, data|error}` envelope with
//! [`IntoEnvelope::into_envelope`], which also reports external-service
//! failures to Sentry before they leave the crate.

use skydeck_core::{Envelope, ErrorBody, ErrorKind};
use thiserror::Error;

use crate::blob::BlobError;
use crate::identity::IdentityError;
use crate::services::auth::AuthError;
use crate::store::StoreError;

/// Service-level error type.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or malformed input. Raised before any external call.
    #[error("{0}")]
    Validation(String),

    /// The publication cap is reached.
    #[error("{0}")]
    Capacity(String),

    /// A referenced record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Wrong identity for a privileged action.
    #[error("{0}")]
    Unauthorized(String),

    /// Authentication operation failed.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Document store operation failed.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Blob store operation failed.
    #[error("{0}")]
    Blob(#[from] BlobError),
}

impl ServiceError {
    /// Helper for validation failures.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Helper for missing records.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// The caller-facing category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Capacity(_) => ErrorKind::Capacity,
            Self::NotFound(_) | Self::Store(StoreError::NotFound { .. }) => ErrorKind::NotFound,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Auth(err) => err.kind(),
            Self::Store(_) | Self::Blob(_) => ErrorKind::ExternalService,
        }
    }
}

impl From<IdentityError> for ServiceError {
    fn from(err: IdentityError) -> Self {
        Self::Auth(AuthError::from(err))
    }
}

/// Result type alias for `ServiceError`.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Conversion of a service result into the caller-facing envelope.
pub trait IntoEnvelope<T> {
    /// Wrap the result, capturing external failures to Sentry.
    fn into_envelope(self) -> Envelope<T>;
}

impl<T> IntoEnvelope<T> for Result<T> {
    fn into_envelope(self) -> Envelope<T> {
        match self {
            Ok(data) => Envelope::ok(data),
            Err(err) => {
                let kind = err.kind();
                if kind == ErrorKind::ExternalService {
                    let event_id = sentry::capture_error(&err);
                    tracing::error!(
                        error = %err,
                        sentry_event_id = %event_id,
                        "External service error"
                    );
                } else {
                    tracing::debug!(error = %err, ?kind, "Operation rejected");
                }
                Envelope::err(ErrorBody::new(kind, err.to_string()))
            }
        }
    }
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str) {
    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(category.to_owned()),
        message: Some(message.to_owned()),
        level: sentry::Level::Info,
        ..Default::default()
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            ServiceError::Capacity("full".to_owned()).kind(),
            ErrorKind::Capacity
        );
        assert_eq!(
            ServiceError::Store(StoreError::not_found("news_updates", "n1")).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ServiceError::Store(StoreError::Unavailable("timeout".to_owned())).kind(),
            ErrorKind::ExternalService
        );
        assert_eq!(
            ServiceError::from(IdentityError::InvalidCredentials).kind(),
            ErrorKind::Unauthorized
        );
    }

    #[test]
    fn test_envelope_carries_message_verbatim() {
        let result: Result<()> = Err(ServiceError::Store(StoreError::Rejected(
            "PERMISSION_DENIED".to_owned(),
        )));
        let envelope = result.into_envelope();
        let error = envelope.error().cloned();
        assert_eq!(error.as_ref().map(|e| e.kind), Some(ErrorKind::ExternalService));
        assert!(
            error
                .map(|e| e.message)
                .unwrap_or_default()
                .contains("PERMISSION_DENIED")
        );
    }

    #[test]
    fn test_envelope_success() {
        let result: Result<u8> = Ok(7);
        assert_eq!(result.into_envelope().data(), Some(&7));
    }
}
