//! The `{success, data|error}` envelope handed back to UI-layer callers.
//!
//! Services return `Result<T, E>`; the envelope is the serialized shape of
//! that result. Callers inspect `success` instead of catching anything.
//!
//! ```
//! use skydeck_core::{Envelope, ErrorBody, ErrorKind};
//!
//! let ok: Envelope<u32> = Envelope::ok(7);
//! assert_eq!(
//!     serde_json::to_value(&ok).unwrap(),
//!     serde_json::json!({ "success": true, "data": 7 })
//! );
//!
//! let err: Envelope<u32> = Envelope::err(ErrorBody::new(ErrorKind::Capacity, "full"));
//! assert!(!err.is_success());
//! ```

use serde::{Deserialize, Serialize};

/// Coarse error category exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or malformed input, rejected before any external call.
    Validation,
    /// The publication cap is reached.
    Capacity,
    /// The referenced record does not exist.
    NotFound,
    /// Wrong identity for a privileged action.
    Unauthorized,
    /// The store, identity provider or blob store failed.
    ExternalService,
}

/// Error payload of a failed envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorBody {
    /// Build an error payload.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Uniform success/failure result shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Success {
        /// Always `true`.
        success: Flag<true>,
        data: T,
    },
    Failure {
        /// Always `false`.
        success: Flag<false>,
        error: ErrorBody,
    },
}

impl<T> Envelope<T> {
    /// Successful envelope.
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self::Success {
            success: Flag,
            data,
        }
    }

    /// Failed envelope.
    #[must_use]
    pub const fn err(error: ErrorBody) -> Self {
        Self::Failure {
            success: Flag,
            error,
        }
    }

    /// Whether the operation succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The data, if the operation succeeded.
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    /// The error, if the operation failed.
    #[must_use]
    pub const fn error(&self) -> Option<&ErrorBody> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }

    /// Convert back into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns the error body of a failed envelope.
    pub fn into_result(self) -> Result<T, ErrorBody> {
        match self {
            Self::Success { data, .. } => Ok(data),
            Self::Failure { error, .. } => Err(error),
        }
    }
}

/// A boolean that only (de)serializes as the constant `B`.
///
/// Keeps the untagged envelope from matching the wrong variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flag<const B: bool>;

impl<const B: bool> Serialize for Flag<B> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(B)
    }
}

impl<'de, const B: bool> Deserialize<'de> for Flag<B> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = bool::deserialize(deserializer)?;
        if value == B {
            Ok(Self)
        } else {
            Err(serde::de::Error::custom(format!("expected success = {B}")))
        }
    }
}
