//! CLI command implementations.

pub mod admin;
pub mod menu;
pub mod news;
pub mod role;
pub mod seed;

use skydeck_backend::ServiceError;
use skydeck_backend::firebase::FirebaseError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The Firebase client could not be built.
    #[error("Firebase setup failed: {0}")]
    Firebase(#[from] FirebaseError),

    /// A backend operation failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Invalid command-line input.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Some items of a batch failed.
    #[error("{failed} of {total} items failed")]
    Partial { failed: usize, total: usize },

    /// Output could not be rendered.
    #[error("Output encoding failed: {0}")]
    Output(#[from] serde_json::Error),
}
