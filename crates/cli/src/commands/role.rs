//! Role inspection.

use skydeck_backend::AppState;
use skydeck_core::{Email, Uid};
use tracing::info;

use super::CommandError;

/// Resolve and print the role of `uid`.
///
/// # Errors
///
/// Returns `InvalidArgument` for a malformed email, or the resolver's error.
pub async fn resolve(state: &AppState, uid: &str, email: Option<&str>) -> Result<(), CommandError> {
    let email = email
        .map(Email::parse)
        .transpose()
        .map_err(|e| CommandError::InvalidArgument(format!("email: {e}")))?;

    let resolution = state
        .role_resolver()
        .resolve(&Uid::new(uid), email.as_ref())
        .await?;

    info!("{uid}: {}", serde_json::to_string(&resolution)?);
    Ok(())
}
