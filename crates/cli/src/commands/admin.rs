//! Admin account commands.
//!
//! # Usage
//!
//! ```bash
//! SKYDECK_ADMIN_PASSWORD=... skydeck admin create -e owner@lagusancoffee.com
//! ```
//!
//! # Environment Variables
//!
//! - `SKYDECK_ADMIN_EMAILS` - The address must be on this allow-list
//! - `SKYDECK_ADMIN_PASSWORD` - Password, when `--password` is not given

use secrecy::SecretString;
use skydeck_backend::AppState;
use tracing::info;

use super::CommandError;

/// Register an administrator account and sign out again.
///
/// # Errors
///
/// Returns `NotPermitted` if the email is not allow-listed, or the identity
/// provider's error.
pub async fn create(state: &AppState, email: &str, password: String) -> Result<(), CommandError> {
    let auth = state.admin_auth();
    let password = SecretString::from(password);

    let user = auth.register(email, &password).await?;
    info!("Admin created: {} ({})", user.email, user.uid);

    auth.logout().await?;
    Ok(())
}
