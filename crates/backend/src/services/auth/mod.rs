//! Authentication services.
//!
//! Admins and customers share one identity provider and are told apart by
//! their profile records. [`AdminAuth`] and [`CustomerAuth`] each refuse the
//! other side's identities at login.

mod admin;
mod customer;
mod error;

pub use admin::AdminAuth;
pub use customer::{CustomerAuth, CustomerRegistration, DeletionMode, DeletionReport, DeletionStep};
pub use error::AuthError;

use secrecy::{ExposeSecret, SecretString};
use skydeck_core::Email;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Parse and validate an email address.
fn parse_email(raw: &str) -> Result<Email, AuthError> {
    Ok(Email::parse(raw)?)
}

/// Validate password meets requirements.
fn validate_password(password: &SecretString) -> Result<(), AuthError> {
    if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_full_name(name: &str) -> Result<String, AuthError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::MissingName);
    }
    Ok(name.to_owned())
}
