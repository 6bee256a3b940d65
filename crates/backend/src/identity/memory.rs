//! In-process identity provider.
//!
//! Mirrors the hosted provider's rules that callers depend on: unique emails
//! (case-insensitive), six-character minimum passwords, and an auth-state
//! event on every sign-in, registration and sign-out.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use skydeck_core::{Email, Uid};
use uuid::Uuid;

use super::{AuthEvent, AuthEventHub, AuthEvents, AuthUser, IdentityError, IdentityProvider};

/// Provider-side minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

struct Account {
    user: AuthUser,
    password: SecretString,
}

#[derive(Default)]
struct Inner {
    // Keyed by lowercased email.
    accounts: HashMap<String, Account>,
    current: Option<String>,
    verification_emails: Vec<Email>,
}

/// Identity provider held entirely in memory.
#[derive(Default)]
pub struct InMemoryIdentity {
    inner: Mutex<Inner>,
    events: AuthEventHub,
}

impl InMemoryIdentity {
    /// Create a provider with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the user following the link in their verification email.
    pub fn confirm_email(&self, email: &Email) {
        if let Some(account) = self.lock().accounts.get_mut(&key(email)) {
            account.user.email_verified = true;
        }
    }

    /// Addresses that were sent a verification email, oldest first.
    #[must_use]
    pub fn verification_emails(&self) -> Vec<Email> {
        self.lock().verification_emails.clone()
    }

    /// Whether an account exists for `email`.
    #[must_use]
    pub fn has_account(&self, email: &Email) -> bool {
        self.lock().accounts.contains_key(&key(email))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_key(inner: &Inner) -> Result<String, IdentityError> {
        inner.current.clone().ok_or(IdentityError::NotSignedIn)
    }
}

fn key(email: &Email) -> String {
    email.as_str().to_ascii_lowercase()
}

#[async_trait]
impl IdentityProvider for InMemoryIdentity {
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthUser, IdentityError> {
        let user = {
            let mut inner = self.lock();
            let account = inner
                .accounts
                .get(&key(email))
                .ok_or(IdentityError::InvalidCredentials)?;
            if account.password.expose_secret() != password.expose_secret() {
                return Err(IdentityError::InvalidCredentials);
            }
            let user = account.user.clone();
            inner.current = Some(key(email));
            user
        };

        self.events.publish(AuthEvent::SignedIn(user.clone()));
        Ok(user)
    }

    async fn register(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthUser, IdentityError> {
        if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
            return Err(IdentityError::WeakPassword(format!(
                "password should be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        let user = {
            let mut inner = self.lock();
            if inner.accounts.contains_key(&key(email)) {
                return Err(IdentityError::EmailInUse);
            }
            let user = AuthUser {
                uid: Uid::new(Uuid::new_v4().simple().to_string()),
                email: email.clone(),
                email_verified: false,
            };
            inner.accounts.insert(
                key(email),
                Account {
                    user: user.clone(),
                    password: password.clone(),
                },
            );
            inner.current = Some(key(email));
            user
        };

        self.events.publish(AuthEvent::SignedIn(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        let was_signed_in = self.lock().current.take().is_some();
        if was_signed_in {
            self.events.publish(AuthEvent::SignedOut);
        }
        Ok(())
    }

    async fn current_user(&self) -> Option<AuthUser> {
        let inner = self.lock();
        inner
            .current
            .as_ref()
            .and_then(|k| inner.accounts.get(k))
            .map(|account| account.user.clone())
    }

    async fn send_email_verification(&self) -> Result<(), IdentityError> {
        let mut inner = self.lock();
        let current = Self::current_key(&inner)?;
        let email = inner
            .accounts
            .get(&current)
            .map(|account| account.user.email.clone())
            .ok_or(IdentityError::NotSignedIn)?;
        inner.verification_emails.push(email);
        Ok(())
    }

    async fn reload_user(&self) -> Result<AuthUser, IdentityError> {
        let inner = self.lock();
        let current = Self::current_key(&inner)?;
        inner
            .accounts
            .get(&current)
            .map(|account| account.user.clone())
            .ok_or(IdentityError::NotSignedIn)
    }

    async fn delete_current_user(&self) -> Result<(), IdentityError> {
        {
            let mut inner = self.lock();
            let current = Self::current_key(&inner)?;
            inner.accounts.remove(&current);
            inner.current = None;
        }
        self.events.publish(AuthEvent::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> Result<AuthEvents, IdentityError> {
        let current = {
            let inner = self.lock();
            inner
                .current
                .as_ref()
                .and_then(|k| inner.accounts.get(k))
                .map(|account| account.user.clone())
        };
        self.events.subscribe(current)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    #[tokio::test]
    async fn test_register_then_sign_in() {
        let idp = InMemoryIdentity::new();
        let registered = idp
            .register(&email("guest@example.ph"), &secret("latte-art"))
            .await
            .unwrap();
        idp.sign_out().await.unwrap();
        assert!(idp.current_user().await.is_none());

        let signed_in = idp
            .sign_in(&email("GUEST@example.ph"), &secret("latte-art"))
            .await
            .unwrap();
        assert_eq!(signed_in.uid, registered.uid);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let idp = InMemoryIdentity::new();
        idp.register(&email("guest@example.ph"), &secret("latte-art"))
            .await
            .unwrap();
        let err = idp
            .register(&email("Guest@Example.ph"), &secret("latte-art"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::EmailInUse));
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let idp = InMemoryIdentity::new();
        idp.register(&email("guest@example.ph"), &secret("latte-art"))
            .await
            .unwrap();
        let err = idp
            .sign_in(&email("guest@example.ph"), &secret("espresso"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_short_password_is_weak() {
        let idp = InMemoryIdentity::new();
        let err = idp
            .register(&email("guest@example.ph"), &secret("abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::WeakPassword(_)));
    }

    #[tokio::test]
    async fn test_events_follow_sign_in_and_out() {
        let idp = InMemoryIdentity::new();
        let mut events = idp.subscribe().unwrap();
        assert_eq!(events.recv().await, Some(AuthEvent::SignedOut));

        let user = idp
            .register(&email("guest@example.ph"), &secret("latte-art"))
            .await
            .unwrap();
        assert_eq!(events.recv().await, Some(AuthEvent::SignedIn(user)));

        idp.sign_out().await.unwrap();
        assert_eq!(events.recv().await, Some(AuthEvent::SignedOut));
    }

    #[tokio::test]
    async fn test_confirm_email_visible_after_reload() {
        let idp = InMemoryIdentity::new();
        idp.register(&email("guest@example.ph"), &secret("latte-art"))
            .await
            .unwrap();
        idp.send_email_verification().await.unwrap();
        assert_eq!(idp.verification_emails(), vec![email("guest@example.ph")]);

        idp.confirm_email(&email("guest@example.ph"));
        assert!(idp.reload_user().await.unwrap().email_verified);
    }
}
