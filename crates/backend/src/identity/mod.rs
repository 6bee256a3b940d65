//! Identity provider port.
//!
//! Email/password accounts live with an external provider. The provider also
//! pushes auth-state changes; that stream has exactly one subscriber at a
//! time, enforced by [`AuthEventHub`].

pub mod memory;

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use skydeck_core::{Email, Uid};
use thiserror::Error;
use tokio::sync::mpsc;

pub use memory::InMemoryIdentity;

/// The authenticated principal, as the provider reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: Uid,
    pub email: Email,
    pub email_verified: bool,
}

/// An auth-state change pushed by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(AuthUser),
    SignedOut,
}

/// Errors that can occur when talking to the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Wrong email or password, or no such account.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("an account with this email already exists")]
    EmailInUse,

    /// The provider rejected the password.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// The operation needs a signed-in user.
    #[error("no user is signed in")]
    NotSignedIn,

    /// Someone is already listening for auth-state changes.
    #[error("auth state already has a subscriber")]
    AlreadySubscribed,

    /// The provider returned something unexpected or could not be reached.
    #[error("identity provider error: {0}")]
    Provider(String),
}

/// Email/password identity operations.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Sign in and make the user current.
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthUser, IdentityError>;

    /// Create an account and make it current.
    async fn register(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthUser, IdentityError>;

    /// Sign the current user out. Signing out with nobody signed in is fine.
    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// The current user, if any.
    async fn current_user(&self) -> Option<AuthUser>;

    /// Send a verification email to the current user.
    async fn send_email_verification(&self) -> Result<(), IdentityError>;

    /// Re-read the current user from the provider (picks up verification).
    async fn reload_user(&self) -> Result<AuthUser, IdentityError>;

    /// Delete the current user's account and sign out.
    async fn delete_current_user(&self) -> Result<(), IdentityError>;

    /// Start receiving auth-state changes.
    ///
    /// The first event reflects the current state.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::AlreadySubscribed` while another subscription
    /// is alive.
    fn subscribe(&self) -> Result<AuthEvents, IdentityError>;
}

/// Receiving end of an auth-state subscription.
///
/// Dropping it (or calling [`unsubscribe`](Self::unsubscribe)) frees the slot
/// for the next subscriber.
#[derive(Debug)]
pub struct AuthEvents {
    receiver: mpsc::UnboundedReceiver<AuthEvent>,
}

impl AuthEvents {
    /// Wait for the next event. `None` once the provider is gone.
    pub async fn recv(&mut self) -> Option<AuthEvent> {
        self.receiver.recv().await
    }

    /// Take an already-delivered event without waiting.
    pub fn try_recv(&mut self) -> Option<AuthEvent> {
        self.receiver.try_recv().ok()
    }

    /// Stop listening.
    pub fn unsubscribe(mut self) {
        self.receiver.close();
    }
}

/// Single-subscriber fan-out used by provider adapters.
#[derive(Debug, Default)]
pub struct AuthEventHub {
    sender: Mutex<Option<mpsc::UnboundedSender<AuthEvent>>>,
}

impl AuthEventHub {
    /// Create a hub with no subscriber.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the subscriber and deliver `current` as its first event.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::AlreadySubscribed` if a live subscriber exists.
    pub fn subscribe(&self, current: Option<AuthUser>) -> Result<AuthEvents, IdentityError> {
        let mut slot = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|tx| !tx.is_closed()) {
            return Err(IdentityError::AlreadySubscribed);
        }

        let (tx, receiver) = mpsc::unbounded_channel();
        let first = current.map_or(AuthEvent::SignedOut, AuthEvent::SignedIn);
        // The receiver is alive, so this cannot fail.
        let _ = tx.send(first);
        *slot = Some(tx);

        Ok(AuthEvents { receiver })
    }

    /// Push an event to the subscriber, if there is one.
    pub fn publish(&self, event: AuthEvent) {
        let mut slot = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = slot.as_ref()
            && tx.send(event).is_err()
        {
            *slot = None;
        }
    }

    /// Whether a live subscriber exists.
    #[must_use]
    pub fn has_subscriber(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }
}
