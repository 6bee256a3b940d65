//! Firebase REST adapters.
//!
//! Implements the three ports against the hosted project:
//!
//! - [`FirestoreStore`] - Cloud Firestore documents API
//! - [`FirebaseIdentity`] - Identity Toolkit email/password accounts
//! - [`FirebaseBlobStore`] - Cloud Storage object deletes
//!
//! # Architecture
//!
//! - One [`FirebaseClient`] holds the HTTP client, the project config and the
//!   signed-in user's session
//! - Firestore and Storage requests carry the session's ID token, so security
//!   rules see the same user the identity adapter signed in
//! - ID tokens are refreshed through the secure token endpoint when they are
//!   within a minute of expiring

mod firestore;
mod identity;
mod storage;
pub mod value;

use std::sync::Arc;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

pub use firestore::FirestoreStore;
pub use identity::FirebaseIdentity;
pub use storage::FirebaseBlobStore;

use crate::blob::BlobError;
use crate::config::FirebaseConfig;
use crate::identity::{AuthUser, IdentityError};
use crate::store::StoreError;

/// Secure token endpoint used to refresh ID tokens.
const SECURE_TOKEN_ENDPOINT: &str = "https://securetoken.googleapis.com/v1/token";

/// Seconds before expiry at which an ID token is treated as expired.
const EXPIRY_BUFFER_SECS: i64 = 60;

/// Errors that can occur when talking to Firebase.
#[derive(Debug, Error)]
pub enum FirebaseError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error status.
    #[error("Firebase API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// A Firestore value could not be converted.
    #[error("invalid Firestore value: {0}")]
    InvalidValue(String),

    /// The operation needs a signed-in user.
    #[error("no signed-in Firebase session")]
    NoSession,
}

impl FirebaseError {
    /// Whether the API reported a missing resource.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    /// The API's error code (`EMAIL_EXISTS`, `NOT_FOUND`, ...), if any.
    ///
    /// Identity Toolkit appends a description after the code
    /// (`WEAK_PASSWORD : Password should be ...`); only the code is returned.
    #[must_use]
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } => message.split([' ', ':']).next(),
            _ => None,
        }
    }
}

impl From<FirebaseError> for StoreError {
    fn from(err: FirebaseError) -> Self {
        match err {
            FirebaseError::Http(e) => Self::Unavailable(e.to_string()),
            other => Self::Rejected(other.to_string()),
        }
    }
}

impl From<FirebaseError> for BlobError {
    fn from(err: FirebaseError) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<FirebaseError> for IdentityError {
    fn from(err: FirebaseError) -> Self {
        match err.api_code() {
            Some("EMAIL_EXISTS") => Self::EmailInUse,
            Some(
                "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS"
                | "INVALID_EMAIL",
            ) => Self::InvalidCredentials,
            Some("WEAK_PASSWORD") => Self::WeakPassword(
                "password should be at least 6 characters".to_owned(),
            ),
            Some("INVALID_ID_TOKEN" | "USER_NOT_FOUND" | "TOKEN_EXPIRED") => Self::NotSignedIn,
            _ if matches!(err, FirebaseError::NoSession) => Self::NotSignedIn,
            _ => Self::Provider(err.to_string()),
        }
    }
}

/// Error body shared by the Google REST APIs.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// A signed-in user's tokens.
#[derive(Debug, Clone)]
pub struct FirebaseSession {
    pub user: AuthUser,
    /// ID token sent as the bearer token.
    pub id_token: SecretString,
    pub refresh_token: SecretString,
    /// Unix timestamp when the ID token expires.
    pub expires_at: i64,
}

impl FirebaseSession {
    /// Check if the ID token has expired, with a one-minute buffer.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.expires_at - EXPIRY_BUFFER_SECS
    }
}

/// Response from the secure token endpoint.
#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    /// Token lifetime in seconds, as a string.
    expires_in: String,
}

/// Shared HTTP client and session for the Firebase adapters.
#[derive(Clone)]
pub struct FirebaseClient {
    inner: Arc<FirebaseClientInner>,
}

struct FirebaseClientInner {
    http: reqwest::Client,
    config: FirebaseConfig,
    session: RwLock<Option<FirebaseSession>>,
}

impl FirebaseClient {
    /// Create a client for the configured project.
    ///
    /// # Errors
    ///
    /// Returns `FirebaseError::Http` if the HTTP client cannot be built.
    pub fn new(config: FirebaseConfig) -> Result<Self, FirebaseError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(FirebaseClientInner {
                http,
                config,
                session: RwLock::new(None),
            }),
        })
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    pub(crate) fn config(&self) -> &FirebaseConfig {
        &self.inner.config
    }

    pub(crate) fn api_key(&self) -> &str {
        self.inner.config.api_key.expose_secret()
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// The current session, if any.
    pub async fn session(&self) -> Option<FirebaseSession> {
        self.inner.session.read().await.clone()
    }

    pub(crate) async fn set_session(&self, session: Option<FirebaseSession>) {
        *self.inner.session.write().await = session;
    }

    /// A valid ID token for the current user, refreshing it if needed.
    ///
    /// Returns `None` when nobody is signed in; requests then go out with the
    /// API key only.
    ///
    /// # Errors
    ///
    /// Returns an error if an expired token cannot be refreshed.
    pub async fn id_token(&self) -> Result<Option<SecretString>, FirebaseError> {
        let Some(session) = self.session().await else {
            return Ok(None);
        };
        if !session.is_expired() {
            return Ok(Some(session.id_token));
        }

        let refreshed = self.refresh(session).await?;
        let token = refreshed.id_token.clone();
        self.set_session(Some(refreshed)).await;
        Ok(Some(token))
    }

    #[instrument(skip_all, fields(uid = %session.user.uid))]
    async fn refresh(&self, session: FirebaseSession) -> Result<FirebaseSession, FirebaseError> {
        let mut url = url::Url::parse(SECURE_TOKEN_ENDPOINT)?;
        url.query_pairs_mut().append_pair("key", self.api_key());

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", session.refresh_token.expose_secret()),
        ];
        let response = self.http().post(url).form(&params).send().await?;
        let refreshed: RefreshResponse = read_json(response).await?;

        debug!("ID token refreshed");
        Ok(FirebaseSession {
            user: session.user,
            id_token: SecretString::from(refreshed.id_token),
            refresh_token: SecretString::from(refreshed.refresh_token),
            expires_at: expires_at(&refreshed.expires_in),
        })
    }

    /// Attach the bearer token, if there is a session.
    pub(crate) async fn authorize(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, FirebaseError> {
        Ok(match self.id_token().await? {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        })
    }
}

/// Unix timestamp for a token lifetime given in seconds.
pub(crate) fn expires_at(expires_in: &str) -> i64 {
    let lifetime = expires_in.trim().parse::<i64>().unwrap_or(3600);
    Utc::now().timestamp() + lifetime
}

/// Turn a non-success response into [`FirebaseError::Api`].
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, FirebaseError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorResponse>(&text)
        .map(|body| body.error.message)
        .unwrap_or(text);
    Err(FirebaseError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Check the status and decode a JSON body.
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, FirebaseError> {
    Ok(check_status(response).await?.json().await?)
}
