//! Identity Toolkit email/password accounts.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use skydeck_core::{Email, Uid};
use tracing::{info, instrument, warn};
use url::Url;

use super::{FirebaseClient, FirebaseError, FirebaseSession, expires_at, read_json};
use crate::identity::{
    AuthEvent, AuthEventHub, AuthEvents, AuthUser, IdentityError, IdentityProvider,
};

/// Identity Toolkit REST base.
const ACCOUNTS_ENDPOINT: &str = "https://identitytoolkit.googleapis.com/v1/";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

/// Response from `accounts:signUp` and `accounts:signInWithPassword`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    id_token: String,
    refresh_token: String,
    /// Token lifetime in seconds, as a string.
    expires_in: String,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: String,
    #[serde(default)]
    email_verified: bool,
}

/// [`IdentityProvider`] backed by Firebase Authentication.
pub struct FirebaseIdentity {
    client: FirebaseClient,
    events: AuthEventHub,
}

impl FirebaseIdentity {
    #[must_use]
    pub fn new(client: FirebaseClient) -> Self {
        Self {
            client,
            events: AuthEventHub::new(),
        }
    }

    fn accounts_url(&self, method: &str) -> Result<Url, FirebaseError> {
        let mut url = Url::parse(&format!("{ACCOUNTS_ENDPOINT}accounts:{method}"))?;
        url.query_pairs_mut().append_pair("key", self.client.api_key());
        Ok(url)
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<T, FirebaseError> {
        let url = self.accounts_url(method)?;
        let response = self.client.http().post(url).json(body).send().await?;
        read_json(response).await
    }

    /// Exchange a password for tokens and make the user current.
    async fn password_flow(
        &self,
        method: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthUser, FirebaseError> {
        let tokens: TokenResponse = self
            .call(
                method,
                &PasswordRequest {
                    email: email.as_str(),
                    password: password.expose_secret(),
                    return_secure_token: true,
                },
            )
            .await?;

        let id_token = SecretString::from(tokens.id_token);
        let user = self
            .lookup(&id_token)
            .await?
            .unwrap_or_else(|| AuthUser {
                uid: Uid::new(tokens.local_id),
                email: email.clone(),
                email_verified: false,
            });

        self.client
            .set_session(Some(FirebaseSession {
                user: user.clone(),
                id_token,
                refresh_token: SecretString::from(tokens.refresh_token),
                expires_at: expires_at(&tokens.expires_in),
            }))
            .await;
        self.events.publish(AuthEvent::SignedIn(user.clone()));
        Ok(user)
    }

    async fn lookup(&self, id_token: &SecretString) -> Result<Option<AuthUser>, FirebaseError> {
        let found: LookupResponse = self
            .call("lookup", &json!({ "idToken": id_token.expose_secret() }))
            .await?;
        let Some(user) = found.users.into_iter().next() else {
            return Ok(None);
        };
        let email = Email::parse(&user.email)
            .map_err(|e| FirebaseError::InvalidValue(format!("account email: {e}")))?;
        Ok(Some(AuthUser {
            uid: Uid::new(user.local_id),
            email,
            email_verified: user.email_verified,
        }))
    }

    async fn require_token(&self) -> Result<SecretString, FirebaseError> {
        self.client.id_token().await?.ok_or(FirebaseError::NoSession)
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    #[instrument(skip(self, email, password))]
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthUser, IdentityError> {
        Ok(self
            .password_flow("signInWithPassword", email, password)
            .await?)
    }

    #[instrument(skip(self, email, password))]
    async fn register(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthUser, IdentityError> {
        let user = self.password_flow("signUp", email, password).await?;
        info!(uid = %user.uid, "Firebase account created");
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        let was_signed_in = self.client.session().await.is_some();
        self.client.set_session(None).await;
        if was_signed_in {
            self.events.publish(AuthEvent::SignedOut);
        }
        Ok(())
    }

    async fn current_user(&self) -> Option<AuthUser> {
        self.client.session().await.map(|s| s.user)
    }

    #[instrument(skip(self))]
    async fn send_email_verification(&self) -> Result<(), IdentityError> {
        let token = self.require_token().await?;
        let _: serde_json::Value = self
            .call(
                "sendOobCode",
                &json!({
                    "requestType": "VERIFY_EMAIL",
                    "idToken": token.expose_secret(),
                }),
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn reload_user(&self) -> Result<AuthUser, IdentityError> {
        let token = self.require_token().await?;
        let user = self
            .lookup(&token)
            .await?
            .ok_or(IdentityError::NotSignedIn)?;

        if let Some(mut session) = self.client.session().await {
            session.user = user.clone();
            self.client.set_session(Some(session)).await;
        }
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn delete_current_user(&self) -> Result<(), IdentityError> {
        let token = self.require_token().await?;
        let _: serde_json::Value = self
            .call("delete", &json!({ "idToken": token.expose_secret() }))
            .await?;

        self.client.set_session(None).await;
        self.events.publish(AuthEvent::SignedOut);
        info!("Firebase account deleted");
        Ok(())
    }

    fn subscribe(&self) -> Result<AuthEvents, IdentityError> {
        // The session lock is async; a subscriber racing a sign-in sees the
        // sign-in as its next event instead.
        let current = match self.client.inner.session.try_read() {
            Ok(session) => session.as_ref().map(|s| s.user.clone()),
            Err(_) => {
                warn!("Session busy while subscribing, starting signed out");
                None
            }
        };
        self.events.subscribe(current)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::FirebaseConfig;

    fn identity() -> FirebaseIdentity {
        FirebaseIdentity::new(
            FirebaseClient::new(FirebaseConfig {
                api_key: SecretString::from("AIzaSyTest"),
                project_id: "sky-deck".to_owned(),
                storage_bucket: "sky-deck.firebasestorage.app".to_owned(),
            })
            .unwrap(),
        )
    }

    #[test]
    fn test_accounts_url() {
        let url = identity().accounts_url("signInWithPassword").unwrap();
        assert_eq!(
            url.as_str(),
            "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword?key=AIzaSyTest"
        );
    }

    #[test]
    fn test_token_response_shape() {
        let tokens: TokenResponse = serde_json::from_str(
            r#"{"kind":"identitytoolkit#VerifyPasswordResponse","localId":"u1",
                "email":"guest@example.ph","idToken":"id","refreshToken":"r",
                "expiresIn":"3600","registered":true}"#,
        )
        .unwrap();
        assert_eq!(tokens.local_id, "u1");
        assert_eq!(tokens.expires_in, "3600");
    }

    #[tokio::test]
    async fn test_signed_out_without_session() {
        let idp = identity();
        assert!(idp.current_user().await.is_none());
        assert!(matches!(
            idp.reload_user().await,
            Err(IdentityError::NotSignedIn)
        ));
        let mut events = idp.subscribe().unwrap();
        assert_eq!(events.try_recv(), Some(AuthEvent::SignedOut));
    }
}
