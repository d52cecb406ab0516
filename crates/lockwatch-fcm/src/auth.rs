// OAuth2 access tokens for the FCM API
//
// Production uses the service-account JWT bearer grant; tests and local
// emulators can plug in a fixed token.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use lockwatch_core::{Error, Result};
use reqwest::Client;
use tokio::sync::Mutex;

use crate::types::{JwtClaims, ServiceAccount, TokenResponse};

pub const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Tokens are refreshed this long before they expire
const EXPIRY_MARGIN_SECS: i64 = 60;

#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Always returns the same bearer token
#[derive(Debug, Clone)]
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AccessTokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Exchanges a signed service-account assertion for an access token and
/// caches it until shortly before expiry
pub struct ServiceAccountTokenSource {
    client: Client,
    account: ServiceAccount,
    key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    pub fn new(client: Client, account: ServiceAccount) -> Result<Self> {
        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
            .map_err(|e| Error::config(format!("Invalid service-account private key: {e}")))?;
        Ok(Self {
            client,
            account,
            key,
            cached: Mutex::new(None),
        })
    }

    fn assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let claims = JwtClaims {
            iss: &self.account.client_email,
            scope: FCM_SCOPE,
            aud: &self.account.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| Error::config(format!("Failed to sign service-account assertion: {e}")))
    }

    async fn exchange(&self, now: DateTime<Utc>) -> Result<CachedToken> {
        let assertion = self.assertion(now)?;
        let response = self
            .client
            .post(&self.account.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| Error::upstream(format!("Token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            // A refused grant means the credentials are wrong, not that Google is down
            return Err(if status.is_client_error() {
                Error::config(format!("Token exchange refused ({status}): {error_text}"))
            } else {
                Error::upstream(format!("Token endpoint error ({status}): {error_text}"))
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::upstream(format!("Invalid token response: {e}")))?;

        let expires_at = Duration::try_seconds(token.expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                Error::upstream(format!("Token response expires_in out of range: {}", token.expires_in))
            })?;

        tracing::debug!(
            client_email = %self.account.client_email,
            expires_in = token.expires_in,
            "Obtained FCM access token"
        );
        Ok(CachedToken {
            value: token.access_token,
            expires_at,
        })
    }
}

#[async_trait]
impl AccessTokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> Result<String> {
        // Held across the exchange so concurrent senders share one refresh
        let mut cached = self.cached.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref() {
            if now + Duration::seconds(EXPIRY_MARGIN_SECS) < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let fresh = self.exchange(now).await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }
}

impl std::fmt::Debug for ServiceAccountTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountTokenSource")
            .field("account", &self.account)
            .finish()
    }
}
