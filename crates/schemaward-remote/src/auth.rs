//! Bearer credential acquisition: OIDC discovery and the password grant.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use schemaward_core::CredentialSource;
use serde::Deserialize;

use crate::client::{RemoteError, Result};

/// Scopes requested by the password grant.
pub const SCOPES: [&str; 3] = ["openid", "email", "profile"];

/// A bearer token attached to every RPC of a session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_token: String,
    issued_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            issued_at: Utc::now(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// The two endpoints taken from the identity provider's metadata document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMetadata {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
}

/// Parse an OIDC metadata document.
pub fn parse_metadata(body: &[u8]) -> Result<ProviderMetadata> {
    let doc: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| RemoteError::Discovery(format!("metadata is not valid JSON: {e}")))?;

    let field = |key: &str| -> Result<String> {
        doc.get(key)
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| RemoteError::Discovery(format!("metadata has no string '{key}'")))
    };

    Ok(ProviderMetadata {
        authorization_endpoint: field("authorization_endpoint")?,
        token_endpoint: field("token_endpoint")?,
    })
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Produces the session credential from a [`CredentialSource`].
#[derive(Debug, Clone)]
pub struct AuthSession {
    http: reqwest::Client,
}

impl AuthSession {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Discovery(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// Obtain a credential. A static token involves no network call.
    pub async fn establish(
        &self,
        discovery_uri: Option<&str>,
        source: &CredentialSource,
    ) -> Result<Credential> {
        match source {
            CredentialSource::Static { access_token } => {
                tracing::info!("Using static access token");
                Ok(Credential::new(access_token.clone()))
            }
            CredentialSource::Password {
                client_id,
                client_secret,
                username,
                password,
            } => {
                let uri = discovery_uri.ok_or_else(|| {
                    RemoteError::Discovery("no OIDC metadata URI configured".to_string())
                })?;
                let metadata = self.discover(uri).await?;
                self.exchange_password(
                    &metadata,
                    client_id,
                    client_secret.as_deref(),
                    username,
                    password,
                )
                .await
            }
        }
    }

    /// Fetch and parse the identity provider's metadata document.
    pub async fn discover(&self, uri: &str) -> Result<ProviderMetadata> {
        let resp = self
            .http
            .get(uri)
            .send()
            .await
            .map_err(|e| RemoteError::Discovery(format!("failed to get OIDC metadata: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RemoteError::Discovery(format!(
                "metadata endpoint returned HTTP {status}"
            )));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| RemoteError::Discovery(format!("failed to read OIDC metadata: {e}")))?;
        let metadata = parse_metadata(&body)?;

        tracing::debug!(token_endpoint = %metadata.token_endpoint, "OIDC metadata discovered");
        Ok(metadata)
    }

    /// Resource-owner password credentials grant against the token endpoint.
    pub async fn exchange_password(
        &self,
        metadata: &ProviderMetadata,
        client_id: &str,
        client_secret: Option<&str>,
        username: &str,
        password: &str,
    ) -> Result<Credential> {
        let scope = SCOPES.join(" ");
        let mut form = vec![
            ("grant_type", "password"),
            ("username", username),
            ("password", password),
            ("scope", scope.as_str()),
        ];

        let mut req = self.http.post(&metadata.token_endpoint);
        match client_secret {
            Some(secret) => req = req.basic_auth(client_id, Some(secret)),
            None => form.push(("client_id", client_id)),
        }

        let resp = req
            .form(&form)
            .send()
            .await
            .map_err(|e| RemoteError::TokenExchange(format!("token request failed: {e}")))?;
        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| RemoteError::TokenExchange(format!("failed to read token response: {e}")))?;

        let parsed: TokenResponse = serde_json::from_slice(&body).map_err(|e| {
            RemoteError::TokenExchange(format!("HTTP {status}: unparseable token response: {e}"))
        })?;

        if let Some(error) = parsed.error {
            let desc = parsed.error_description.unwrap_or_default();
            return Err(RemoteError::TokenExchange(format!("{error}: {desc}")));
        }
        if !status.is_success() {
            return Err(RemoteError::TokenExchange(format!(
                "token endpoint returned HTTP {status}"
            )));
        }

        let token = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| RemoteError::TokenExchange("no access_token in response".to_string()))?;

        let credential = Credential::new(token);
        tracing::info!(
            client_id = %client_id,
            username = %username,
            issued_at = %credential.issued_at(),
            "Access token acquired"
        );
        Ok(credential)
    }
}
