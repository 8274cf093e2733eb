//! Configuration management for schemaward sessions.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`SCHEMAWARD__<KEY>`, e.g. `SCHEMAWARD__HOST`)
//! 2. Config file (schemaward.toml)
//! 3. Defaults

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{CoreError, Result};
use crate::reconcile::RemovalOrder;

/// Everything needed to open an authenticated session against the service.
#[derive(Clone, Deserialize)]
pub struct SessionConfig {
    /// Base URL of the remote schema service.
    #[serde(default)]
    pub host: String,

    /// OIDC metadata document (`.well-known/openid-configuration`).
    #[serde(default)]
    pub oidc_metadata_uri: Option<String>,

    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Pre-obtained bearer token. Takes precedence over the password grant.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Deadline for one fetch → reconcile → write-back operation.
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_secs: u64,

    /// Deadline for discovery plus token acquisition.
    #[serde(default = "default_session_timeout")]
    pub session_timeout_secs: u64,

    /// Total attempts per RPC, including the first.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default)]
    pub removal: RemovalOrder,
}

/// Where the session's bearer credential comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// OAuth2 resource-owner password credentials grant.
    Password {
        client_id: String,
        client_secret: Option<String>,
        username: String,
        password: String,
    },
    /// A token obtained out of band.
    Static { access_token: String },
}

fn default_operation_timeout() -> u64 {
    5
}

fn default_session_timeout() -> u64 {
    15
}

fn default_retry_attempts() -> u32 {
    2
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            oidc_metadata_uri: None,
            client_id: None,
            client_secret: None,
            username: None,
            password: None,
            access_token: None,
            operation_timeout_secs: default_operation_timeout(),
            session_timeout_secs: default_session_timeout(),
            retry_attempts: default_retry_attempts(),
            removal: RemovalOrder::default(),
        }
    }
}

impl SessionConfig {
    /// Load from `<file_prefix>.toml` (optional) and `SCHEMAWARD__<KEY>` variables.
    pub fn load(file_prefix: &str) -> Result<Self> {
        Self::load_with_env(file_prefix, environment())
    }

    fn load_with_env(file_prefix: &str, env: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(env)
            .build()?;
        Self::from_config(cfg)
    }

    /// Deserialize and validate an already-built configuration.
    pub fn from_config(cfg: config::Config) -> Result<Self> {
        let session: SessionConfig = cfg.try_deserialize()?;
        session.validate()?;
        tracing::debug!(host = %session.host, "Session configuration loaded");
        Ok(session)
    }

    fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(CoreError::Config("host is required".to_string()));
        }
        if self.operation_timeout_secs == 0 || self.session_timeout_secs == 0 {
            return Err(CoreError::Config(
                "timeouts must be at least one second".to_string(),
            ));
        }
        if self.retry_attempts == 0 {
            return Err(CoreError::Config(
                "retry_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    /// Resolve which credential flow this configuration selects.
    pub fn credential_source(&self) -> Result<CredentialSource> {
        if let Some(token) = non_empty(&self.access_token) {
            return Ok(CredentialSource::Static {
                access_token: token.to_string(),
            });
        }

        let mut missing = Vec::new();
        if non_empty(&self.oidc_metadata_uri).is_none() {
            missing.push("oidc_metadata_uri");
        }
        if non_empty(&self.client_id).is_none() {
            missing.push("client_id");
        }
        if non_empty(&self.username).is_none() {
            missing.push("username");
        }
        if non_empty(&self.password).is_none() {
            missing.push("password");
        }
        if !missing.is_empty() {
            return Err(CoreError::Config(format!(
                "set access_token, or all of: {}",
                missing.join(", ")
            )));
        }

        Ok(CredentialSource::Password {
            client_id: self.client_id.clone().unwrap_or_default(),
            client_secret: non_empty(&self.client_secret).map(String::from),
            username: self.username.clone().unwrap_or_default(),
            password: self.password.clone().unwrap_or_default(),
        })
    }
}

/// Values stay strings; numeric keys are converted during deserialization,
/// so credentials such as `007` keep their leading zeros.
fn environment() -> config::Environment {
    config::Environment::with_prefix("SCHEMAWARD").separator("__")
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("host", &self.host)
            .field("oidc_metadata_uri", &self.oidc_metadata_uri)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("operation_timeout_secs", &self.operation_timeout_secs)
            .field("session_timeout_secs", &self.session_timeout_secs)
            .field("retry_attempts", &self.retry_attempts)
            .field("removal", &self.removal)
            .finish()
    }
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password {
                client_id,
                username,
                ..
            } => f
                .debug_struct("Password")
                .field("client_id", client_id)
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Static { .. } => f.debug_struct("Static").finish_non_exhaustive(),
        }
    }
}
