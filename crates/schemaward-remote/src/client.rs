//! Session establishment and the shared schema client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use schemaward_core::{CoreError, PolicyKind, SessionConfig, ValidationError};

use crate::auth::{AuthSession, Credential};
use crate::http::HttpTransport;
use crate::wire::{CollectionUpdate, SchemaAggregate};

/// Errors from session establishment and schema operations.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("OIDC discovery failed: {0}")]
    Discovery(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Remote service unavailable: {0}")]
    Unavailable(String),

    #[error("Credential rejected by remote service: {0}")]
    Unauthenticated(String),

    #[error("Remote service rejected {collection} write: HTTP {status}: {body}")]
    Rejected {
        collection: String,
        status: u16,
        body: String,
    },

    #[error("Deadline of {after:?} exceeded during {operation}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Malformed response from remote service: {0}")]
    Decode(String),

    #[error("Invalid declaration: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, RemoteError>;

/// The two remote calls every schema operation is built from.
///
/// Implementations own their retry budget; callers never retry.
#[async_trait]
pub trait SchemaTransport: Send + Sync {
    /// Fetch the entire schema aggregate.
    async fn fetch_schema(&self, credential: &Credential) -> Result<SchemaAggregate>;

    /// Replace one whole collection with the given entries.
    async fn replace_collection(
        &self,
        credential: &Credential,
        update: &CollectionUpdate,
    ) -> Result<()>;
}

/// An authenticated handle on the remote schema service.
///
/// Clone is cheap (inner Arc). The credential is fixed for the client's
/// lifetime; an expired token surfaces as [`RemoteError::Unauthenticated`].
#[derive(Clone)]
pub struct SchemaClient {
    transport: Arc<dyn SchemaTransport>,
    credential: Arc<Credential>,
}

impl SchemaClient {
    pub fn new(transport: Arc<dyn SchemaTransport>, credential: Credential) -> Self {
        Self {
            transport,
            credential: Arc::new(credential),
        }
    }

    /// Authenticate and open an HTTP transport to `config.host`.
    ///
    /// Discovery and token acquisition together are bounded by the
    /// session timeout; each identity provider request by the operation
    /// timeout. Nothing is sent to the host until a credential exists.
    pub async fn connect(config: &SessionConfig) -> Result<Self> {
        let source = config.credential_source()?;
        let auth = AuthSession::new(config.operation_timeout())?;

        let credential = tokio::time::timeout(
            config.session_timeout(),
            auth.establish(config.oidc_metadata_uri.as_deref(), &source),
        )
        .await
        .map_err(|_| RemoteError::Timeout {
            operation: "session establishment",
            after: config.session_timeout(),
        })??;

        let transport = HttpTransport::new(
            &config.host,
            config.retry_attempts,
            config.operation_timeout(),
        )?;

        tracing::info!(host = %config.host, "Schema session established");
        Ok(Self::new(Arc::new(transport), credential))
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Fetch the full aggregate with no deadline of its own.
    pub async fn fetch_schema(&self) -> Result<SchemaAggregate> {
        self.transport.fetch_schema(&self.credential).await
    }

    /// Replace one collection wholesale.
    pub async fn replace(&self, update: &CollectionUpdate) -> Result<()> {
        tracing::debug!(
            collection = update.kind().collection(),
            entries = update.len(),
            "Replacing collection"
        );
        self.transport
            .replace_collection(&self.credential, update)
            .await
    }
}

impl RemoteError {
    pub(crate) fn rejected(kind: Option<PolicyKind>, status: u16, body: String) -> Self {
        Self::Rejected {
            collection: kind.map_or("schema", |k| k.collection()).to_string(),
            status,
            body,
        }
    }
}
