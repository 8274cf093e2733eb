//! HTTP/JSON transport with a fixed retry budget.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use schemaward_core::PolicyKind;

use crate::auth::Credential;
use crate::client::{RemoteError, Result, SchemaTransport};
use crate::wire::{CollectionUpdate, SchemaAggregate};

/// Pause between attempts of the same RPC.
const RETRY_PAUSE: Duration = Duration::from_millis(200);

/// Transport speaking JSON to `{host}/v1/schema`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    attempts: u32,
}

impl HttpTransport {
    /// `attempts` counts the first try; values below 1 are treated as 1.
    pub fn new(host: &str, attempts: u32, request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| RemoteError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: host.trim_end_matches('/').to_string(),
            attempts: attempts.max(1),
        })
    }

    fn schema_url(&self) -> String {
        format!("{}/v1/schema", self.base_url)
    }

    fn collection_url(&self, kind: PolicyKind) -> String {
        format!("{}/v1/schema/{}", self.base_url, kind.collection())
    }

    /// Send with retry. Only transport failures and 5xx are retried.
    async fn send(
        &self,
        method: Method,
        url: &str,
        credential: &Credential,
        body: Option<&CollectionUpdate>,
    ) -> Result<reqwest::Response> {
        let kind = body.map(CollectionUpdate::kind);
        let mut last_err = String::new();

        for attempt in 1..=self.attempts {
            if attempt > 1 {
                tracing::debug!(attempt, max = self.attempts, url = %url, "Retrying RPC");
                tokio::time::sleep(RETRY_PAUSE).await;
            }

            let mut req = self
                .http
                .request(method.clone(), url)
                .bearer_auth(credential.access_token());
            if let Some(update) = body {
                req = req.json(update);
            }

            match req.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return Ok(resp);
                    }
                    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                        let text = resp.text().await.unwrap_or_default();
                        return Err(RemoteError::Unauthenticated(format!("HTTP {status}: {text}")));
                    }
                    if status.is_client_error() {
                        let text = resp.text().await.unwrap_or_default();
                        return Err(RemoteError::rejected(kind, status.as_u16(), text));
                    }
                    last_err = format!("HTTP {status}");
                }
                Err(e) => {
                    last_err = e.to_string();
                }
            }
        }

        Err(RemoteError::Unavailable(format!(
            "{method} {url}: all {} attempts failed: {last_err}",
            self.attempts
        )))
    }
}

#[async_trait]
impl SchemaTransport for HttpTransport {
    async fn fetch_schema(&self, credential: &Credential) -> Result<SchemaAggregate> {
        let url = self.schema_url();
        let resp = self.send(Method::GET, &url, credential, None).await?;
        resp.json::<SchemaAggregate>()
            .await
            .map_err(|e| RemoteError::Decode(format!("schema aggregate: {e}")))
    }

    async fn replace_collection(
        &self,
        credential: &Credential,
        update: &CollectionUpdate,
    ) -> Result<()> {
        let url = self.collection_url(update.kind());
        self.send(Method::PUT, &url, credential, Some(update)).await?;
        Ok(())
    }
}
