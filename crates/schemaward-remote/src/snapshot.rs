//! On-demand fetching of the remote schema aggregate.

use std::time::Duration;

use tokio::time::Instant;

use crate::client::{RemoteError, Result, SchemaClient};
use crate::wire::SchemaAggregate;

/// Fetches a fresh aggregate per call. Nothing is cached between calls.
#[derive(Clone)]
pub struct SnapshotAccessor {
    client: SchemaClient,
    timeout: Duration,
}

impl SnapshotAccessor {
    pub fn new(client: SchemaClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// One remote call bounded by the accessor's own timeout.
    pub async fn fetch(&self) -> Result<SchemaAggregate> {
        self.fetch_until(Instant::now() + self.timeout).await
    }

    /// One remote call bounded by an operation-wide deadline.
    pub async fn fetch_until(&self, deadline: Instant) -> Result<SchemaAggregate> {
        tokio::time::timeout_at(deadline, self.client.fetch_schema())
            .await
            .map_err(|_| RemoteError::Timeout {
                operation: "schema fetch",
                after: self.timeout,
            })?
    }
}
