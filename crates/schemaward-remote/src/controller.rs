//! Per-kind resource controllers.
//!
//! Every operation re-fetches the aggregate; that is the only consistency
//! mechanism. Mutations replace the kind's whole collection, so two
//! controllers racing on the same collection resolve last-writer-wins.
//! Different collections never conflict.

use std::marker::PhantomData;
use std::time::Duration;

use schemaward_core::reconcile::{self, RemovalOrder};
use schemaward_core::{NamedEntry, SessionConfig};
use tokio::time::Instant;

use crate::binding::PolicyBinding;
use crate::client::{RemoteError, Result, SchemaClient};
use crate::snapshot::SnapshotAccessor;

/// Per-operation behaviour shared by all controllers of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Deadline covering fetch, reconcile, and write-back.
    pub timeout: Duration,
    pub removal: RemovalOrder,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            removal: RemovalOrder::default(),
        }
    }
}

impl From<&SessionConfig> for ControllerSettings {
    fn from(config: &SessionConfig) -> Self {
        Self {
            timeout: config.operation_timeout(),
            removal: config.removal,
        }
    }
}

/// Create/Read/Update/Delete/Exists for one policy kind.
pub struct ResourceController<P: PolicyBinding> {
    client: SchemaClient,
    accessor: SnapshotAccessor,
    settings: ControllerSettings,
    _kind: PhantomData<fn() -> P>,
}

impl<P: PolicyBinding> Clone for ResourceController<P> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            accessor: self.accessor.clone(),
            settings: self.settings,
            _kind: PhantomData,
        }
    }
}

impl<P: PolicyBinding> ResourceController<P> {
    pub fn new(client: SchemaClient, settings: ControllerSettings) -> Self {
        let accessor = SnapshotAccessor::new(client.clone(), settings.timeout);
        Self {
            client,
            accessor,
            settings,
            _kind: PhantomData,
        }
    }

    fn deadline(&self) -> Instant {
        Instant::now() + self.settings.timeout
    }

    async fn collection(&self, deadline: Instant) -> Result<Vec<P::Remote>> {
        let aggregate = self.accessor.fetch_until(deadline).await?;
        Ok(P::collection(aggregate))
    }

    async fn write_back(&self, entries: Vec<P::Remote>, deadline: Instant) -> Result<()> {
        let update = P::replacement(entries);
        tokio::time::timeout_at(deadline, self.client.replace(&update))
            .await
            .map_err(|_| RemoteError::Timeout {
                operation: "collection write-back",
                after: self.settings.timeout,
            })?
    }

    /// Ensure exactly `desired` exists. Returns its durable identifier.
    ///
    /// An existing entry with the same name is replaced whole; no fields
    /// carry over from it.
    pub async fn create(&self, desired: &P) -> Result<String> {
        desired.validate()?;
        let deadline = self.deadline();

        let current = self.collection(deadline).await?;
        let replaced = reconcile::exists(&current, desired.name());
        let next = reconcile::upsert(current, desired.to_remote());
        self.write_back(next, deadline).await?;

        tracing::info!(
            kind = %P::KIND,
            name = %desired.name(),
            replaced,
            "Entry applied"
        );
        Ok(desired.name().to_string())
    }

    /// Identical to [`create`](Self::create).
    pub async fn update(&self, desired: &P) -> Result<String> {
        self.create(desired).await
    }

    /// Current remote state of `id`, or `None` when it no longer exists.
    pub async fn read(&self, id: &str) -> Result<Option<P>> {
        let current = self.collection(self.deadline()).await?;
        let found = reconcile::find(&current, id).map(P::from_remote);
        if found.is_none() {
            tracing::debug!(kind = %P::KIND, name = %id, "Entry not found");
        }
        Ok(found)
    }

    /// Adopt an entry that already exists remotely under `id`.
    pub async fn import(&self, id: &str) -> Result<Option<P>> {
        let found = self.read(id).await?;
        if found.is_some() {
            tracing::info!(kind = %P::KIND, name = %id, "Entry imported");
        }
        Ok(found)
    }

    /// Remove `id`. Returns whether a write-back was issued.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let deadline = self.deadline();
        let current = self.collection(deadline).await?;
        if !reconcile::exists(&current, id) {
            tracing::debug!(kind = %P::KIND, name = %id, "Delete of absent entry skipped");
            return Ok(false);
        }

        let next = reconcile::remove(current, id, self.settings.removal);
        self.write_back(next, deadline).await?;

        tracing::info!(kind = %P::KIND, name = %id, "Entry deleted");
        Ok(true)
    }

    pub async fn exists(&self, id: &str) -> Result<bool> {
        let current = self.collection(self.deadline()).await?;
        Ok(reconcile::exists(&current, id))
    }

    /// All entries of this kind, in remote order.
    pub async fn list(&self) -> Result<Vec<P>> {
        let current = self.collection(self.deadline()).await?;
        Ok(current.iter().map(P::from_remote).collect())
    }
}
