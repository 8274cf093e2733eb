//! Drive the resource controllers from a manifest or a single-entry command.

use std::collections::HashSet;

use schemaward_core::{Authorizer, Constraint, Index, NamedEntry, PolicyKind, Trigger};
use schemaward_remote::{ControllerSettings, PolicyBinding, ResourceController, SchemaClient};
use serde::Serialize;

use crate::error::{CliError, Result};
use crate::manifest::Manifest;

/// One controller per policy kind, sharing a session.
#[derive(Clone)]
pub struct Controllers {
    pub indexes: ResourceController<Index>,
    pub triggers: ResourceController<Trigger>,
    pub constraints: ResourceController<Constraint>,
    pub authorizers: ResourceController<Authorizer>,
}

impl Controllers {
    pub fn new(client: SchemaClient, settings: ControllerSettings) -> Self {
        Self {
            indexes: ResourceController::new(client.clone(), settings),
            triggers: ResourceController::new(client.clone(), settings),
            constraints: ResourceController::new(client.clone(), settings),
            authorizers: ResourceController::new(client, settings),
        }
    }
}

/// Counts reported after an apply run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    pub applied: usize,
    pub pruned: usize,
}

/// Ensure every manifest entry exists remotely, one operation per entry.
///
/// With `prune`, entries of a declared kind that the manifest does not name
/// are deleted afterwards. Kinds absent from the manifest are never pruned.
pub async fn apply_manifest(
    controllers: &Controllers,
    manifest: &Manifest,
    prune: bool,
) -> Result<ApplySummary> {
    manifest.validate()?;
    let prune_scope = if prune {
        manifest.declared_kinds()
    } else {
        Vec::new()
    };

    let mut summary = ApplySummary::default();
    for (applied, pruned) in [
        apply_kind(&controllers.indexes, &manifest.indexes, &prune_scope).await?,
        apply_kind(&controllers.triggers, &manifest.triggers, &prune_scope).await?,
        apply_kind(&controllers.constraints, &manifest.constraints, &prune_scope).await?,
        apply_kind(&controllers.authorizers, &manifest.authorizers, &prune_scope).await?,
    ] {
        summary.applied += applied;
        summary.pruned += pruned;
    }

    tracing::info!(
        applied = summary.applied,
        pruned = summary.pruned,
        "Manifest applied"
    );
    Ok(summary)
}

async fn apply_kind<P: PolicyBinding>(
    controller: &ResourceController<P>,
    declared: &[P],
    prune_scope: &[PolicyKind],
) -> Result<(usize, usize)> {
    for entry in declared {
        controller.create(entry).await?;
    }

    let mut pruned = 0;
    if prune_scope.contains(&P::KIND) {
        let wanted: HashSet<&str> = declared.iter().map(|e| e.name()).collect();
        let stale: Vec<String> = controller
            .list()
            .await?
            .into_iter()
            .map(|e| e.name().to_string())
            .filter(|name| !wanted.contains(name.as_str()))
            .collect();
        for name in stale {
            if controller.delete(&name).await? {
                pruned += 1;
            }
        }
    }

    Ok((declared.len(), pruned))
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| CliError::Serialization(e.to_string()))
}

/// Current remote state of one entry as JSON, or `None` when absent.
pub async fn get(
    controllers: &Controllers,
    kind: PolicyKind,
    name: &str,
) -> Result<Option<serde_json::Value>> {
    let found = match kind {
        PolicyKind::Index => controllers.indexes.read(name).await?.map(|e| to_json(&e)),
        PolicyKind::Trigger => controllers.triggers.read(name).await?.map(|e| to_json(&e)),
        PolicyKind::Constraint => controllers.constraints.read(name).await?.map(|e| to_json(&e)),
        PolicyKind::Authorizer => controllers.authorizers.read(name).await?.map(|e| to_json(&e)),
    };
    found.transpose()
}

/// Adopt an existing remote entry as a one-entry manifest.
///
/// Fails with [`CliError::Incomplete`] when the remote entry lacks a field
/// the manifest requires, since the rendered TOML would not load again.
pub async fn import(
    controllers: &Controllers,
    kind: PolicyKind,
    name: &str,
) -> Result<Option<Manifest>> {
    let mut manifest = Manifest::default();
    let found = match kind {
        PolicyKind::Index => controllers
            .indexes
            .import(name)
            .await?
            .map(|e| manifest.indexes.push(e))
            .is_some(),
        PolicyKind::Trigger => controllers
            .triggers
            .import(name)
            .await?
            .map(|e| manifest.triggers.push(e))
            .is_some(),
        PolicyKind::Constraint => controllers
            .constraints
            .import(name)
            .await?
            .map(|e| manifest.constraints.push(e))
            .is_some(),
        PolicyKind::Authorizer => controllers
            .authorizers
            .import(name)
            .await?
            .map(|e| manifest.authorizers.push(e))
            .is_some(),
    };
    if !found {
        return Ok(None);
    }
    manifest.validate().map_err(|e| CliError::Incomplete {
        kind,
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Some(manifest))
}

/// Delete one entry. Returns whether it existed.
pub async fn delete(controllers: &Controllers, kind: PolicyKind, name: &str) -> Result<bool> {
    let deleted = match kind {
        PolicyKind::Index => controllers.indexes.delete(name).await?,
        PolicyKind::Trigger => controllers.triggers.delete(name).await?,
        PolicyKind::Constraint => controllers.constraints.delete(name).await?,
        PolicyKind::Authorizer => controllers.authorizers.delete(name).await?,
    };
    Ok(deleted)
}

pub async fn exists(controllers: &Controllers, kind: PolicyKind, name: &str) -> Result<bool> {
    let present = match kind {
        PolicyKind::Index => controllers.indexes.exists(name).await?,
        PolicyKind::Trigger => controllers.triggers.exists(name).await?,
        PolicyKind::Constraint => controllers.constraints.exists(name).await?,
        PolicyKind::Authorizer => controllers.authorizers.exists(name).await?,
    };
    Ok(present)
}

/// Every entry of one kind as a JSON array, in remote order.
pub async fn list(controllers: &Controllers, kind: PolicyKind) -> Result<serde_json::Value> {
    match kind {
        PolicyKind::Index => to_json(&controllers.indexes.list().await?),
        PolicyKind::Trigger => to_json(&controllers.triggers.list().await?),
        PolicyKind::Constraint => to_json(&controllers.constraints.list().await?),
        PolicyKind::Authorizer => to_json(&controllers.authorizers.list().await?),
    }
}

/// Every policy kind with its collection name and description.
pub fn kinds() -> serde_json::Value {
    PolicyKind::ALL
        .iter()
        .map(|kind| {
            serde_json::json!({
                "kind": kind.as_str(),
                "collection": kind.collection(),
                "description": kind.description(),
            })
        })
        .collect()
}
