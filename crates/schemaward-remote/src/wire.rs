//! The remote service's representation of the schema aggregate.
//!
//! Field names follow the service, not the caller-facing declarations:
//! a remote index says `docs`/`connections` where a declared index says
//! `target_docs`/`target_connections`.

use schemaward_core::{NamedEntry, PolicyKind};
use serde::{Deserialize, Serialize};

/// Snapshot of all four policy collections, fetched as one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaAggregate {
    #[serde(default)]
    pub indexes: Vec<RemoteIndex>,
    #[serde(default)]
    pub triggers: Vec<RemoteTrigger>,
    #[serde(default)]
    pub constraints: Vec<RemoteConstraint>,
    #[serde(default)]
    pub authorizers: Vec<RemoteAuthorizer>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIndex {
    pub name: String,
    #[serde(default)]
    pub gtype: String,
    #[serde(default)]
    pub expression: String,
    #[serde(default)]
    pub docs: bool,
    #[serde(default)]
    pub connections: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTrigger {
    pub name: String,
    #[serde(default)]
    pub gtype: String,
    #[serde(default)]
    pub expression: String,
    #[serde(default)]
    pub trigger: String,
    #[serde(default)]
    pub target_docs: bool,
    #[serde(default)]
    pub target_connections: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConstraint {
    pub name: String,
    #[serde(default)]
    pub gtype: String,
    #[serde(default)]
    pub expression: String,
    #[serde(default)]
    pub target_docs: bool,
    #[serde(default)]
    pub target_connections: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAuthorizer {
    pub name: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub expression: String,
    #[serde(default)]
    pub target_requests: bool,
    #[serde(default)]
    pub target_responses: bool,
}

impl NamedEntry for RemoteIndex {
    fn name(&self) -> &str {
        &self.name
    }
}

impl NamedEntry for RemoteTrigger {
    fn name(&self) -> &str {
        &self.name
    }
}

impl NamedEntry for RemoteConstraint {
    fn name(&self) -> &str {
        &self.name
    }
}

impl NamedEntry for RemoteAuthorizer {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A full replacement for exactly one collection.
///
/// Serializes as `{"<collection>": [...]}`, the write-back request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionUpdate {
    Indexes(Vec<RemoteIndex>),
    Triggers(Vec<RemoteTrigger>),
    Constraints(Vec<RemoteConstraint>),
    Authorizers(Vec<RemoteAuthorizer>),
}

impl CollectionUpdate {
    pub fn kind(&self) -> PolicyKind {
        match self {
            Self::Indexes(_) => PolicyKind::Index,
            Self::Triggers(_) => PolicyKind::Trigger,
            Self::Constraints(_) => PolicyKind::Constraint,
            Self::Authorizers(_) => PolicyKind::Authorizer,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Indexes(v) => v.len(),
            Self::Triggers(v) => v.len(),
            Self::Constraints(v) => v.len(),
            Self::Authorizers(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply this replacement to a local aggregate.
    pub fn apply_to(self, aggregate: &mut SchemaAggregate) {
        match self {
            Self::Indexes(v) => aggregate.indexes = v,
            Self::Triggers(v) => aggregate.triggers = v,
            Self::Constraints(v) => aggregate.constraints = v,
            Self::Authorizers(v) => aggregate.authorizers = v,
        }
    }
}
