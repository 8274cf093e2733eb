//! Mapping between declared policies and their remote collections.

use std::fmt;

use schemaward_core::{Authorizer, Constraint, Index, NamedEntry, Policy, Trigger};

use crate::wire::{
    CollectionUpdate, RemoteAuthorizer, RemoteConstraint, RemoteIndex, RemoteTrigger,
    SchemaAggregate,
};

/// Binds a declared policy kind to its collection in the aggregate.
pub trait PolicyBinding: Policy {
    type Remote: NamedEntry + Clone + fmt::Debug + Send + Sync;

    /// Take this kind's collection out of a fetched aggregate.
    fn collection(aggregate: SchemaAggregate) -> Vec<Self::Remote>;

    /// Wrap a full collection for write-back.
    fn replacement(entries: Vec<Self::Remote>) -> CollectionUpdate;

    fn to_remote(&self) -> Self::Remote;

    fn from_remote(remote: &Self::Remote) -> Self;
}

impl PolicyBinding for Index {
    type Remote = RemoteIndex;

    fn collection(aggregate: SchemaAggregate) -> Vec<RemoteIndex> {
        aggregate.indexes
    }

    fn replacement(entries: Vec<RemoteIndex>) -> CollectionUpdate {
        CollectionUpdate::Indexes(entries)
    }

    fn to_remote(&self) -> RemoteIndex {
        RemoteIndex {
            name: self.name.clone(),
            gtype: self.gtype.clone(),
            expression: self.expression.clone(),
            docs: self.target_docs,
            connections: self.target_connections,
        }
    }

    fn from_remote(remote: &RemoteIndex) -> Self {
        Self {
            name: remote.name.clone(),
            gtype: remote.gtype.clone(),
            expression: remote.expression.clone(),
            target_docs: remote.docs,
            target_connections: remote.connections,
        }
    }
}

impl PolicyBinding for Trigger {
    type Remote = RemoteTrigger;

    fn collection(aggregate: SchemaAggregate) -> Vec<RemoteTrigger> {
        aggregate.triggers
    }

    fn replacement(entries: Vec<RemoteTrigger>) -> CollectionUpdate {
        CollectionUpdate::Triggers(entries)
    }

    fn to_remote(&self) -> RemoteTrigger {
        RemoteTrigger {
            name: self.name.clone(),
            gtype: self.gtype.clone(),
            expression: self.expression.clone(),
            trigger: self.trigger.clone(),
            target_docs: self.target_docs,
            target_connections: self.target_connections,
        }
    }

    fn from_remote(remote: &RemoteTrigger) -> Self {
        Self {
            name: remote.name.clone(),
            gtype: remote.gtype.clone(),
            expression: remote.expression.clone(),
            trigger: remote.trigger.clone(),
            target_docs: remote.target_docs,
            target_connections: remote.target_connections,
        }
    }
}

impl PolicyBinding for Constraint {
    type Remote = RemoteConstraint;

    fn collection(aggregate: SchemaAggregate) -> Vec<RemoteConstraint> {
        aggregate.constraints
    }

    fn replacement(entries: Vec<RemoteConstraint>) -> CollectionUpdate {
        CollectionUpdate::Constraints(entries)
    }

    fn to_remote(&self) -> RemoteConstraint {
        RemoteConstraint {
            name: self.name.clone(),
            gtype: self.gtype.clone(),
            expression: self.expression.clone(),
            target_docs: self.target_docs,
            target_connections: self.target_connections,
        }
    }

    fn from_remote(remote: &RemoteConstraint) -> Self {
        Self {
            name: remote.name.clone(),
            gtype: remote.gtype.clone(),
            expression: remote.expression.clone(),
            target_docs: remote.target_docs,
            target_connections: remote.target_connections,
        }
    }
}

impl PolicyBinding for Authorizer {
    type Remote = RemoteAuthorizer;

    fn collection(aggregate: SchemaAggregate) -> Vec<RemoteAuthorizer> {
        aggregate.authorizers
    }

    fn replacement(entries: Vec<RemoteAuthorizer>) -> CollectionUpdate {
        CollectionUpdate::Authorizers(entries)
    }

    fn to_remote(&self) -> RemoteAuthorizer {
        RemoteAuthorizer {
            name: self.name.clone(),
            method: self.method.clone(),
            expression: self.expression.clone(),
            target_requests: self.target_requests,
            target_responses: self.target_responses,
        }
    }

    fn from_remote(remote: &RemoteAuthorizer) -> Self {
        Self {
            name: remote.name.clone(),
            method: remote.method.clone(),
            expression: remote.expression.clone(),
            target_requests: remote.target_requests,
            target_responses: remote.target_responses,
        }
    }
}
