//! schemaward-remote: Authenticated client for the remote schema service.
//!
//! This crate is the single mutation point for the remote schema aggregate.
//! Every read and write of a policy collection flows through a
//! [`ResourceController`], which re-fetches the aggregate, reconciles one
//! collection, and writes that whole collection back.

pub mod auth;
pub mod binding;
pub mod client;
pub mod controller;
pub mod http;
pub mod snapshot;
pub mod wire;

pub use auth::{AuthSession, Credential};
pub use binding::PolicyBinding;
pub use client::{RemoteError, SchemaClient, SchemaTransport};
pub use controller::{ControllerSettings, ResourceController};
pub use snapshot::SnapshotAccessor;
pub use wire::{CollectionUpdate, SchemaAggregate};
