//! schemaward-core: Shared types, configuration, and reconciliation logic.
//!
//! This crate provides the foundations used by every schemaward component:
//! - Policy entry types (Index, Trigger, Constraint, Authorizer)
//! - The generic collection reconciler (upsert / remove / find)
//! - Session configuration and credential sources
//! - Common error types

pub mod config;
pub mod error;
pub mod reconcile;
pub mod types;

pub use config::{CredentialSource, SessionConfig};
pub use error::{CoreError, ValidationError};
pub use reconcile::RemovalOrder;
pub use types::{Authorizer, Constraint, Index, NamedEntry, Policy, PolicyKind, Trigger};
