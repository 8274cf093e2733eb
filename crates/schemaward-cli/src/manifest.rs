//! Policy manifests: the operator's declared state.
//!
//! ```toml
//! [[index]]
//! name = "users_by_email"
//! gtype = "user"
//! expression = "has(this.attributes.email)"
//! target_docs = true
//! target_connections = false
//!
//! [[authorizer]]
//! name = "admins_only"
//! method = "/api.DatabaseService/SetIndexes"
//! expression = "this.user.attributes.roles.exists(r, r == 'admin')"
//! target_requests = true
//! target_responses = false
//! ```

use std::path::Path;

use schemaward_core::types::validate_batch;
use schemaward_core::{Authorizer, Constraint, Index, PolicyKind, Trigger};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default, rename = "index", skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<Index>,

    #[serde(default, rename = "trigger", skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<Trigger>,

    #[serde(default, rename = "constraint", skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,

    #[serde(default, rename = "authorizer", skip_serializing_if = "Vec::is_empty")]
    pub authorizers: Vec<Authorizer>,
}

impl Manifest {
    /// Read, parse, and validate a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let manifest = Self::parse(&text).map_err(|e| match e {
            CliError::Manifest { reason, .. } => CliError::Manifest {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })?;
        tracing::debug!(path = %path.display(), entries = manifest.len(), "Manifest loaded");
        Ok(manifest)
    }

    /// Parse and validate manifest text.
    pub fn parse(text: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(text).map_err(|e| CliError::Manifest {
            path: "<inline>".to_string(),
            reason: e.to_string(),
        })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Reject empty required fields and names repeated within one kind.
    pub fn validate(&self) -> Result<()> {
        validate_batch(&self.indexes)?;
        validate_batch(&self.triggers)?;
        validate_batch(&self.constraints)?;
        validate_batch(&self.authorizers)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.indexes.len() + self.triggers.len() + self.constraints.len() + self.authorizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Kinds with at least one declared entry.
    pub fn declared_kinds(&self) -> Vec<PolicyKind> {
        PolicyKind::ALL
            .into_iter()
            .filter(|kind| match kind {
                PolicyKind::Index => !self.indexes.is_empty(),
                PolicyKind::Trigger => !self.triggers.is_empty(),
                PolicyKind::Constraint => !self.constraints.is_empty(),
                PolicyKind::Authorizer => !self.authorizers.is_empty(),
            })
            .collect()
    }

    /// Render as manifest TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| CliError::Serialization(e.to_string()))
    }
}
