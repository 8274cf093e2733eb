//! Policy entry types as declared by an operator.
//!
//! Field names here are the caller-facing configuration surface
//! (`gtype`, `target_docs`, ...) and must stay stable across releases.
//! The remote service's own representation lives in `schemaward-remote`.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// ── Kinds ─────────────────────────────────────────────────────────

/// The four policy collections held by the remote schema aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    Index,
    Trigger,
    Constraint,
    Authorizer,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 4] = [
        PolicyKind::Index,
        PolicyKind::Trigger,
        PolicyKind::Constraint,
        PolicyKind::Authorizer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Trigger => "trigger",
            Self::Constraint => "constraint",
            Self::Authorizer => "authorizer",
        }
    }

    /// Name of the collection inside the schema aggregate.
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Index => "indexes",
            Self::Trigger => "triggers",
            Self::Constraint => "constraints",
            Self::Authorizer => "authorizers",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Index => {
                "a graph primitive used for fast lookups of docs/connections that pass a boolean expression"
            }
            Self::Trigger => {
                "used to automatically mutate the attributes of documents/connections before they are committed"
            }
            Self::Constraint => "a graph primitive used to validate custom doc/connection constraints",
            Self::Authorizer => {
                "a graph primitive used for authorizing inbound requests and/or responses"
            }
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "index" | "indexes" => Ok(Self::Index),
            "trigger" | "triggers" => Ok(Self::Trigger),
            "constraint" | "constraints" => Ok(Self::Constraint),
            "authorizer" | "authorizers" => Ok(Self::Authorizer),
            _ => Err(format!(
                "Invalid kind: {s}. Choose: index, trigger, constraint, authorizer"
            )),
        }
    }
}

// ── Entry traits ──────────────────────────────────────────────────

/// Anything stored in a collection keyed by a unique name.
pub trait NamedEntry {
    fn name(&self) -> &str;
}

/// A caller-facing policy declaration of one kind.
pub trait Policy:
    NamedEntry + Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: PolicyKind;

    /// Reject entries the remote service would not accept.
    fn validate(&self) -> Result<(), ValidationError>;
}

fn require(
    kind: PolicyKind,
    name: &str,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField {
            kind,
            name: name.to_string(),
            field,
        });
    }
    Ok(())
}

fn require_name(kind: PolicyKind, name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName { kind });
    }
    Ok(())
}

// ── Entry types ───────────────────────────────────────────────────

/// A lookup index over docs and/or connections of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub gtype: String,
    pub expression: String,
    pub target_docs: bool,
    pub target_connections: bool,
}

/// Mutates docs/connections before they are committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub name: String,
    pub gtype: String,
    pub expression: String,
    pub trigger: String,
    pub target_docs: bool,
    pub target_connections: bool,
}

/// Validates docs/connections against a boolean expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub gtype: String,
    pub expression: String,
    pub target_docs: bool,
    pub target_connections: bool,
}

/// Authorizes inbound requests and/or outbound responses of one method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorizer {
    pub name: String,
    pub method: String,
    pub expression: String,
    pub target_requests: bool,
    pub target_responses: bool,
}

impl NamedEntry for Index {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Policy for Index {
    const KIND: PolicyKind = PolicyKind::Index;

    fn validate(&self) -> Result<(), ValidationError> {
        require_name(Self::KIND, &self.name)?;
        require(Self::KIND, &self.name, "gtype", &self.gtype)?;
        require(Self::KIND, &self.name, "expression", &self.expression)
    }
}

impl NamedEntry for Trigger {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Policy for Trigger {
    const KIND: PolicyKind = PolicyKind::Trigger;

    fn validate(&self) -> Result<(), ValidationError> {
        require_name(Self::KIND, &self.name)?;
        require(Self::KIND, &self.name, "gtype", &self.gtype)?;
        require(Self::KIND, &self.name, "expression", &self.expression)?;
        require(Self::KIND, &self.name, "trigger", &self.trigger)
    }
}

impl NamedEntry for Constraint {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Policy for Constraint {
    const KIND: PolicyKind = PolicyKind::Constraint;

    fn validate(&self) -> Result<(), ValidationError> {
        require_name(Self::KIND, &self.name)?;
        require(Self::KIND, &self.name, "gtype", &self.gtype)?;
        require(Self::KIND, &self.name, "expression", &self.expression)
    }
}

impl NamedEntry for Authorizer {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Policy for Authorizer {
    const KIND: PolicyKind = PolicyKind::Authorizer;

    fn validate(&self) -> Result<(), ValidationError> {
        require_name(Self::KIND, &self.name)?;
        require(Self::KIND, &self.name, "method", &self.method)?;
        require(Self::KIND, &self.name, "expression", &self.expression)
    }
}

/// Reject a batch of declarations containing invalid entries or repeated names.
pub fn validate_batch<P: Policy>(entries: &[P]) -> Result<(), ValidationError> {
    let mut seen = std::collections::HashSet::new();
    for entry in entries {
        entry.validate()?;
        if !seen.insert(entry.name()) {
            return Err(ValidationError::DuplicateName {
                kind: P::KIND,
                name: entry.name().to_string(),
            });
        }
    }
    Ok(())
}
