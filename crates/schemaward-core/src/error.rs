use thiserror::Error;

use crate::types::PolicyKind;

/// Top-level error type for schemaward-core.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl From<config::ConfigError> for CoreError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

/// A declared entry rejected before it reaches the reconciler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{kind} entry has an empty name")]
    EmptyName { kind: PolicyKind },

    #[error("{kind} '{name}': field '{field}' must not be empty")]
    EmptyField {
        kind: PolicyKind,
        name: String,
        field: &'static str,
    },

    #[error("{kind} '{name}' is declared more than once")]
    DuplicateName { kind: PolicyKind, name: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
