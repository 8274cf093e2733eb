//! Error types for the schemaward-cli crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to parse manifest {path}: {reason}")]
    Manifest { path: String, reason: String },

    #[error("Invalid manifest: {0}")]
    Validation(#[from] schemaward_core::ValidationError),

    #[error("Remote error: {0}")]
    Remote(#[from] schemaward_remote::RemoteError),

    #[error("Config error: {0}")]
    Config(#[from] schemaward_core::CoreError),

    #[error("Remote {kind} '{name}' cannot be expressed as a manifest entry: {reason}")]
    Incomplete {
        kind: schemaward_core::PolicyKind,
        name: String,
        reason: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
