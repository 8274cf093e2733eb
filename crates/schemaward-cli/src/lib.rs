//! schemaward-cli: Declarative front-end for the remote policy schema.
//!
//! Reads a manifest of declared indexes, triggers, constraints, and
//! authorizers, validates it, and drives one resource controller per kind.

pub mod apply;
pub mod error;
pub mod manifest;
