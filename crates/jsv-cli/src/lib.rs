//! # jsv-cli — JSON Schema Validation Command-Line Interface
//!
//! Thin clap front end over `jsv-schema`.
//!
//! ## Subcommands
//!
//! - `validate` — validate JSON/YAML documents against a schema
//!
//! ## Crate Policy
//!
//! - CLI construction (argument parsing) is separated from business logic.
//! - Handler functions delegate to `jsv-schema` and return an exit code.

pub mod validate;
