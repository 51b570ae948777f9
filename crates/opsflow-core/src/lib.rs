//! Core logic and abstractions for opsflow.
//!
//! This crate defines the command grammar, the project configuration,
//! the extension registry and the execution errors shared by the
//! opsflow workspace.

pub mod catalog;
pub mod command;
pub mod config;
pub mod constants;
pub mod error;
pub mod extension;

pub use catalog::{CatalogEntry, CATALOG};
pub use command::{CommandParseError, CommandRef, PrimaryCommand};
pub use config::OpsflowConfig;
pub use error::ExecError;
pub use extension::{ExecutionAction, Extension, ExtensionRegistry};
