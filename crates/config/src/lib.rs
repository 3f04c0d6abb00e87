//! Workflow specification model and loading for awc
//!
//! The types in this crate describe the already-parsed workflow specification
//! the compiler consumes: triggers, permissions, tools, safe-output kinds,
//! custom jobs and the free-form markdown body. They are read-only inputs.

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;
