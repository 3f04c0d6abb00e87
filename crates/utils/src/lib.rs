//! Shared utilities and pure functions for awc
//!
//! This crate provides the small pieces of plumbing used across the
//! workspace: crash-safe file writes, advisory locks for files shared between
//! processes, tracing initialisation and the emitted-value size ceiling.

pub mod atomic_file;
pub mod file_lock;
pub mod size;
pub mod tracing;

pub use atomic_file::*;
pub use file_lock::*;
pub use size::*;
