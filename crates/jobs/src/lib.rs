//! Job graph construction for the `awc` workflow compiler.
//!
//! A parsed workflow specification is turned into an insertion-ordered graph
//! of jobs: gating, activation, the agent itself, the safe-output dispatcher,
//! threat detection, conclusion, memory persistence and the user's own jobs.
//! The graph is validated (no dangling, self or cyclic dependencies, no
//! oversized emitted values) before anything is handed to emission.

pub mod builder;
pub mod compiler;
pub mod manager;
pub mod node;
pub mod validation;

pub use builder::{BuiltGraph, DependencyPlan, JobGraphBuilder};
pub use compiler::{CompiledWorkflow, Compiler};
pub use manager::JobManager;
pub use node::{JobNode, ReusableWorkflow};
