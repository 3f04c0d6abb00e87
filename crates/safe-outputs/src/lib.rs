//! Safe-output dispatch configuration
//!
//! The agent never mutates external systems directly. It emits requests
//! ("create an issue", "push to this branch"), and a single dispatcher job
//! applies them according to one declarative configuration object built here.

pub mod builders;
pub mod checkout;
pub mod kind;
pub mod options;
pub mod registry;

pub use checkout::{output_types_condition, resolve_github_token, shared_checkout_steps};
pub use kind::SafeOutputKind;
pub use options::OptionsBuilder;
pub use registry::{DispatchConfig, DispatchConfigBuilder, KindBuilder};
