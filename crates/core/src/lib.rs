//! Core error taxonomy and shared constants for the `awc` workflow compiler.
//!
//! Every other crate in the workspace reports failures through the [`Error`]
//! enum defined here, so the driver can classify any failure into one of the
//! three compile-time categories (configuration, resolution, size limit)
//! without inspecting message strings.
//!
//! ## Key Components
//!
//! - **`errors`**: the primary `Error` enum, its `ErrorKind` classification,
//!   the `Result` alias and the `ResultExt` context helpers.
//! - **`constants`**: standard job identifiers, environment variable names and
//!   platform limits shared by the builders.

pub mod constants;
pub mod errors;

pub use self::{
    constants::*,
    errors::{Error, ErrorKind, Result, ResultExt},
};
