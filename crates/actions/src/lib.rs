//! Action reference resolution for awc
//!
//! Every external action a compiled workflow uses is pinned to an immutable
//! 40-hex commit hash. This crate owns the pieces involved:
//!
//! - [`ActionReference`] parsing and the pinned display form
//! - [`ActionCache`], the persistent `actions-lock.json` mapping
//! - [`ShaLookup`] backends, including the GitHub REST API
//! - [`ActionResolver`], memoizing successes and failures for one run
//! - the advisory staleness check over compiled output

pub mod cache;
pub mod lookup;
pub mod reference;
pub mod resolver;
pub mod staleness;

pub use cache::{ActionCache, CacheEntry};
pub use lookup::{GitHubApiLookup, InMemoryLookup, ShaLookup};
pub use reference::{is_commit_sha, root_repository, ActionReference, UsesRef};
pub use resolver::{ActionResolver, ResolverOptions};
pub use staleness::{find_pinned_references, validate_pins, PinnedMention, StaleAction};
