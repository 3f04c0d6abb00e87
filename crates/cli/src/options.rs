//! Flags shared by every subcommand

use awc_actions::{ActionCache, ActionResolver, GitHubApiLookup, ResolverOptions};
use awc_config::find_repo_root;
use awc_core::{Result, DEFAULT_GITHUB_API_URL, DEFAULT_RESOLVE_TIMEOUT_SECS};
use clap::{ArgAction, Args};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Args)]
pub struct GlobalOptions {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Action pin cache file (defaults to .github/aw/actions-lock.json in the repository)
    #[arg(long, value_name = "PATH", global = true)]
    pub cache_file: Option<PathBuf>,

    /// Neither read nor write the action pin cache
    #[arg(long, global = true, conflicts_with = "cache_file")]
    pub no_cache: bool,

    /// Timeout for a single action lookup, in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_RESOLVE_TIMEOUT_SECS, global = true)]
    pub timeout_secs: u64,

    /// GitHub API base URL used for action lookups
    #[arg(long, value_name = "URL", global = true)]
    pub api_url: Option<String>,
}

impl GlobalOptions {
    /// Cache file for a run rooted at `start`, or `None` with `--no-cache`
    pub fn cache_path(&self, start: &Path) -> Option<PathBuf> {
        if self.no_cache {
            return None;
        }
        Some(
            self.cache_file
                .clone()
                .unwrap_or_else(|| ActionCache::default_path(&find_repo_root(start))),
        )
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            timeout: Duration::from_secs(self.timeout_secs),
            api_base: self
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
        }
    }

    pub fn open_cache(&self, start: &Path) -> Result<ActionCache> {
        match self.cache_path(start) {
            Some(path) => {
                debug!(path = %path.display(), "using action cache");
                ActionCache::load(path)
            }
            None => Ok(ActionCache::in_memory()),
        }
    }

    /// Resolver backed by the GitHub API, sharing one cache for the whole run
    pub fn open_resolver(&self, start: &Path) -> Result<ActionResolver> {
        let options = self.resolver_options();
        let lookup = GitHubApiLookup::new(Some(&options.api_base))?;
        let cache = self.open_cache(start)?;
        Ok(ActionResolver::new(cache, Box::new(lookup), options))
    }
}
