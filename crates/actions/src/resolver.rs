//! Memoizing action resolver

use crate::cache::{cache_key, ActionCache};
use crate::lookup::ShaLookup;
use crate::reference::{root_repository, ActionReference, UsesRef};
use awc_core::{Error, Result, DEFAULT_GITHUB_API_URL, DEFAULT_RESOLVE_TIMEOUT_SECS};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, warn};

/// Resolver settings
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Upper bound on a single external lookup
    pub timeout: Duration,
    pub api_base: String,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_RESOLVE_TIMEOUT_SECS),
            api_base: DEFAULT_GITHUB_API_URL.to_string(),
        }
    }
}

/// Resolves action versions to commit hashes for one compilation run.
///
/// Successful lookups are stored in the [`ActionCache`]. Failed keys are
/// remembered for the lifetime of the resolver so a missing tag referenced by
/// many steps costs one lookup, not one per step. Keys looked up during this
/// run are remembered too, so a refresh reaches the network at most once per
/// key. Neither set is persisted.
pub struct ActionResolver {
    cache: ActionCache,
    failed: HashSet<String>,
    refreshed: HashSet<String>,
    /// Version tag of every `repo@sha` value handed out by [`Self::pin`]
    versions: HashMap<String, String>,
    lookup: Box<dyn ShaLookup>,
    timeout: Duration,
}

impl ActionResolver {
    pub fn new(cache: ActionCache, lookup: Box<dyn ShaLookup>, options: ResolverOptions) -> Self {
        Self {
            cache,
            failed: HashSet::new(),
            refreshed: HashSet::new(),
            versions: HashMap::new(),
            lookup,
            timeout: options.timeout,
        }
    }

    /// Resolve `repository@version` to a commit hash.
    ///
    /// The repository may include a subpath; it shares the root repository's
    /// cache entry.
    pub async fn resolve_sha(&mut self, repository: &str, version: &str) -> Result<String> {
        let root = root_repository(repository);
        if let Some(sha) = self.cache.get(root, version) {
            debug!(repository = root, version, sha, "action cache hit");
            return Ok(sha.to_string());
        }
        debug!(repository = root, version, "action cache miss");
        self.lookup_and_store(root, version).await
    }

    /// Resolve without trusting entries loaded from disk, still honoring
    /// earlier failures. A successful result replaces the cached value; a key
    /// already looked up during this run is answered from the cache.
    pub async fn refresh_sha(&mut self, repository: &str, version: &str) -> Result<String> {
        let root = root_repository(repository);
        if self.refreshed.contains(&cache_key(root, version)) {
            if let Some(sha) = self.cache.get(root, version) {
                debug!(repository = root, version, sha, "already refreshed this run");
                return Ok(sha.to_string());
            }
        }
        self.lookup_and_store(root, version).await
    }

    async fn lookup_and_store(&mut self, root: &str, version: &str) -> Result<String> {
        let key = cache_key(root, version);
        if self.failed.contains(&key) {
            return Err(Error::resolution(
                root,
                version,
                "previously attempted and failed this run",
            ));
        }

        let outcome = match tokio::time::timeout(self.timeout, self.lookup.lookup(root, version)).await
        {
            Ok(Ok(sha)) if crate::reference::is_commit_sha(&sha) => Ok(sha),
            Ok(Ok(sha)) => Err(format!("lookup returned '{sha}', which is not a commit hash")),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("lookup timed out after {:?}", self.timeout)),
        };

        match outcome {
            Ok(sha) => {
                self.cache.insert(root, version, &sha);
                self.refreshed.insert(key);
                Ok(sha)
            }
            Err(message) => {
                warn!(repository = root, version, %message, "failed to resolve action");
                self.failed.insert(key);
                Err(Error::resolution(
                    root,
                    version,
                    format!("could not resolve to a commit: {message}"),
                ))
            }
        }
    }

    /// Resolve and build the pinned reference for `repository@version`
    pub async fn pin_reference(
        &mut self,
        repository: &str,
        version: &str,
    ) -> Result<ActionReference> {
        let sha = self.resolve_sha(repository, version).await?;
        Ok(ActionReference::new(repository, version, sha))
    }

    /// Rewrite a `uses:` value into its pinned `repo@sha` form.
    ///
    /// Local paths and `docker://` images are returned unchanged. References
    /// already pinned to a commit hash lose any trailing comment. The version
    /// of every pin is kept for [`Self::pinned_version`].
    pub async fn pin(&mut self, uses: &str) -> Result<String> {
        match UsesRef::parse(uses)? {
            UsesRef::Local(value) | UsesRef::Docker(value) => Ok(value.to_string()),
            UsesRef::Pinned {
                repository,
                sha,
                version,
            } => {
                let pinned = format!("{repository}@{sha}");
                if let Some(version) = version {
                    self.versions.insert(pinned.clone(), version.to_string());
                }
                Ok(pinned)
            }
            UsesRef::Remote {
                repository,
                version,
            } => {
                let reference = self.pin_reference(repository, version).await?;
                let pinned = reference.pinned();
                self.versions.insert(pinned.clone(), reference.version);
                Ok(pinned)
            }
        }
    }

    /// Version tag recorded for a value returned by [`Self::pin`]
    pub fn pinned_version(&self, pinned: &str) -> Option<&str> {
        self.versions.get(pinned).map(String::as_str)
    }

    pub fn cache(&self) -> &ActionCache {
        &self.cache
    }

    /// Number of distinct keys that failed during this run
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Write changed cache entries to disk
    pub fn persist(&mut self) -> Result<()> {
        self.cache.persist()
    }

    /// Consume the resolver, handing back the cache
    pub fn into_cache(self) -> ActionCache {
        self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::InMemoryLookup;
    use awc_core::ErrorKind;
    use std::sync::Arc;

    const SHA: &str = "08c6903cd8c0fde910a37f88322edcfb5dd907a8";

    fn resolver(lookup: Arc<InMemoryLookup>) -> ActionResolver {
        ActionResolver::new(
            ActionCache::in_memory(),
            Box::new(lookup),
            ResolverOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_subpath_shares_root_entry() {
        let lookup = Arc::new(InMemoryLookup::new().with("github/codeql-action", "v3", SHA));
        let mut resolver = resolver(lookup.clone());

        let a = resolver
            .resolve_sha("github/codeql-action/init", "v3")
            .await
            .unwrap();
        let b = resolver
            .resolve_sha("github/codeql-action/analyze", "v3")
            .await
            .unwrap();
        assert_eq!(a, SHA);
        assert_eq!(b, SHA);
        assert_eq!(lookup.calls(), 1);
        assert_eq!(resolver.cache().get("github/codeql-action", "v3"), Some(SHA));
    }

    #[tokio::test]
    async fn test_pin_passthrough() {
        let lookup = Arc::new(InMemoryLookup::new());
        let mut resolver = resolver(lookup.clone());
        let pinned = format!("actions/checkout@{SHA}");

        for uses in ["./.github/actions/setup", "docker://alpine:3", pinned.as_str()] {
            assert_eq!(resolver.pin(uses).await.unwrap(), uses);
        }
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn test_pin_passthrough_drops_comment() {
        let lookup = Arc::new(InMemoryLookup::new());
        let mut resolver = resolver(lookup.clone());
        let pinned = resolver
            .pin(&format!("actions/checkout@{SHA} # v5"))
            .await
            .unwrap();
        assert_eq!(pinned, format!("actions/checkout@{SHA}"));
        assert_eq!(resolver.pinned_version(&pinned), Some("v5"));
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn test_pin_remote() {
        let lookup = Arc::new(InMemoryLookup::new().with("actions/checkout", "v5", SHA));
        let mut resolver = resolver(lookup);
        let pinned = resolver.pin("actions/checkout@v5").await.unwrap();
        assert_eq!(pinned, format!("actions/checkout@{SHA}"));
        assert!(!pinned.contains('#'));
        assert_eq!(resolver.pinned_version(&pinned), Some("v5"));
    }

    #[tokio::test]
    async fn test_non_hash_answer_is_a_failure() {
        let lookup = Arc::new(InMemoryLookup::new().with("actions/checkout", "v5", "abc"));
        let mut resolver = resolver(lookup);
        let err = resolver.resolve_sha("actions/checkout", "v5").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resolution);
        assert_eq!(resolver.failed_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_an_ordinary_failure() {
        let lookup = Arc::new(
            InMemoryLookup::new()
                .with("actions/checkout", "v5", SHA)
                .with_delay(Duration::from_secs(60)),
        );
        let mut resolver = ActionResolver::new(
            ActionCache::in_memory(),
            Box::new(lookup.clone()),
            ResolverOptions {
                timeout: Duration::from_secs(1),
                ..Default::default()
            },
        );

        let err = resolver.resolve_sha("actions/checkout", "v5").await.unwrap_err();
        assert!(err.to_string().contains("timed out"));

        let again = resolver.resolve_sha("actions/checkout", "v5").await.unwrap_err();
        assert!(again.to_string().contains("previously attempted and failed this run"));
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn test_refresh_bypasses_cache_read() {
        let lookup = Arc::new(InMemoryLookup::new().with("actions/checkout", "v5", SHA));
        let mut cache = ActionCache::in_memory();
        cache.insert("actions/checkout", "v5", &"a".repeat(40));
        let mut resolver =
            ActionResolver::new(cache, Box::new(lookup.clone()), ResolverOptions::default());

        assert_eq!(resolver.refresh_sha("actions/checkout", "v5").await.unwrap(), SHA);
        assert_eq!(lookup.calls(), 1);
        assert_eq!(resolver.cache().get("actions/checkout", "v5"), Some(SHA));
    }

    #[tokio::test]
    async fn test_refresh_looks_up_once_per_run() {
        let lookup = Arc::new(InMemoryLookup::new().with("actions/checkout", "v5", SHA));
        let mut resolver = resolver(lookup.clone());

        for _ in 0..3 {
            assert_eq!(resolver.refresh_sha("actions/checkout", "v5").await.unwrap(), SHA);
        }
        assert_eq!(resolver.resolve_sha("actions/checkout", "v5").await.unwrap(), SHA);
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn test_resolved_key_is_not_refreshed_again() {
        let lookup = Arc::new(InMemoryLookup::new().with("actions/checkout", "v5", SHA));
        let mut resolver = resolver(lookup.clone());

        resolver.resolve_sha("actions/checkout", "v5").await.unwrap();
        resolver.refresh_sha("actions/checkout/sub", "v5").await.unwrap();
        assert_eq!(lookup.calls(), 1);
    }
}
