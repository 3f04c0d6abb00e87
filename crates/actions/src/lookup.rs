//! Backends that map a repository and version to a commit hash

use async_trait::async_trait;
use awc_core::{Error, Result, DEFAULT_GITHUB_API_URL, GITHUB_TOKEN_VARS};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, trace};

/// Resolves `owner/repo` + tag or branch to a 40-hex commit hash.
///
/// Implementations only perform the lookup; memoization, failure tracking and
/// timeouts belong to [`crate::ActionResolver`].
#[async_trait]
pub trait ShaLookup: Send + Sync {
    async fn lookup(&self, repository: &str, version: &str) -> Result<String>;
}

/// Lookup against the GitHub REST API
pub struct GitHubApiLookup {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct GitTag {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Annotated tags may point at other tags; stop following after this many
const MAX_TAG_DEPTH: usize = 5;

impl GitHubApiLookup {
    /// Create a lookup against `api_base`, authenticating with the first of
    /// `GITHUB_TOKEN` / `GH_TOKEN` that is set
    pub fn new(api_base: Option<&str>) -> Result<Self> {
        let token = GITHUB_TOKEN_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.is_empty());
        Self::with_token(api_base, token)
    }

    pub fn with_token(api_base: Option<&str>, token: Option<String>) -> Result<Self> {
        let api_base = api_base
            .unwrap_or(DEFAULT_GITHUB_API_URL)
            .trim_end_matches('/')
            .to_string();
        url::Url::parse(&api_base).map_err(|e| {
            Error::configuration(format!("invalid GitHub API URL '{api_base}': {e}"))
        })?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("awc/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| Error::network(&api_base, e.to_string()))?;

        Ok(Self {
            client,
            api_base,
            token,
        })
    }

    /// GET a JSON document; `Ok(None)` on 404
    async fn get_json<T>(&self, path: &str) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.api_base, path);
        trace!(%url, "GitHub API request");

        let mut request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::network(&url, e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::network(
                &url,
                format!("unexpected status {}", response.status()),
            ));
        }

        let body = response
            .json::<T>()
            .await
            .map_err(|e| Error::network(&url, format!("invalid response body: {e}")))?;
        Ok(Some(body))
    }

    /// Follow annotated tag objects down to the commit they point at
    async fn peel(&self, repository: &str, mut object: GitObject) -> Result<String> {
        for _ in 0..MAX_TAG_DEPTH {
            if object.kind != "tag" {
                return Ok(object.sha);
            }
            let path = format!("/repos/{repository}/git/tags/{}", object.sha);
            match self.get_json::<GitTag>(&path).await? {
                Some(tag) => object = tag.object,
                None => {
                    return Err(Error::network(
                        path,
                        "annotated tag object disappeared while resolving",
                    ))
                }
            }
        }
        Err(Error::network(
            format!("/repos/{repository}/git/tags"),
            "too many nested annotated tags",
        ))
    }
}

#[async_trait]
impl ShaLookup for GitHubApiLookup {
    async fn lookup(&self, repository: &str, version: &str) -> Result<String> {
        for namespace in ["tags", "heads"] {
            let path = format!("/repos/{repository}/git/ref/{namespace}/{version}");
            if let Some(git_ref) = self.get_json::<GitRef>(&path).await? {
                let sha = self.peel(repository, git_ref.object).await?;
                debug!(repository, version, namespace, %sha, "resolved via GitHub API");
                return Ok(sha);
            }
        }
        Err(Error::resolution(
            repository,
            version,
            "no tag or branch with that name",
        ))
    }
}

/// Fixed-table lookup that counts how often it is asked.
///
/// Used for offline compilation against a known set of pins and in tests
/// that assert on memoization.
#[derive(Debug, Default)]
pub struct InMemoryLookup {
    shas: Mutex<HashMap<String, String>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl InMemoryLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a known mapping
    pub fn with(self, repository: &str, version: &str, sha: &str) -> Self {
        self.set(repository, version, sha);
        self
    }

    /// Answer every lookup only after `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add or replace a mapping, e.g. to simulate a moved tag
    pub fn set(&self, repository: &str, version: &str, sha: &str) {
        let mut shas = self.shas.lock().unwrap_or_else(|e| e.into_inner());
        shas.insert(format!("{repository}@{version}"), sha.to_string());
    }

    /// Number of lookups performed so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ShaLookup for InMemoryLookup {
    async fn lookup(&self, repository: &str, version: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let shas = self.shas.lock().unwrap_or_else(|e| e.into_inner());
        shas.get(&format!("{repository}@{version}"))
            .cloned()
            .ok_or_else(|| Error::resolution(repository, version, "not found"))
    }
}

#[async_trait]
impl<T> ShaLookup for std::sync::Arc<T>
where
    T: ShaLookup + ?Sized,
{
    async fn lookup(&self, repository: &str, version: &str) -> Result<String> {
        (**self).lookup(repository, version).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_lookup_counts_calls() {
        let lookup = InMemoryLookup::new().with("actions/checkout", "v5", "abc");
        assert_eq!(lookup.lookup("actions/checkout", "v5").await.unwrap(), "abc");
        assert!(lookup.lookup("actions/checkout", "v9").await.is_err());
        assert_eq!(lookup.calls(), 2);
    }

    #[test]
    fn test_github_lookup_rejects_bad_url() {
        assert!(GitHubApiLookup::with_token(Some("not a url"), None).is_err());
    }

    #[test]
    fn test_github_lookup_trims_trailing_slash() {
        let lookup =
            GitHubApiLookup::with_token(Some("https://ghe.example.com/api/v3/"), None).unwrap();
        assert_eq!(lookup.api_base, "https://ghe.example.com/api/v3");
    }
}
