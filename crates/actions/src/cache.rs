//! Persistent action pin cache (`.github/aw/actions-lock.json`)
//!
//! The file maps `owner/repo@version` to the resolved commit hash:
//!
//! ```json
//! {
//!   "entries": {
//!     "actions/checkout@v5": {
//!       "repo": "actions/checkout",
//!       "version": "v5",
//!       "sha": "08c6903cd8c0fde910a37f88322edcfb5dd907a8"
//!     }
//!   }
//! }
//! ```
//!
//! Several compilations may share one file. [`ActionCache::persist`] holds an
//! exclusive lock on a sibling `.lock` file while it re-reads, merges and
//! atomically replaces the file, so concurrent writers never lose each
//! other's entries or leave a torn file behind.

use awc_core::{Error, Result};
use awc_utils::{write_atomic_string, FileLock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub repo: String,
    pub version: String,
    pub sha: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    #[serde(default)]
    entries: BTreeMap<String, CacheEntry>,
}

/// In-memory view of the pin cache, optionally backed by a file
#[derive(Debug, Default)]
pub struct ActionCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, CacheEntry>,
    /// Keys changed since the last load or persist
    dirty: BTreeSet<String>,
}

/// Cache key for a root repository and version
pub fn cache_key(repo: &str, version: &str) -> String {
    format!("{repo}@{version}")
}

impl ActionCache {
    /// A cache that is never written to disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the cache file at `path`. A missing file yields an empty cache
    /// that will be created on the first persist. An unreadable document is
    /// discarded with a warning; it is rebuilt from fresh lookups.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = read_entries(&path)?;
        debug!(path = %path.display(), entries = entries.len(), "loaded action cache");
        Ok(Self {
            path: Some(path),
            entries,
            dirty: BTreeSet::new(),
        })
    }

    /// Cache file under a repository root
    pub fn default_path(repo_root: &Path) -> PathBuf {
        repo_root.join(awc_core::ACTIONS_LOCK_FILE)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, repo: &str, version: &str) -> Option<&str> {
        self.entries
            .get(&cache_key(repo, version))
            .map(|entry| entry.sha.as_str())
    }

    /// Record a resolved hash. Returns `true` when the stored value changed.
    pub fn insert(&mut self, repo: &str, version: &str, sha: &str) -> bool {
        let key = cache_key(repo, version);
        if self.entries.get(&key).is_some_and(|entry| entry.sha == sha) {
            return false;
        }
        self.entries.insert(
            key.clone(),
            CacheEntry {
                repo: repo.to_string(),
                version: version.to_string(),
                sha: sha.to_string(),
            },
        );
        self.dirty.insert(key);
        true
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &CacheEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Merge changed entries into the backing file.
    ///
    /// Entries on disk written by other processes are kept; for keys this
    /// process changed, the in-process value wins. Does nothing for an
    /// in-memory cache or when nothing changed.
    pub fn persist(&mut self) -> Result<()> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };
        if self.dirty.is_empty() {
            return Ok(());
        }

        let _lock = FileLock::acquire(&path)?;
        let mut merged = read_entries(&path)?;
        for key in &self.dirty {
            if let Some(entry) = self.entries.get(key) {
                merged.insert(key.clone(), entry.clone());
            }
        }

        write_entries(&path, &merged)?;
        debug!(
            path = %path.display(),
            written = self.dirty.len(),
            total = merged.len(),
            "persisted action cache"
        );

        self.entries = merged;
        self.dirty.clear();
        Ok(())
    }

    /// Remove every entry from the backing file
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.dirty.clear();
        if let Some(path) = &self.path {
            let _lock = FileLock::acquire(path)?;
            write_entries(path, &self.entries)?;
        }
        Ok(())
    }
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, CacheEntry>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(Error::file_system(path, "read", e)),
    };

    match serde_json::from_str::<CacheFile>(&content) {
        Ok(file) => Ok(file.entries),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable action cache");
            Ok(BTreeMap::new())
        }
    }
}

fn write_entries(path: &Path, entries: &BTreeMap<String, CacheEntry>) -> Result<()> {
    let file = CacheFile {
        entries: entries.clone(),
    };
    let mut json = serde_json::to_string_pretty(&file)?;
    json.push('\n');
    write_atomic_string(path, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SHA_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const SHA_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    #[test]
    fn test_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let cache = ActionCache::load(temp.path().join("actions-lock.json")).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_persist_and_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".github/aw/actions-lock.json");

        let mut cache = ActionCache::load(&path).unwrap();
        assert!(cache.insert("actions/checkout", "v5", SHA_A));
        cache.persist().unwrap();
        assert!(!cache.is_dirty());

        let reloaded = ActionCache::load(&path).unwrap();
        assert_eq!(reloaded.get("actions/checkout", "v5"), Some(SHA_A));

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["entries"]["actions/checkout@v5"]["sha"], SHA_A);
        assert_eq!(raw["entries"]["actions/checkout@v5"]["repo"], "actions/checkout");
    }

    #[test]
    fn test_insert_same_value_is_not_dirty() {
        let mut cache = ActionCache::in_memory();
        assert!(cache.insert("actions/checkout", "v5", SHA_A));
        cache.dirty.clear();
        assert!(!cache.insert("actions/checkout", "v5", SHA_A));
        assert!(!cache.is_dirty());
    }

    #[test]
    fn test_persist_merges_concurrent_writers() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("actions-lock.json");

        let mut first = ActionCache::load(&path).unwrap();
        let mut second = ActionCache::load(&path).unwrap();

        first.insert("actions/checkout", "v5", SHA_A);
        second.insert("actions/setup-node", "v4", SHA_B);

        first.persist().unwrap();
        second.persist().unwrap();

        let reloaded = ActionCache::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("actions/checkout", "v5"), Some(SHA_A));
        assert_eq!(reloaded.get("actions/setup-node", "v4"), Some(SHA_B));
        // The second writer also picked up the first writer's entry
        assert_eq!(second.get("actions/checkout", "v5"), Some(SHA_A));
    }

    #[test]
    fn test_in_process_value_wins_on_conflict() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("actions-lock.json");

        let mut stale = ActionCache::load(&path).unwrap();
        stale.insert("actions/checkout", "v5", SHA_A);
        stale.persist().unwrap();

        let mut fresh = ActionCache::load(&path).unwrap();
        fresh.insert("actions/checkout", "v5", SHA_B);
        fresh.persist().unwrap();

        let reloaded = ActionCache::load(&path).unwrap();
        assert_eq!(reloaded.get("actions/checkout", "v5"), Some(SHA_B));
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("actions-lock.json");
        std::fs::write(&path, "{not json").unwrap();

        let mut cache = ActionCache::load(&path).unwrap();
        assert!(cache.is_empty());
        cache.insert("actions/checkout", "v5", SHA_A);
        cache.persist().unwrap();
        assert_eq!(
            ActionCache::load(&path).unwrap().get("actions/checkout", "v5"),
            Some(SHA_A)
        );
    }

    #[test]
    fn test_clear() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("actions-lock.json");
        let mut cache = ActionCache::load(&path).unwrap();
        cache.insert("actions/checkout", "v5", SHA_A);
        cache.persist().unwrap();

        cache.clear().unwrap();
        assert!(ActionCache::load(&path).unwrap().is_empty());
    }
}
