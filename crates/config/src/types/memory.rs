//! Persistent agent memory tools (`tools.repo-memory`, `tools.cache-memory`)

use serde::{Deserialize, Deserializer};

/// Default id for a memory entry declared without one
pub const DEFAULT_MEMORY_ID: &str = "default";

/// Git-branch backed memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoMemoryConfig {
    pub entries: Vec<RepoMemoryEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepoMemoryEntry {
    #[serde(default)]
    pub id: Option<String>,
    /// Prefix of the memory branch (`<prefix>/<id>`)
    #[serde(default)]
    pub branch_prefix: Option<String>,
    #[serde(default)]
    pub target_repo: Option<String>,
    #[serde(default)]
    pub file_glob: Vec<String>,
    /// Bytes
    #[serde(default)]
    pub max_file_size: Option<u64>,
    #[serde(default)]
    pub max_file_count: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
}

impl RepoMemoryEntry {
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or(DEFAULT_MEMORY_ID)
    }
}

impl Default for RepoMemoryConfig {
    fn default() -> Self {
        Self {
            entries: vec![RepoMemoryEntry::default()],
        }
    }
}

impl<'de> Deserialize<'de> for RepoMemoryConfig {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = deserialize_entries::<D, RepoMemoryEntry>(deserializer)?;
        Ok(RepoMemoryConfig { entries })
    }
}

/// Actions-cache backed memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheMemoryConfig {
    pub entries: Vec<CacheMemoryEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CacheMemoryEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub retention_days: Option<u32>,
    /// Restore at agent start but never save back
    #[serde(default)]
    pub restore_only: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl CacheMemoryEntry {
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or(DEFAULT_MEMORY_ID)
    }
}

impl CacheMemoryConfig {
    /// Entries whose contents are saved after the agent runs
    pub fn persisted_entries(&self) -> impl Iterator<Item = &CacheMemoryEntry> {
        self.entries.iter().filter(|entry| !entry.restore_only)
    }
}

impl Default for CacheMemoryConfig {
    fn default() -> Self {
        Self {
            entries: vec![CacheMemoryEntry::default()],
        }
    }
}

impl<'de> Deserialize<'de> for CacheMemoryConfig {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = deserialize_entries::<D, CacheMemoryEntry>(deserializer)?;
        Ok(CacheMemoryConfig { entries })
    }
}

/// Accepts `true`/`false`, `null` (enabled), a single entry, or a list of
/// entries. `true` and `null` produce one default entry.
fn deserialize_entries<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Flag(bool),
        Many(Vec<T>),
        One(T),
    }

    Ok(match Option::<Raw<T>>::deserialize(deserializer)? {
        None | Some(Raw::Flag(true)) => vec![T::default()],
        Some(Raw::Flag(false)) => Vec::new(),
        Some(Raw::Many(entries)) => entries,
        Some(Raw::One(entry)) => vec![entry],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    struct Tools {
        #[serde(default)]
        repo_memory: Option<RepoMemoryConfig>,
        #[serde(default)]
        cache_memory: Option<CacheMemoryConfig>,
    }

    #[test]
    fn test_flag_forms() {
        let tools: Tools = serde_yaml::from_str("repo-memory: true\ncache-memory: false\n").unwrap();
        let repo = tools.repo_memory.unwrap();
        assert_eq!(repo.entries.len(), 1);
        assert_eq!(repo.entries[0].id(), "default");
        assert!(tools.cache_memory.unwrap().entries.is_empty());
    }

    #[test]
    fn test_list_form() {
        let yaml = r#"
cache-memory:
  - id: notes
    key: notes-key
  - id: seed
    restore-only: true
"#;
        let tools: Tools = serde_yaml::from_str(yaml).unwrap();
        let cache = tools.cache_memory.unwrap();
        assert_eq!(cache.entries.len(), 2);
        let persisted: Vec<_> = cache.persisted_entries().map(|e| e.id()).collect();
        assert_eq!(persisted, vec!["notes"]);
    }

    #[test]
    fn test_single_entry_form() {
        let tools: Tools =
            serde_yaml::from_str("repo-memory:\n  branch-prefix: agent-notes\n").unwrap();
        let repo = tools.repo_memory.unwrap();
        assert_eq!(repo.entries[0].branch_prefix.as_deref(), Some("agent-notes"));
    }
}
