//! Top-level workflow specification

use super::{
    deserialize_block, deserialize_string_map, CacheMemoryConfig, CustomJobConfig, Permissions,
    RateLimit, RepoMemoryConfig, Roles, SafeOutputsConfig, Step, Triggers,
};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

/// The parsed workflow specification the compiler consumes read-only
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WorkflowSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "on")]
    pub triggers: Triggers,
    #[serde(default)]
    pub roles: Option<Roles>,
    #[serde(default)]
    pub rate_limit: Option<RateLimit>,
    #[serde(default)]
    pub permissions: Option<Permissions>,
    /// Workflow-level run condition
    #[serde(default, rename = "if")]
    pub condition: Option<String>,
    #[serde(default)]
    pub runs_on: Option<serde_json::Value>,
    #[serde(default)]
    pub timeout_minutes: Option<u32>,
    #[serde(default)]
    pub concurrency: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "deserialize_string_map")]
    pub env: IndexMap<String, String>,
    #[serde(default)]
    pub engine: Option<EngineConfig>,
    /// Custom steps run in the agent job before the engine
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub safe_outputs: Option<SafeOutputsConfig>,
    #[serde(default)]
    pub jobs: IndexMap<String, CustomJobConfig>,
    /// Free-form prompt body
    #[serde(default)]
    pub markdown: String,
}

impl WorkflowSpec {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("workflow")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ToolsConfig {
    #[serde(default, deserialize_with = "deserialize_block")]
    pub repo_memory: Option<RepoMemoryConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub cache_memory: Option<CacheMemoryConfig>,
    /// Every other tool, passed to the engine untouched
    #[serde(flatten)]
    pub other: IndexMap<String, serde_json::Value>,
}

/// Agent engine selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Engine identifier (`copilot`, `claude`, `codex`, ...)
    pub id: String,
    pub model: Option<String>,
    pub version: Option<String>,
    pub max_turns: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            id: "copilot".to_string(),
            model: None,
            version: None,
            max_turns: None,
        }
    }
}

impl<'de> Deserialize<'de> for EngineConfig {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Id(String),
            Full {
                id: String,
                #[serde(default)]
                model: Option<String>,
                #[serde(default)]
                version: Option<String>,
                #[serde(default, rename = "max-turns")]
                max_turns: Option<u32>,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Id(id) => EngineConfig {
                id,
                ..Default::default()
            },
            Raw::Full {
                id,
                model,
                version,
                max_turns,
            } => EngineConfig {
                id,
                model,
                version,
                max_turns,
            },
        })
    }
}
