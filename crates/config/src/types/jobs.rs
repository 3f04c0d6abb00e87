//! User-declared custom jobs (`jobs:`)

use super::{deserialize_string_map, Permissions, Step, StringOrList};
use indexmap::IndexMap;
use serde::Deserialize;

/// A custom job declaration.
///
/// Either a regular job with `steps`, or a call to a reusable workflow via
/// `uses` (+ `with`/`secrets`). Both at once is rejected at compile time.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CustomJobConfig {
    #[serde(default)]
    pub name: Option<String>,
    /// Explicit dependencies; `None` means "let the compiler infer"
    #[serde(default)]
    pub needs: Option<StringOrList>,
    #[serde(default, rename = "if")]
    pub condition: Option<String>,
    #[serde(default)]
    pub runs_on: Option<serde_json::Value>,
    #[serde(default)]
    pub permissions: Option<Permissions>,
    #[serde(default, deserialize_with = "deserialize_string_map")]
    pub outputs: IndexMap<String, String>,
    #[serde(default)]
    pub steps: Option<Vec<Step>>,
    /// Reusable workflow reference
    #[serde(default)]
    pub uses: Option<String>,
    #[serde(default)]
    pub with: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    pub secrets: Option<JobSecrets>,
    #[serde(default, deserialize_with = "deserialize_string_map")]
    pub env: IndexMap<String, String>,
    #[serde(default)]
    pub timeout_minutes: Option<u32>,
    #[serde(default)]
    pub environment: Option<serde_json::Value>,
    #[serde(default)]
    pub concurrency: Option<serde_json::Value>,
}

impl CustomJobConfig {
    /// Explicit dependency list, if one was written
    pub fn explicit_needs(&self) -> Option<Vec<String>> {
        self.needs.as_ref().map(StringOrList::to_vec)
    }
}

/// Secrets passed to a reusable workflow
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum JobSecrets {
    /// Only `inherit` is accepted; checked at compile time
    Keyword(String),
    Map(IndexMap<String, serde_json::Value>),
}
