//! Specification types

pub mod jobs;
pub mod memory;
pub mod overrides;
pub mod permissions;
pub mod safe_outputs;
pub mod steps;
pub mod triggers;
pub mod workflow;

pub use jobs::*;
pub use memory::*;
pub use overrides::*;
pub use permissions::*;
pub use safe_outputs::*;
pub use steps::*;
pub use triggers::*;
pub use workflow::*;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize an optional configuration block where an explicit `null`
/// (e.g. `create-issue:` with nothing after it) enables the block with its
/// defaults. Pair with `#[serde(default)]` so an absent key stays `None`.
pub fn deserialize_block<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(|block| Some(block.unwrap_or_default()))
}

/// Deserialize a string map whose values may be written as YAML scalars of
/// any type (`TIMEOUT: 30`); non-string scalars are stringified.
pub fn deserialize_string_map<'de, D>(
    deserializer: D,
) -> std::result::Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<IndexMap<String, serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, scalar_to_string(value)))
        .collect())
}

/// Render a JSON/YAML scalar the way it would appear in an emitted value
pub fn scalar_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A field that accepts either a single string or a list of strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    /// Normalize to a list
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            StringOrList::One(value) => vec![value.clone()],
            StringOrList::Many(values) => values.clone(),
        }
    }
}
