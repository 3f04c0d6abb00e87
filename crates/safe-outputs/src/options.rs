//! Accumulates a per-kind options object, keeping only non-default fields

use awc_config::KindCommon;
use serde_json::{Map, Value};

/// Builder for one kind's options object.
///
/// Numbers are kept only when positive, strings only when non-empty and lists
/// only when non-empty. An untouched builder yields `{}`.
#[derive(Debug, Default)]
pub struct OptionsBuilder {
    options: Map<String, Value>,
}

impl OptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positive(mut self, key: &str, value: Option<u32>) -> Self {
        if let Some(value) = value.filter(|v| *v > 0) {
            self.options.insert(key.to_string(), Value::from(value));
        }
        self
    }

    pub fn string(mut self, key: &str, value: Option<&str>) -> Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.options.insert(key.to_string(), Value::from(value));
        }
        self
    }

    pub fn list(mut self, key: &str, values: &[String]) -> Self {
        if !values.is_empty() {
            self.options.insert(key.to_string(), Value::from(values.to_vec()));
        }
        self
    }

    /// Kept only when `true`
    pub fn flag(mut self, key: &str, value: bool) -> Self {
        if value {
            self.options.insert(key.to_string(), Value::Bool(true));
        }
        self
    }

    /// Kept whenever explicitly set
    pub fn optional_bool(mut self, key: &str, value: Option<bool>) -> Self {
        if let Some(value) = value {
            self.options.insert(key.to_string(), Value::Bool(value));
        }
        self
    }

    /// Kept unconditionally
    pub fn always(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }

    /// `max`, `target`, `target_repo`, `allowed_repos`
    pub fn common(self, common: &KindCommon) -> Self {
        self.positive("max", common.max)
            .string("target", common.target.as_deref())
            .string("target_repo", common.target_repo.as_deref())
            .list("allowed_repos", &common.allowed_repos)
    }

    /// Attribution footer: per-kind override, then the workflow-wide value,
    /// then on. Written only when the result is off.
    pub fn footer(self, per_kind: Option<bool>, workflow: Option<bool>) -> Self {
        let footer = per_kind.or(workflow).unwrap_or(true);
        if footer {
            self
        } else {
            self.always("footer", false)
        }
    }

    pub fn build(self) -> Map<String, Value> {
        self.options
    }
}
