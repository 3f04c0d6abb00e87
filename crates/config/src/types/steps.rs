//! Step definitions shared by the input model and compiled jobs

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single job step.
///
/// The compiler treats step bodies as opaque instructions. Only `uses` (for
/// pinning) and the emitted values (for size checks) are inspected; unknown
/// keys such as `shell` or `continue-on-error` are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Step {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, rename = "if", skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub with: IndexMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "IndexMap::is_empty",
        deserialize_with = "super::deserialize_string_map"
    )]
    pub env: IndexMap<String, String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl Step {
    /// A step that invokes an action
    pub fn uses(name: impl Into<String>, uses: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            uses: Some(uses.into()),
            ..Default::default()
        }
    }

    /// A step that runs a shell script
    pub fn run(name: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            run: Some(script.into()),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.with.insert(key.into(), value.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Display label used in diagnostics
    pub fn label(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.id.clone())
            .or_else(|| self.uses.clone())
            .unwrap_or_else(|| "<unnamed step>".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_roundtrips_unknown_keys() {
        let yaml = "name: Build\nrun: make\nshell: bash\ncontinue-on-error: true\n";
        let step: Step = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(step.run.as_deref(), Some("make"));
        assert_eq!(step.extra["shell"], serde_json::json!("bash"));
        assert_eq!(step.extra["continue-on-error"], serde_json::json!(true));

        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value["shell"], "bash");
        assert!(value.get("with").is_none());
    }

    #[test]
    fn test_builder_helpers() {
        let step = Step::uses("Checkout", "actions/checkout@v5")
            .with_id("checkout")
            .with_condition("always()")
            .with_input("fetch-depth", 0)
            .with_env("TOKEN", "x");
        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value["if"], "always()");
        assert_eq!(value["with"]["fetch-depth"], 0);
        assert_eq!(step.label(), "Checkout");
    }
}
