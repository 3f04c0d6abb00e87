//! Job nodes of the compiled graph

use awc_config::{Permissions, Step};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;

/// One job in the compiled graph.
///
/// Conditions, permissions and step bodies are opaque to the compiler; only
/// `needs` takes part in graph validation. A job either has `steps` or calls a
/// reusable workflow, never both.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct JobNode {
    #[serde(skip)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Ordered so emitted output is stable
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub needs: BTreeSet<String>,
    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runs_on: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_minutes: Option<u32>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub outputs: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,
    #[serde(flatten)]
    pub reusable: Option<ReusableWorkflow>,
}

/// Call to a reusable workflow in place of steps
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReusableWorkflow {
    pub uses: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub with: IndexMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secrets: Option<serde_json::Value>,
}

impl JobNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn needs(mut self, dependency: impl Into<String>) -> Self {
        self.needs.insert(dependency.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_output(mut self, name: impl Into<String>, expression: impl Into<String>) -> Self {
        self.outputs.insert(name.into(), expression.into());
        self
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn with_steps(mut self, steps: Vec<Step>) -> Self {
        self.steps = steps;
        self
    }

    pub fn depends_on(&self, dependency: &str) -> bool {
        self.needs.contains(dependency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let node = JobNode::new("conclusion")
            .needs("agent")
            .needs("activation")
            .with_condition("always()")
            .with_output("done", "${{ steps.finish.outputs.done }}")
            .with_steps(vec![Step::run("Finish", "echo done").with_id("finish")]);

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["needs"], serde_json::json!(["activation", "agent"]));
        assert_eq!(value["if"], "always()");
        assert!(value.get("id").is_none());
        assert!(value.get("uses").is_none());
        assert!(value.get("env").is_none());
    }

    #[test]
    fn test_reusable_workflow_flattens() {
        let mut node = JobNode::new("deploy");
        node.reusable = Some(ReusableWorkflow {
            uses: "org/repo/.github/workflows/deploy.yml@main".into(),
            with: IndexMap::new(),
            secrets: Some(serde_json::json!("inherit")),
        });
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["uses"], "org/repo/.github/workflows/deploy.yml@main");
        assert_eq!(value["secrets"], "inherit");
        assert!(value.get("steps").is_none());
    }
}
