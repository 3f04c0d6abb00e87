//! Dependency inference for custom jobs

use awc_config::WorkflowSpec;
use awc_core::ACTIVATION_JOB;
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Dependencies decided for every custom job before any node is built
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyPlan {
    /// Final dependency set per custom job, in declaration order
    pub needs: IndexMap<String, BTreeSet<String>>,
    /// Custom jobs activation must wait for
    pub before_activation: Vec<String>,
}

/// Whether anything other than the job itself refers to `<job_id>.`.
///
/// Looks at the other custom jobs' conditions, the workflow-level condition
/// and the markdown body. This is a plain substring match.
pub fn is_referenced(job_id: &str, spec: &WorkflowSpec) -> bool {
    let needle = format!("{job_id}.");

    let in_other_jobs = spec
        .jobs
        .iter()
        .filter(|(id, _)| id.as_str() != job_id)
        .filter_map(|(_, config)| config.condition.as_deref())
        .any(|condition| condition.contains(&needle));

    in_other_jobs
        || spec
            .condition
            .as_deref()
            .is_some_and(|condition| condition.contains(&needle))
        || spec.markdown.contains(&needle)
}

/// Work out each custom job's dependency set.
///
/// Explicit `needs` are used as written. A job without them depends on
/// activation, unless it is referenced elsewhere; then it gets no implicit
/// edge and activation depends on it instead.
pub fn plan_custom_dependencies(spec: &WorkflowSpec) -> DependencyPlan {
    let mut plan = DependencyPlan::default();

    for (id, config) in &spec.jobs {
        let needs: BTreeSet<String> = match config.explicit_needs() {
            Some(explicit) => explicit.into_iter().collect(),
            None if is_referenced(id, spec) => {
                plan.before_activation.push(id.clone());
                BTreeSet::new()
            }
            None => BTreeSet::from([ACTIVATION_JOB.to_string()]),
        };
        plan.needs.insert(id.clone(), needs);
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(yaml: &str) -> WorkflowSpec {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_unreferenced_job_needs_activation() {
        let plan = plan_custom_dependencies(&spec("jobs:\n  lint:\n    steps:\n      - run: make lint\n"));
        assert_eq!(plan.needs["lint"], BTreeSet::from(["activation".to_string()]));
        assert!(plan.before_activation.is_empty());
    }

    #[test]
    fn test_explicit_needs_used_verbatim() {
        let plan = plan_custom_dependencies(&spec(
            "jobs:\n  x:\n    steps: []\n  y:\n    needs: [x]\n    steps: []\n",
        ));
        assert_eq!(plan.needs["x"], BTreeSet::from(["activation".to_string()]));
        assert_eq!(plan.needs["y"], BTreeSet::from(["x".to_string()]));
    }

    #[test]
    fn test_reference_in_markdown() {
        let plan = plan_custom_dependencies(&spec(
            "jobs:\n  fetch:\n    steps: []\nmarkdown: \"Use ${{ needs.fetch.outputs.data }}\"\n",
        ));
        assert!(plan.needs["fetch"].is_empty());
        assert_eq!(plan.before_activation, vec!["fetch".to_string()]);
    }

    #[test]
    fn test_reference_in_workflow_condition() {
        let workflow = spec("if: needs.gate.outputs.ok == 'true'\njobs:\n  gate:\n    steps: []\n");
        assert!(is_referenced("gate", &workflow));
    }

    #[test]
    fn test_own_condition_does_not_count() {
        let workflow = spec("jobs:\n  gate:\n    if: needs.gate.result\n    steps: []\n");
        assert!(!is_referenced("gate", &workflow));
    }

    #[test]
    fn test_reference_in_other_job_condition() {
        let workflow = spec(
            "jobs:\n  gate:\n    steps: []\n  deploy:\n    needs: gate\n    if: needs.gate.outputs.ok == 'true'\n    steps: []\n",
        );
        let plan = plan_custom_dependencies(&workflow);
        assert_eq!(plan.before_activation, vec!["gate".to_string()]);
        assert_eq!(plan.needs["deploy"], BTreeSet::from(["gate".to_string()]));
    }

    #[test]
    fn test_explicit_activation_never_runs_before() {
        let plan = plan_custom_dependencies(&spec(
            "jobs:\n  post:\n    needs: activation\n    steps: []\nmarkdown: see post.result\n",
        ));
        assert!(plan.before_activation.is_empty());
        assert_eq!(plan.needs["post"], BTreeSet::from(["activation".to_string()]));
    }
}
