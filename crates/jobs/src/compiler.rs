//! Compilation driver: specification in, validated workflow out

use crate::builder::JobGraphBuilder;
use crate::manager::JobManager;
use awc_actions::ActionResolver;
use awc_config::{Permissions, WorkflowSpec};
use awc_core::Result;
use awc_safe_outputs::DispatchConfig;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::info;

const GENERATED_HEADER: &str =
    "# This file was generated by awc. Do not edit it by hand; recompile the source instead.\n";

static USES_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^([ \t]*(?:- )?uses: )(\S+)$").expect("uses line pattern is valid")
});

/// Events a command trigger listens on when none are listed, with the
/// activity types that can carry a command
const COMMAND_EVENTS: &[(&str, &[&str])] = &[
    ("issues", &["opened", "edited", "reopened"]),
    ("issue_comment", &["created", "edited"]),
    ("pull_request", &["opened", "edited", "reopened"]),
    ("pull_request_review_comment", &["created", "edited"]),
    ("discussion", &["created", "edited"]),
    ("discussion_comment", &["created", "edited"]),
];

/// The result of compiling one specification
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledWorkflow {
    pub name: String,
    /// Platform trigger events, command events included
    pub on: IndexMap<String, Value>,
    pub graph: JobManager,
    pub dispatch_config: Option<DispatchConfig>,
    /// Version tag of each pinned `repo@sha` used by a step
    pub pin_versions: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct WorkflowDocument<'a> {
    name: &'a str,
    on: &'a IndexMap<String, Value>,
    permissions: Permissions,
    jobs: &'a JobManager,
}

impl CompiledWorkflow {
    /// Render the workflow file.
    ///
    /// Pinned `uses:` values are followed by a ` # <version>` comment. The
    /// comment sits outside the scalar so the parsed value stays `repo@sha`.
    pub fn to_yaml(&self) -> Result<String> {
        let document = WorkflowDocument {
            name: &self.name,
            on: &self.on,
            permissions: Permissions::default(),
            jobs: &self.graph,
        };
        let body = serde_yaml::to_string(&document)?;
        let body = USES_LINE.replace_all(&body, |caps: &Captures| {
            match self.pin_versions.get(&caps[2]) {
                Some(version) => format!("{}{} # {version}", &caps[1], &caps[2]),
                None => caps[0].to_string(),
            }
        });
        Ok(format!("{GENERATED_HEADER}{body}"))
    }
}

/// Trigger events as emitted, adding the command trigger's events
pub fn emitted_triggers(spec: &WorkflowSpec) -> IndexMap<String, Value> {
    let mut on = spec.triggers.events.clone();
    if let Some(command) = &spec.triggers.command {
        for (event, types) in COMMAND_EVENTS {
            let listed = command.events.is_empty() || command.events.iter().any(|e| e == event);
            if listed && !on.contains_key(*event) {
                on.insert(event.to_string(), json!({ "types": types }));
            }
        }
    }
    on
}

/// Compiles workflow specifications into job graphs
#[derive(Default)]
pub struct Compiler {
    builder: JobGraphBuilder,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builder(builder: JobGraphBuilder) -> Self {
        Self { builder }
    }

    /// Compile one specification.
    ///
    /// Fails on the first configuration, resolution or size-limit error; no
    /// partial workflow is produced.
    pub async fn compile(
        &self,
        spec: &WorkflowSpec,
        resolver: &mut ActionResolver,
    ) -> Result<CompiledWorkflow> {
        let built = self.builder.build(spec, resolver).await?;
        info!(
            workflow = spec.display_name(),
            jobs = built.jobs.len(),
            "compiled workflow"
        );
        let pin_versions = pin_versions(&built.jobs, resolver);
        Ok(CompiledWorkflow {
            name: spec.display_name().to_string(),
            on: emitted_triggers(spec),
            graph: built.jobs,
            dispatch_config: built.dispatch,
            pin_versions,
        })
    }
}

fn pin_versions(graph: &JobManager, resolver: &ActionResolver) -> BTreeMap<String, String> {
    graph
        .jobs()
        .flat_map(|job| job.steps.iter())
        .filter_map(|step| step.uses.as_deref())
        .filter_map(|uses| {
            resolver
                .pinned_version(uses)
                .map(|version| (uses.to_string(), version.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(yaml: &str) -> WorkflowSpec {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_version_comment_follows_pinned_uses() {
        let sha = "08c6903cd8c0fde910a37f88322edcfb5dd907a8";
        let step = awc_config::Step::uses("Checkout", format!("actions/checkout@{sha}"));
        let mut job = crate::node::JobNode::new("agent");
        job.runs_on = Some(json!("ubuntu-latest"));
        job.steps.push(step);
        let mut graph = JobManager::new();
        graph.add_job(job).unwrap();

        let workflow = CompiledWorkflow {
            name: "demo".into(),
            on: IndexMap::new(),
            graph,
            dispatch_config: None,
            pin_versions: BTreeMap::from([(format!("actions/checkout@{sha}"), "v5".to_string())]),
        };
        let rendered = workflow.to_yaml().unwrap();
        assert!(rendered.contains(&format!("uses: actions/checkout@{sha} # v5\n")));

        let parsed: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(
            parsed["jobs"]["agent"]["steps"][0]["uses"].as_str(),
            Some(format!("actions/checkout@{sha}").as_str())
        );
    }

    #[test]
    fn test_command_adds_comment_events() {
        let on = emitted_triggers(&spec("on:\n  command:\n    name: fix\n"));
        assert_eq!(on.len(), COMMAND_EVENTS.len());
        assert_eq!(on["issue_comment"], json!({"types": ["created", "edited"]}));
    }

    #[test]
    fn test_command_events_filter() {
        let on = emitted_triggers(&spec(
            "on:\n  issues:\n    types: [labeled]\n  command:\n    name: fix\n    events: [issues, issue_comment]\n",
        ));
        let names: Vec<_> = on.keys().cloned().collect();
        assert_eq!(names, vec!["issues", "issue_comment"]);
        assert_eq!(on["issues"], json!({"types": ["labeled"]}));
    }
}
