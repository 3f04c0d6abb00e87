//! Pre-activation gating job

use super::actions::{script_step, step_output, GITHUB_SCRIPT};
use super::BuildContext;
use crate::node::JobNode;
use awc_actions::ActionResolver;
use awc_config::{Permissions, Roles, Step, WorkflowSpec};
use awc_core::{Result, DEFAULT_ROLES, DEFAULT_RUNS_ON, PRE_ACTIVATION_JOB, UNGATED_EVENTS};
use tracing::debug;

const DEFAULT_SKIP_MAX_MATCHES: u32 = 1;
const DEFAULT_SKIP_MIN_MATCHES: u32 = 1;
const DEFAULT_RATE_LIMIT_MAX: u32 = 5;
const DEFAULT_RATE_LIMIT_WINDOW_MINUTES: u32 = 60;

/// A check step and the boolean output it exports
struct Gate {
    step: Step,
    step_id: &'static str,
    output: &'static str,
}

/// Whether the actor's repository role has to be checked.
///
/// Not needed when every role is allowed, or when every trigger event is one
/// an untrusted actor cannot start. A command trigger always needs it.
pub fn role_check_required(spec: &WorkflowSpec) -> bool {
    if spec.roles.as_ref().is_some_and(Roles::is_all) {
        return false;
    }
    if spec.triggers.command.is_some() {
        return true;
    }
    let events = spec.triggers.event_names();
    events.is_empty() || !events.iter().all(|event| UNGATED_EVENTS.contains(event))
}

/// Name the command trigger answers to
pub fn command_name(spec: &WorkflowSpec) -> Option<String> {
    let command = spec.triggers.command.as_ref()?;
    Some(command.name.clone().unwrap_or_else(|| {
        spec.display_name()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
    }))
}

fn gates(spec: &WorkflowSpec, github_script: &str) -> Vec<Gate> {
    let triggers = &spec.triggers;
    let mut gates = Vec::new();

    if role_check_required(spec) {
        let roles = match &spec.roles {
            Some(Roles::Only(roles)) => roles.join(","),
            _ => DEFAULT_ROLES.join(","),
        };
        gates.push(Gate {
            step: script_step("Check team membership", "check_membership", github_script, "check_membership")
                .with_env("GH_AW_REQUIRED_ROLES", roles),
            step_id: "check_membership",
            output: "is_team_member",
        });
    }

    if let Some(stop_after) = &triggers.stop_after {
        gates.push(Gate {
            step: script_step("Check stop-time limit", "check_stop_time", github_script, "check_stop_time")
                .with_env("GH_AW_STOP_TIME", stop_after.clone())
                .with_env("GH_AW_WORKFLOW_NAME", spec.display_name()),
            step_id: "check_stop_time",
            output: "stop_time_ok",
        });
    }

    if let Some(skip) = &triggers.skip_if_match {
        gates.push(Gate {
            step: script_step("Check skip-if-match query", "check_skip_if_match", github_script, "check_skip_if_match")
                .with_env("GH_AW_SKIP_QUERY", skip.query.clone())
                .with_env(
                    "GH_AW_SKIP_MAX_MATCHES",
                    skip.max.unwrap_or(DEFAULT_SKIP_MAX_MATCHES).to_string(),
                ),
            step_id: "check_skip_if_match",
            output: "skip_check_ok",
        });
    }

    if let Some(skip) = &triggers.skip_if_no_match {
        gates.push(Gate {
            step: script_step(
                "Check skip-if-no-match query",
                "check_skip_if_no_match",
                github_script,
                "check_skip_if_no_match",
            )
            .with_env("GH_AW_SKIP_QUERY", skip.query.clone())
            .with_env(
                "GH_AW_SKIP_MIN_MATCHES",
                skip.min.unwrap_or(DEFAULT_SKIP_MIN_MATCHES).to_string(),
            ),
            step_id: "check_skip_if_no_match",
            output: "skip_no_match_check_ok",
        });
    }

    if !triggers.skip_roles.is_empty() {
        gates.push(Gate {
            step: script_step("Check skip-roles", "check_skip_roles", github_script, "check_skip_roles")
                .with_env("GH_AW_SKIP_ROLES", triggers.skip_roles.join(",")),
            step_id: "check_skip_roles",
            output: "skip_roles_ok",
        });
    }

    if let (Some(name), Some(command)) = (command_name(spec), &triggers.command) {
        let mut step = script_step(
            "Check command position",
            "check_command_position",
            github_script,
            "check_command_position",
        )
        .with_env("GH_AW_COMMAND", name);
        if !command.events.is_empty() {
            step = step.with_env("GH_AW_COMMAND_EVENTS", command.events.join(","));
        }
        gates.push(Gate {
            step,
            step_id: "check_command_position",
            output: "command_position_ok",
        });
    }

    if let Some(limit) = &spec.rate_limit {
        let mut step = script_step("Check rate limit", "check_rate_limit", github_script, "check_rate_limit")
            .with_env(
                "GH_AW_RATE_LIMIT_MAX",
                limit.max.unwrap_or(DEFAULT_RATE_LIMIT_MAX).to_string(),
            )
            .with_env(
                "GH_AW_RATE_LIMIT_WINDOW",
                limit
                    .window
                    .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_MINUTES)
                    .to_string(),
            );
        if !limit.events.is_empty() {
            step = step.with_env("GH_AW_RATE_LIMIT_EVENTS", limit.events.join(","));
        }
        gates.push(Gate {
            step,
            step_id: "check_rate_limit",
            output: "rate_limit_ok",
        });
    }

    gates
}

/// Whether any activation gate is configured
pub fn is_required(spec: &WorkflowSpec) -> bool {
    let triggers = &spec.triggers;
    role_check_required(spec)
        || triggers.stop_after.is_some()
        || triggers.skip_if_match.is_some()
        || triggers.skip_if_no_match.is_some()
        || !triggers.skip_roles.is_empty()
        || triggers.command.is_some()
        || spec.rate_limit.is_some()
}

/// Add the pre-activation job when at least one gate is configured.
///
/// Each gate exports a boolean; `activated` is their conjunction.
pub async fn build(context: &mut BuildContext<'_>, resolver: &mut ActionResolver) -> Result<()> {
    let spec = context.spec;
    if !is_required(spec) {
        debug!("no activation gates configured, skipping pre-activation");
        return Ok(());
    }

    let github_script = resolver.pin(GITHUB_SCRIPT).await?;
    let gates = gates(spec, &github_script);

    let mut job = JobNode::new(PRE_ACTIVATION_JOB)
        .with_permissions(Permissions::scopes(&[("contents", "read")]));
    job.runs_on = Some(DEFAULT_RUNS_ON.into());
    job.condition = spec.condition.clone();

    let mut steps = Vec::with_capacity(gates.len());
    let mut checks = Vec::with_capacity(gates.len());
    for gate in gates {
        job.outputs
            .insert(gate.output.to_string(), step_output(gate.step_id, gate.output));
        checks.push(format!("steps.{}.outputs.{} == 'true'", gate.step_id, gate.output));
        steps.push(gate.step);
    }
    job.outputs
        .insert("activated".to_string(), format!("${{{{ {} }}}}", checks.join(" && ")));
    job.steps = steps;

    context.jobs.add_job(job)
}
