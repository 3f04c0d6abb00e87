//! Activation job: acknowledges the trigger and prepares the prompt inputs

use super::actions::{script_step, step_output, CHECKOUT, GITHUB_SCRIPT};
use super::pre_activation::command_name;
use super::BuildContext;
use crate::node::JobNode;
use awc_actions::ActionResolver;
use awc_config::{Permissions, Step};
use awc_core::{Result, ACTIVATION_JOB, DEFAULT_RUNS_ON, PRE_ACTIVATION_JOB};

pub async fn build(context: &mut BuildContext<'_>, resolver: &mut ActionResolver) -> Result<()> {
    let spec = context.spec;
    let checkout = resolver.pin(CHECKOUT).await?;
    let github_script = resolver.pin(GITHUB_SCRIPT).await?;

    let mut job = JobNode::new(ACTIVATION_JOB);
    job.runs_on = Some(DEFAULT_RUNS_ON.into());

    if context.has_job(PRE_ACTIVATION_JOB) {
        job = job
            .needs(PRE_ACTIVATION_JOB)
            .with_condition(format!(
                "needs.{PRE_ACTIVATION_JOB}.outputs.activated == 'true'"
            ));
    } else {
        job.condition = spec.condition.clone();
    }
    for id in &context.plan.before_activation {
        job.needs.insert(id.clone());
    }

    let mut permissions = Permissions::scopes(&[("contents", "read")]);
    let mut steps = vec![
        Step::uses("Checkout workflows", checkout)
            .with_input("sparse-checkout", ".github")
            .with_input("persist-credentials", false)
            .with_input("fetch-depth", 1),
        script_step(
            "Check workflow file timestamps",
            "check_timestamps",
            &github_script,
            "check_workflow_timestamp",
        )
        .with_env("GH_AW_WORKFLOW_NAME", spec.display_name()),
        script_step("Compute current body text", "compute_text", &github_script, "compute_text"),
    ];
    job = job.with_output("text", step_output("compute_text", "text"));

    if let Some(reaction) = &spec.triggers.reaction {
        let mut react = script_step(
            &format!("Add {reaction} reaction to the triggering item"),
            "react",
            &github_script,
            "add_reaction_and_edit_comment",
        )
        .with_env("GH_AW_REACTION", reaction.clone())
        .with_env("GH_AW_WORKFLOW_NAME", spec.display_name());
        if let Some(command) = command_name(spec) {
            react = react.with_env("GH_AW_COMMAND", command);
        }
        steps.push(react);

        for scope in ["discussions", "issues", "pull-requests"] {
            permissions.grant(scope, "write");
        }
        job = job
            .with_output("comment_id", step_output("react", "comment-id"))
            .with_output("comment_repo", step_output("react", "comment-repo"))
            .with_output("reaction_id", step_output("react", "reaction-id"));
    }

    job.steps = steps;
    job.permissions = Some(permissions);
    context.jobs.add_job(job)
}
