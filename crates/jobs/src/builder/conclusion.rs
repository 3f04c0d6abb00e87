//! Conclusion job: reports the run outcome back to the triggering item

use super::actions::{job_output, script_step, DOWNLOAD_ARTIFACT, GITHUB_SCRIPT};
use super::agent::download_agent_output;
use super::BuildContext;
use crate::node::JobNode;
use awc_actions::ActionResolver;
use awc_config::Permissions;
use awc_core::{
    Result, ACTIVATION_JOB, AGENT_JOB, AGENT_OUTPUT_ENV, CONCLUSION_JOB, DEFAULT_RUNS_ON,
    DETECTION_JOB, SAFE_OUTPUTS_JOB,
};

const CONCLUSION_DIR: &str = "/tmp/gh-aw/conclusion/";

/// Add the conclusion job.
///
/// Always runs once everything it depends on has finished, whatever their
/// result. The memory phase appends its jobs to the dependency set later.
pub async fn build(context: &mut BuildContext<'_>, resolver: &mut ActionResolver) -> Result<()> {
    let spec = context.spec;
    let download = resolver.pin(DOWNLOAD_ARTIFACT).await?;
    let github_script = resolver.pin(GITHUB_SCRIPT).await?;

    let mut job = JobNode::new(CONCLUSION_JOB)
        .needs(ACTIVATION_JOB)
        .needs(AGENT_JOB)
        .with_condition(format!("always() && needs.{AGENT_JOB}.result != 'skipped'"));
    for optional in [SAFE_OUTPUTS_JOB, DETECTION_JOB] {
        if context.has_job(optional) {
            job.needs.insert(optional.to_string());
        }
    }
    job.runs_on = Some(DEFAULT_RUNS_ON.into());

    let mut permissions = Permissions::scopes(&[("contents", "read")]);
    let mut steps = vec![download_agent_output(&download, CONCLUSION_DIR)];

    if spec.triggers.reaction.is_some() {
        for scope in ["discussions", "issues", "pull-requests"] {
            permissions.grant(scope, "write");
        }
        let mut update = script_step(
            "Update reaction comment with completion status",
            "conclusion",
            &github_script,
            "notify_comment_completion",
        )
        .with_env("GH_AW_COMMENT_ID", job_output(ACTIVATION_JOB, "comment_id"))
        .with_env("GH_AW_COMMENT_REPO", job_output(ACTIVATION_JOB, "comment_repo"))
        .with_env("GH_AW_AGENT_CONCLUSION", format!("${{{{ needs.{AGENT_JOB}.result }}}}"))
        .with_env("GH_AW_WORKFLOW_NAME", spec.display_name());
        if context.has_job(SAFE_OUTPUTS_JOB) {
            update = update.with_env(
                "GH_AW_SAFE_OUTPUTS_PROCESSED",
                job_output(SAFE_OUTPUTS_JOB, "processed_count"),
            );
        }
        steps.push(update);
    }

    steps.push(
        script_step(
            "Handle agent failure",
            "handle_agent_failure",
            &github_script,
            "handle_agent_failure",
        )
        .with_condition(format!("needs.{AGENT_JOB}.result == 'failure'"))
        .with_env(AGENT_OUTPUT_ENV, format!("{CONCLUSION_DIR}agent-output.json"))
        .with_env("GH_AW_WORKFLOW_NAME", spec.display_name())
        .with_env(
            "GH_AW_RUN_URL",
            "${{ github.server_url }}/${{ github.repository }}/actions/runs/${{ github.run_id }}",
        ),
    );
    if context.has_job(DETECTION_JOB) {
        steps.push(
            script_step(
                "Report threat detection findings",
                "report_threats",
                &github_script,
                "report_threat_detection",
            )
            .with_condition(format!("needs.{DETECTION_JOB}.outputs.success == 'false'")),
        );
    }

    job.steps = steps;
    job.permissions = Some(permissions);
    context.jobs.add_job(job)
}
