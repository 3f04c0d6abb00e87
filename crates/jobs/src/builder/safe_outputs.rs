//! Safe-output dispatcher and threat detection jobs

use super::actions::{
    download_artifact, script_step, step_output, CHECKOUT, DOWNLOAD_ARTIFACT, GITHUB_SCRIPT,
};
use super::agent::{download_agent_output, engine_command};
use super::{pin_steps, BuildContext};
use crate::node::JobNode;
use awc_actions::ActionResolver;
use awc_config::{Permissions, Step};
use awc_core::{
    Result, AGENT_JOB, AGENT_OUTPUT_ENV, AGENT_PATCH_ARTIFACT, DEFAULT_RUNS_ON, DETECTION_JOB,
    SAFE_OUTPUTS_CONFIG_ENV, SAFE_OUTPUTS_JOB, SAFE_OUTPUTS_STAGED_ENV,
};
use awc_safe_outputs::{resolve_github_token, shared_checkout_steps};
use tracing::debug;

const SAFE_OUTPUTS_DIR: &str = "/tmp/gh-aw/safeoutputs/";
const THREAT_DETECTION_DIR: &str = "/tmp/gh-aw/threat-detection/";
const DETECTION_TIMEOUT_MINUTES: u32 = 10;

/// Run condition of the dispatcher
pub fn dispatcher_condition(detection: bool) -> String {
    let base = format!("(!cancelled()) && needs.{AGENT_JOB}.result != 'skipped'");
    if detection {
        format!("{base} && needs.{DETECTION_JOB}.outputs.success == 'true'")
    } else {
        base
    }
}

/// Whether the detection job will be created for this context
fn detection_enabled(context: &BuildContext<'_>) -> bool {
    context.dispatch.is_some()
        && context
            .spec
            .safe_outputs
            .as_ref()
            .is_some_and(|config| config.threat_detection_enabled())
}

/// Add the single dispatcher job that applies every enabled kind.
///
/// The merged configuration travels in one environment variable; the
/// handler reads it at run time and dispatches each agent output item.
pub async fn build_dispatcher(context: &mut BuildContext<'_>, resolver: &mut ActionResolver) -> Result<()> {
    let (Some(dispatch), Some(config)) = (&context.dispatch, &context.spec.safe_outputs) else {
        debug!("no safe-output kinds enabled, skipping dispatcher");
        return Ok(());
    };
    let detection = detection_enabled(context);

    let download = resolver.pin(DOWNLOAD_ARTIFACT).await?;
    let github_script = resolver.pin(GITHUB_SCRIPT).await?;

    let mut job = JobNode::new(SAFE_OUTPUTS_JOB)
        .needs(AGENT_JOB)
        .with_condition(dispatcher_condition(detection))
        .with_permissions(dispatch.permissions());
    if detection {
        job.needs.insert(DETECTION_JOB.to_string());
    }
    job.runs_on = Some(config.runs_on.as_deref().unwrap_or(DEFAULT_RUNS_ON).into());
    job.env = config.env.clone();

    let mut steps = vec![download_agent_output(&download, SAFE_OUTPUTS_DIR)];
    let checkout_steps = if dispatch.kinds().iter().any(|kind| kind.needs_checkout()) {
        let checkout = resolver.pin(CHECKOUT).await?;
        steps.push(download_artifact(
            "Download patch artifact",
            &download,
            AGENT_PATCH_ARTIFACT,
            "/tmp/gh-aw/",
        ));
        shared_checkout_steps(config, dispatch, &checkout)
    } else {
        Vec::new()
    };
    steps.extend(checkout_steps);

    let mut handler = script_step(
        "Process safe outputs",
        "process_safe_outputs",
        &github_script,
        "safe_output_handler_manager",
    )
    .with_input("github-token", resolve_github_token(None, config))
    .with_env(
        AGENT_OUTPUT_ENV,
        format!("{SAFE_OUTPUTS_DIR}agent-output.json"),
    )
    .with_env(SAFE_OUTPUTS_CONFIG_ENV, dispatch.as_json());
    if config.staged {
        handler = handler.with_env(SAFE_OUTPUTS_STAGED_ENV, "true");
    }
    steps.push(handler);

    job.steps = steps;
    job = job
        .with_output("processed_count", step_output("process_safe_outputs", "processed_count"))
        .with_output(
            "temporary_id_map",
            step_output("process_safe_outputs", "temporary_id_map"),
        );

    context.jobs.add_job(job)
}

/// Add the threat detection job that vets the agent output before the
/// dispatcher and the memory jobs act on it
pub async fn build_detection(context: &mut BuildContext<'_>, resolver: &mut ActionResolver) -> Result<()> {
    if !detection_enabled(context) {
        return Ok(());
    }
    let spec = context.spec;
    let detection = spec
        .safe_outputs
        .as_ref()
        .and_then(|config| config.threat_detection.clone())
        .unwrap_or_default();

    let download = resolver.pin(DOWNLOAD_ARTIFACT).await?;
    let github_script = resolver.pin(GITHUB_SCRIPT).await?;

    let mut job = JobNode::new(DETECTION_JOB)
        .needs(AGENT_JOB)
        .with_permissions(Permissions::default());
    job.runs_on = Some(DEFAULT_RUNS_ON.into());
    job.timeout_minutes = Some(DETECTION_TIMEOUT_MINUTES);

    let mut steps = vec![download_agent_output(&download, THREAT_DETECTION_DIR)];
    if context.needs_patch() {
        steps.push(download_artifact(
            "Download patch artifact",
            &download,
            AGENT_PATCH_ARTIFACT,
            THREAT_DETECTION_DIR,
        ));
    }

    let mut setup = script_step(
        "Setup threat detection",
        "setup_threat_detection",
        &github_script,
        "setup_threat_detection",
    )
    .with_env("GH_AW_WORKFLOW_NAME", spec.display_name());
    if let Some(prompt) = &detection.prompt {
        setup = setup.with_env("CUSTOM_PROMPT", prompt.clone());
    }
    steps.push(setup);

    let engine = spec.engine.clone().unwrap_or_default();
    steps.push(
        Step::run("Execute threat detection", engine_command(&engine).command)
            .with_id("detection_agentic_execution")
            .with_env("GH_AW_PROMPT", format!("{THREAT_DETECTION_DIR}prompt.txt")),
    );
    steps.extend(pin_steps(resolver, &detection.steps, DETECTION_JOB).await?);
    steps.push(script_step(
        "Parse threat detection results",
        "parse_results",
        &github_script,
        "parse_threat_detection_results",
    ));

    job.steps = steps;
    job = job.with_output("success", step_output("parse_results", "success"));

    context.jobs.add_job(job)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatcher_condition() {
        assert_eq!(
            dispatcher_condition(false),
            "(!cancelled()) && needs.agent.result != 'skipped'"
        );
        assert!(dispatcher_condition(true).ends_with("&& needs.detection.outputs.success == 'true'"));
    }
}
