//! Main agent job

use super::actions::{
    download_artifact, script_step, step_output, upload_artifact, CACHE_RESTORE, CHECKOUT,
    GITHUB_SCRIPT, SCRATCH_DIR, SETUP_NODE, UPLOAD_ARTIFACT,
};
use super::memory::{cache_key, cache_memory_dir, memory_branch, repo_memory_dir};
use super::{pin_steps, BuildContext};
use crate::node::JobNode;
use awc_actions::ActionResolver;
use awc_config::{EngineConfig, Permissions, Step, WorkflowSpec};
use awc_core::{
    Result, ACTIVATION_JOB, AGENT_JOB, AGENT_OUTPUT_ARTIFACT, AGENT_OUTPUT_ENV,
    AGENT_PATCH_ARTIFACT, CACHE_MEMORY_ARTIFACT_PREFIX, DEFAULT_AGENT_TIMEOUT_MINUTES,
    DEFAULT_GITHUB_TOKEN, DEFAULT_RUNS_ON, REPO_MEMORY_ARTIFACT_PREFIX,
};

pub const PROMPT_PATH: &str = "/tmp/gh-aw/aw-prompts/prompt.txt";
pub const AGENT_OUTPUT_PATH: &str = "/tmp/gh-aw/agent-output.json";
pub const PATCH_PATH: &str = "/tmp/gh-aw/aw.patch";
const SAFE_OUTPUTS_FILE: &str = "/tmp/gh-aw/safeoutputs/outputs.jsonl";
const NODE_VERSION: &str = "24";

/// npm package and command line for an engine
pub struct EngineCommand {
    pub package: Option<&'static str>,
    pub command: String,
}

/// Command line that runs the engine against the prompt file
pub fn engine_command(engine: &EngineConfig) -> EngineCommand {
    let mut args: Vec<String> = Vec::new();
    let (package, program) = match engine.id.as_str() {
        "copilot" => {
            args.push(format!("--add-dir {SCRATCH_DIR}/"));
            args.push("--log-dir /tmp/gh-aw/logs/".to_string());
            (Some("@github/copilot"), "copilot")
        }
        "claude" => {
            args.push("--print".to_string());
            args.push("--output-format stream-json".to_string());
            if let Some(turns) = engine.max_turns {
                args.push(format!("--max-turns {turns}"));
            }
            (Some("@anthropic-ai/claude-code"), "claude")
        }
        "codex" => {
            args.push("exec".to_string());
            args.push("--full-auto".to_string());
            (Some("@openai/codex"), "codex")
        }
        other => (None, other),
    };
    if let Some(model) = &engine.model {
        args.push(format!("--model {model}"));
    }
    let prompt = if engine.id == "copilot" {
        "--prompt \"$(cat \"$GH_AW_PROMPT\")\""
    } else {
        "\"$(cat \"$GH_AW_PROMPT\")\""
    };
    args.push(prompt.to_string());

    EngineCommand {
        package,
        command: format!("{program} {}", args.join(" ")),
    }
}

/// Heredoc writing the markdown body to the prompt file
fn prompt_script(markdown: &str) -> String {
    format!(
        "mkdir -p \"$(dirname \"$GH_AW_PROMPT\")\"\ncat > \"$GH_AW_PROMPT\" << 'GH_AW_PROMPT_EOF'\n{}\nGH_AW_PROMPT_EOF",
        markdown.trim_end()
    )
}

async fn memory_restore_steps(spec: &WorkflowSpec, resolver: &mut ActionResolver) -> Result<Vec<Step>> {
    let mut steps = Vec::new();

    if let Some(repo_memory) = &spec.tools.repo_memory {
        let checkout = resolver.pin(CHECKOUT).await?;
        for entry in &repo_memory.entries {
            let mut step = Step::uses(format!("Clone repo-memory branch ({})", entry.id()), checkout.as_str())
                .with_input("ref", memory_branch(entry))
                .with_input("path", repo_memory_dir(entry.id()))
                .with_input("token", DEFAULT_GITHUB_TOKEN)
                .with_input("persist-credentials", false);
            if let Some(repo) = &entry.target_repo {
                step = step.with_input("repository", repo.clone());
            }
            step.extra
                .insert("continue-on-error".to_string(), serde_json::Value::Bool(true));
            steps.push(step);
        }
    }

    if let Some(cache_memory) = &spec.tools.cache_memory {
        let restore = resolver.pin(CACHE_RESTORE).await?;
        for entry in &cache_memory.entries {
            let (key, restore_prefix) = cache_key(entry);
            steps.push(
                Step::uses(format!("Restore cache-memory ({})", entry.id()), restore.as_str())
                    .with_input("key", key)
                    .with_input("path", cache_memory_dir(entry.id()))
                    .with_input("restore-keys", restore_prefix),
            );
        }
    }

    Ok(steps)
}

fn memory_upload_steps(spec: &WorkflowSpec, upload: &str) -> Vec<Step> {
    let mut steps = Vec::new();
    if let Some(repo_memory) = &spec.tools.repo_memory {
        for entry in &repo_memory.entries {
            steps.push(
                upload_artifact(
                    &format!("Upload repo-memory ({})", entry.id()),
                    upload,
                    &format!("{REPO_MEMORY_ARTIFACT_PREFIX}{}", entry.id()),
                    &repo_memory_dir(entry.id()),
                )
                .with_condition("always()"),
            );
        }
    }
    if let Some(cache_memory) = &spec.tools.cache_memory {
        for entry in cache_memory.persisted_entries() {
            let mut step = upload_artifact(
                &format!("Upload cache-memory ({})", entry.id()),
                upload,
                &format!("{CACHE_MEMORY_ARTIFACT_PREFIX}{}", entry.id()),
                &cache_memory_dir(entry.id()),
            )
            .with_condition("always()");
            if let Some(days) = entry.retention_days {
                step = step.with_input("retention-days", days);
            }
            steps.push(step);
        }
    }
    steps
}

/// Add the agent job.
///
/// Runs after activation with the workflow's own permissions; collects the
/// agent's proposed actions into an artifact for the downstream jobs.
pub async fn build(context: &mut BuildContext<'_>, resolver: &mut ActionResolver) -> Result<()> {
    let spec = context.spec;
    let engine = spec.engine.clone().unwrap_or_default();
    let checkout = resolver.pin(CHECKOUT).await?;
    let github_script = resolver.pin(GITHUB_SCRIPT).await?;
    let upload = resolver.pin(UPLOAD_ARTIFACT).await?;

    let mut job = JobNode::new(AGENT_JOB).needs(ACTIVATION_JOB);
    job.runs_on = Some(
        spec.runs_on
            .clone()
            .unwrap_or_else(|| DEFAULT_RUNS_ON.into()),
    );
    job.timeout_minutes = Some(spec.timeout_minutes.unwrap_or(DEFAULT_AGENT_TIMEOUT_MINUTES));
    job.concurrency = spec.concurrency.clone();
    job.permissions = Some(
        spec.permissions
            .clone()
            .unwrap_or_else(|| Permissions::scopes(&[("contents", "read")])),
    );
    job.env = spec.env.clone();
    job.env
        .insert("GH_AW_PROMPT".to_string(), PROMPT_PATH.to_string());
    if context.dispatch.is_some() {
        job.env
            .insert("GH_AW_SAFE_OUTPUTS".to_string(), SAFE_OUTPUTS_FILE.to_string());
    }

    let mut steps = vec![Step::uses("Checkout repository", checkout)
        .with_input("persist-credentials", false)];
    steps.extend(pin_steps(resolver, &spec.steps, AGENT_JOB).await?);
    steps.extend(memory_restore_steps(spec, resolver).await?);

    let command = engine_command(&engine);
    steps.push(Step::run("Create prompt", prompt_script(&spec.markdown)));
    if let Some(package) = command.package {
        let version = engine.version.as_deref().unwrap_or("latest");
        let setup_node = resolver.pin(SETUP_NODE).await?;
        steps.push(Step::uses("Setup Node.js", setup_node).with_input("node-version", NODE_VERSION));
        steps.push(Step::run(
            format!("Install {} CLI", engine.id),
            format!("npm install -g {package}@{version}"),
        ));
    }
    let mut execute = Step::run(format!("Execute {} agent", engine.id), command.command)
        .with_id("agentic_execution")
        .with_env("GITHUB_TOKEN", DEFAULT_GITHUB_TOKEN);
    if !spec.tools.other.is_empty() {
        let tools = serde_json::to_string(&spec.tools.other)?;
        execute = execute.with_env("GH_AW_TOOLS", tools);
    }
    steps.push(execute);

    let mut collect = script_step("Collect agent output", "collect_output", &github_script, "collect_output")
        .with_env(AGENT_OUTPUT_ENV, AGENT_OUTPUT_PATH);
    if let Some(dispatch) = &context.dispatch {
        let allowed: Vec<&str> = dispatch.kinds().iter().map(|kind| kind.key()).collect();
        collect = collect.with_env("GH_AW_ALLOWED_OUTPUTS", allowed.join(","));
    }
    collect = collect.with_condition("always()");
    steps.push(collect);

    steps.push(
        upload_artifact("Upload agent output", &upload, AGENT_OUTPUT_ARTIFACT, AGENT_OUTPUT_PATH)
            .with_condition("always()"),
    );
    if context.needs_patch() {
        steps.push(
            Step::run(
                "Generate git patch",
                format!("git add -A\ngit diff --cached --binary > {PATCH_PATH} || true"),
            )
            .with_condition("always()"),
        );
        steps.push(
            upload_artifact("Upload git patch", &upload, AGENT_PATCH_ARTIFACT, PATCH_PATH)
                .with_condition("always()"),
        );
    }
    steps.extend(memory_upload_steps(spec, &upload));

    job.steps = steps;
    job = job
        .with_output("output", step_output("collect_output", "output"))
        .with_output("output_types", step_output("collect_output", "output_types"))
        .with_output("has_patch", step_output("collect_output", "has_patch"));

    context.jobs.add_job(job)
}

/// Download the agent output artifact into `path`
pub fn download_agent_output(uses: &str, path: &str) -> Step {
    download_artifact("Download agent output artifact", uses, AGENT_OUTPUT_ARTIFACT, path)
}
