//! Memory persistence jobs
//!
//! The agent job only reads memory and uploads what it wrote as artifacts.
//! Writing back happens in these separate jobs, after threat detection has
//! passed when detection is enabled.

use super::actions::{download_artifact, script_step, CACHE_SAVE, CHECKOUT, DOWNLOAD_ARTIFACT, GITHUB_SCRIPT};
use super::BuildContext;
use crate::node::JobNode;
use awc_actions::ActionResolver;
use awc_config::{CacheMemoryEntry, Permissions, RepoMemoryEntry, Step};
use awc_core::{
    Result, AGENT_JOB, CACHE_MEMORY_ARTIFACT_PREFIX, CONCLUSION_JOB, DEFAULT_GITHUB_TOKEN,
    DEFAULT_REPO_MEMORY_BRANCH_PREFIX, DEFAULT_RUNS_ON, DETECTION_JOB, PUSH_REPO_MEMORY_JOB,
    REPO_MEMORY_ARTIFACT_PREFIX, UPDATE_CACHE_MEMORY_JOB,
};
use tracing::debug;

const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024;
const DEFAULT_MAX_FILE_COUNT: u32 = 100;

pub fn repo_memory_dir(id: &str) -> String {
    format!("/tmp/gh-aw/repo-memory/{id}")
}

pub fn cache_memory_dir(id: &str) -> String {
    format!("/tmp/gh-aw/cache-memory/{id}")
}

/// Branch holding a repo-memory entry: `<prefix>/<id>`
pub fn memory_branch(entry: &RepoMemoryEntry) -> String {
    let prefix = entry
        .branch_prefix
        .as_deref()
        .unwrap_or(DEFAULT_REPO_MEMORY_BRANCH_PREFIX);
    format!("{prefix}/{}", entry.id())
}

/// Cache key for this run and the prefix that restores the latest earlier run
pub fn cache_key(entry: &CacheMemoryEntry) -> (String, String) {
    let base = entry
        .key
        .clone()
        .unwrap_or_else(|| format!("memory-{}-${{{{ github.workflow }}}}", entry.id()));
    (format!("{base}-${{{{ github.run_id }}}}"), format!("{base}-"))
}

/// Dependencies and run condition shared by both persistence jobs
fn persistence_job(id: &str, detection: bool) -> JobNode {
    let mut job = JobNode::new(id).needs(AGENT_JOB);
    job.runs_on = Some(DEFAULT_RUNS_ON.into());
    if detection {
        job.needs.insert(DETECTION_JOB.to_string());
        job.condition = Some(format!(
            "always() && needs.{AGENT_JOB}.result != 'skipped' && needs.{DETECTION_JOB}.outputs.success == 'true'"
        ));
    } else {
        job.condition = Some(format!("always() && needs.{AGENT_JOB}.result != 'skipped'"));
    }
    job
}

async fn push_repo_memory(
    entries: &[RepoMemoryEntry],
    detection: bool,
    resolver: &mut ActionResolver,
) -> Result<JobNode> {
    let checkout = resolver.pin(CHECKOUT).await?;
    let download = resolver.pin(DOWNLOAD_ARTIFACT).await?;
    let github_script = resolver.pin(GITHUB_SCRIPT).await?;

    let mut steps = vec![Step::uses("Checkout repository", checkout)
        .with_input("persist-credentials", false)
        .with_input("sparse-checkout", ".")];

    for entry in entries {
        let id = entry.id();
        let dir = repo_memory_dir(id);
        steps.push(download_artifact(
            &format!("Download repo-memory artifact ({id})"),
            &download,
            &format!("{REPO_MEMORY_ARTIFACT_PREFIX}{id}"),
            &dir,
        ));

        let mut push = script_step(
            &format!("Push repo-memory changes ({id})"),
            &format!("push_repo_memory_{}", id.replace('-', "_")),
            &github_script,
            "push_repo_memory",
        )
        .with_env("ARTIFACT_DIR", dir)
        .with_env("MEMORY_ID", id)
        .with_env("BRANCH_NAME", memory_branch(entry))
        .with_env(
            "TARGET_REPO",
            entry
                .target_repo
                .clone()
                .unwrap_or_else(|| "${{ github.repository }}".to_string()),
        )
        .with_env(
            "MAX_FILE_SIZE",
            entry.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE).to_string(),
        )
        .with_env(
            "MAX_FILE_COUNT",
            entry.max_file_count.unwrap_or(DEFAULT_MAX_FILE_COUNT).to_string(),
        )
        .with_env("GH_TOKEN", DEFAULT_GITHUB_TOKEN);
        if !entry.file_glob.is_empty() {
            push = push.with_env("FILE_GLOB_FILTER", entry.file_glob.join(" "));
        }
        steps.push(push);
    }

    Ok(persistence_job(PUSH_REPO_MEMORY_JOB, detection)
        .with_permissions(Permissions::scopes(&[("contents", "write")]))
        .with_steps(steps))
}

async fn update_cache_memory(
    entries: &[&CacheMemoryEntry],
    detection: bool,
    resolver: &mut ActionResolver,
) -> Result<JobNode> {
    let download = resolver.pin(DOWNLOAD_ARTIFACT).await?;
    let save = resolver.pin(CACHE_SAVE).await?;

    let mut steps = Vec::with_capacity(entries.len() * 2);
    for entry in entries {
        let id = entry.id();
        let dir = cache_memory_dir(id);
        let (key, _) = cache_key(entry);
        steps.push(download_artifact(
            &format!("Download cache-memory artifact ({id})"),
            &download,
            &format!("{CACHE_MEMORY_ARTIFACT_PREFIX}{id}"),
            &dir,
        ));
        steps.push(
            Step::uses(format!("Save cache-memory ({id})"), save.as_str())
                .with_input("key", key)
                .with_input("path", dir),
        );
    }

    Ok(persistence_job(UPDATE_CACHE_MEMORY_JOB, detection)
        .with_permissions(Permissions::scopes(&[("contents", "read")]))
        .with_steps(steps))
}

/// Add the memory persistence jobs and make conclusion wait for them.
///
/// Cache-memory entries marked restore-only are never saved, so a
/// configuration with only such entries creates no cache job.
pub async fn build(context: &mut BuildContext<'_>, resolver: &mut ActionResolver) -> Result<()> {
    let spec = context.spec;
    let detection = context.has_job(DETECTION_JOB);
    let mut created = Vec::new();

    if let Some(repo_memory) = spec.tools.repo_memory.as_ref().filter(|c| !c.entries.is_empty()) {
        let job = push_repo_memory(&repo_memory.entries, detection, resolver).await?;
        context.jobs.add_job(job)?;
        created.push(PUSH_REPO_MEMORY_JOB);
    }

    if let Some(cache_memory) = &spec.tools.cache_memory {
        let persisted: Vec<&CacheMemoryEntry> = cache_memory.persisted_entries().collect();
        if persisted.is_empty() {
            debug!("cache-memory is restore-only, skipping update job");
        } else {
            let job = update_cache_memory(&persisted, detection, resolver).await?;
            context.jobs.add_job(job)?;
            created.push(UPDATE_CACHE_MEMORY_JOB);
        }
    }

    if let Some(conclusion) = context.jobs.get_job_mut(CONCLUSION_JOB) {
        for id in created {
            conclusion.needs.insert(id.to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_branch() {
        let entry = RepoMemoryEntry::default();
        assert_eq!(memory_branch(&entry), "memory/default");

        let custom = RepoMemoryEntry {
            id: Some("notes".into()),
            branch_prefix: Some("agent-state".into()),
            ..Default::default()
        };
        assert_eq!(memory_branch(&custom), "agent-state/notes");
    }

    #[test]
    fn test_cache_keys() {
        let (key, restore) = cache_key(&CacheMemoryEntry::default());
        assert_eq!(key, "memory-default-${{ github.workflow }}-${{ github.run_id }}");
        assert_eq!(restore, "memory-default-${{ github.workflow }}-");

        let custom = CacheMemoryEntry {
            key: Some("triage".into()),
            ..Default::default()
        };
        assert_eq!(cache_key(&custom).0, "triage-${{ github.run_id }}");
    }

    #[test]
    fn test_detection_gates_persistence() {
        let job = persistence_job(PUSH_REPO_MEMORY_JOB, true);
        assert!(job.depends_on(DETECTION_JOB));
        assert!(job
            .condition
            .as_deref()
            .unwrap()
            .contains("needs.detection.outputs.success == 'true'"));

        let job = persistence_job(UPDATE_CACHE_MEMORY_JOB, false);
        assert!(!job.depends_on(DETECTION_JOB));
    }
}
