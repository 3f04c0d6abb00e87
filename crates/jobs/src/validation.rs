//! Compile-time checks on custom jobs, memory configuration and emitted values

use crate::node::JobNode;
use awc_config::{CacheMemoryConfig, CustomJobConfig, JobSecrets, RepoMemoryConfig};
use awc_core::{Error, Result, DEFAULT_REPO_MEMORY_BRANCH_PREFIX};
use awc_utils::{check_lines_size, check_value_size};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static SECRET_EXPRESSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\$\{\{\s*secrets\.[A-Za-z_][A-Za-z0-9_]*(\s*\|\|\s*secrets\.[A-Za-z_][A-Za-z0-9_]*)*\s*\}\}$",
    )
    .expect("secret expression pattern is valid")
});

static BRANCH_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{4,32}$").expect("branch prefix pattern is valid"));

/// Validate a custom job declaration before it is turned into a node
pub fn validate_custom_job(id: &str, config: &CustomJobConfig) -> Result<()> {
    if config.steps.is_some() && config.uses.is_some() {
        return Err(Error::configuration(format!(
            "job '{id}' cannot have both 'steps' and 'uses'"
        )));
    }
    if config.uses.is_none() && (config.secrets.is_some() || !config.with.is_empty()) {
        return Err(Error::configuration(format!(
            "job '{id}' sets 'with' or 'secrets' without a reusable workflow in 'uses'"
        )));
    }
    if let Some(secrets) = &config.secrets {
        validate_secrets(id, secrets)?;
    }
    Ok(())
}

/// Secrets for a reusable workflow are either `inherit` or a map of secret
/// expressions
pub fn validate_secrets(job: &str, secrets: &JobSecrets) -> Result<()> {
    match secrets {
        JobSecrets::Keyword(keyword) if keyword == "inherit" => Ok(()),
        JobSecrets::Keyword(keyword) => Err(Error::configuration(format!(
            "job '{job}' has invalid secrets value '{keyword}': expected 'inherit' or a map"
        ))),
        JobSecrets::Map(map) => {
            for (name, value) in map {
                let valid = value
                    .as_str()
                    .is_some_and(|expression| SECRET_EXPRESSION.is_match(expression.trim()));
                if !valid {
                    return Err(Error::configuration(format!(
                        "job '{job}' secret '{name}' must be a secrets expression such as '${{{{ secrets.{name} }}}}', got {value}"
                    )));
                }
            }
            Ok(())
        }
    }
}

/// Memory branch prefixes are short identifiers and never `copilot`
pub fn validate_branch_prefix(prefix: &str) -> Result<()> {
    if !BRANCH_PREFIX.is_match(prefix) {
        return Err(Error::configuration(format!(
            "invalid repo-memory branch prefix '{prefix}': must be 4-32 characters of letters, digits, '-' or '_'"
        )));
    }
    if prefix.eq_ignore_ascii_case("copilot") {
        return Err(Error::configuration(
            "repo-memory branch prefix 'copilot' is reserved",
        ));
    }
    Ok(())
}

pub fn validate_repo_memory(config: &RepoMemoryConfig) -> Result<()> {
    unique_memory_ids("repo-memory", config.entries.iter().map(|entry| entry.id()))?;
    for entry in &config.entries {
        let prefix = entry
            .branch_prefix
            .as_deref()
            .unwrap_or(DEFAULT_REPO_MEMORY_BRANCH_PREFIX);
        validate_branch_prefix(prefix)?;
    }
    Ok(())
}

/// Cache-memory ids name restore and save keys, so they must be distinct
pub fn validate_cache_memory(config: &CacheMemoryConfig) -> Result<()> {
    unique_memory_ids("cache-memory", config.entries.iter().map(|entry| entry.id()))
}

fn unique_memory_ids<'a>(tool: &str, ids: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(Error::configuration(format!(
                "duplicate {tool} id '{id}': each entry needs a distinct id"
            )));
        }
    }
    Ok(())
}

/// Check every step env value, step input and run line of a job against the
/// platform ceiling
pub fn check_emitted_values(job: &JobNode) -> Result<()> {
    for (key, value) in &job.env {
        check_value_size(&format!("jobs.{}.env.{key}", job.id), value)?;
    }
    for step in &job.steps {
        let label = step.label();
        for (key, value) in &step.env {
            check_value_size(&format!("{key} (job '{}', step '{label}')", job.id), value)?;
        }
        for (key, value) in &step.with {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            for line in text.lines() {
                check_value_size(&format!("with.{key} (job '{}', step '{label}')", job.id), line)?;
            }
        }
        if let Some(script) = &step.run {
            check_lines_size(&format!("run (job '{}', step '{label}')", job.id), script)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use awc_config::Step;
    use awc_core::ErrorKind;

    fn job(yaml: &str) -> CustomJobConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_steps_and_uses_are_exclusive() {
        let config = job("uses: org/repo/.github/workflows/x.yml@main\nsteps:\n  - run: echo\n");
        let err = validate_custom_job("mixed", &config).unwrap_err();
        assert!(err.to_string().contains("cannot have both"));
    }

    #[test]
    fn test_secret_forms() {
        let inherit = job("uses: org/repo/.github/workflows/x.yml@main\nsecrets: inherit\n");
        assert!(validate_custom_job("deploy", &inherit).is_ok());

        let chained = job(
            "uses: org/repo/.github/workflows/x.yml@main\nsecrets:\n  token: ${{ secrets.A || secrets.B }}\n",
        );
        assert!(validate_custom_job("deploy", &chained).is_ok());
    }

    #[test]
    fn test_plaintext_secret_rejected() {
        let config = job("uses: org/repo/.github/workflows/x.yml@main\nsecrets:\n  token: hunter2\n");
        let err = validate_custom_job("deploy", &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        let message = err.to_string();
        assert!(message.contains("deploy"));
        assert!(message.contains("token"));
    }

    #[test]
    fn test_bad_keyword_rejected() {
        let config = job("uses: org/repo/.github/workflows/x.yml@main\nsecrets: everything\n");
        assert!(validate_custom_job("deploy", &config).is_err());
    }

    #[test]
    fn test_branch_prefix_rules() {
        assert!(validate_branch_prefix("memory").is_ok());
        assert!(validate_branch_prefix("agent_notes-2").is_ok());
        assert!(validate_branch_prefix("mem").is_err());
        assert!(validate_branch_prefix("has/slash").is_err());
        assert!(validate_branch_prefix(&"x".repeat(33)).is_err());
        assert!(validate_branch_prefix("copilot").is_err());
    }

    #[test]
    fn test_duplicate_repo_memory_ids() {
        let config: RepoMemoryConfig =
            serde_yaml::from_str("- id: notes\n- id: notes\n  branch-prefix: other\n").unwrap();
        let err = validate_repo_memory(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("'notes'"));

        // Two entries without an id both fall back to the default id
        let config: RepoMemoryConfig =
            serde_yaml::from_str("- branch-prefix: first\n- branch-prefix: second\n").unwrap();
        assert!(validate_repo_memory(&config).unwrap_err().to_string().contains("'default'"));

        let config: RepoMemoryConfig = serde_yaml::from_str("- id: notes\n- id: plans\n").unwrap();
        assert!(validate_repo_memory(&config).is_ok());
    }

    #[test]
    fn test_duplicate_cache_memory_ids() {
        let config: CacheMemoryConfig =
            serde_yaml::from_str("- id: scratch\n- id: scratch\n  restore-only: true\n").unwrap();
        let err = validate_cache_memory(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("cache-memory"));
        assert!(err.to_string().contains("'scratch'"));

        let config: CacheMemoryConfig = serde_yaml::from_str("- {}\n- id: scratch\n").unwrap();
        assert!(validate_cache_memory(&config).is_ok());
        assert!(validate_cache_memory(&CacheMemoryConfig::default()).is_ok());
    }

    #[test]
    fn test_run_lines_checked_individually() {
        let line = "x".repeat(21_000);
        let script = format!("{line}\n{line}");
        let node = JobNode::new("agent").with_steps(vec![Step::run("Long", script)]);
        assert!(check_emitted_values(&node).is_ok());

        let node = JobNode::new("agent").with_steps(vec![Step::run("Longer", "y".repeat(21_505))]);
        let err = check_emitted_values(&node).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SizeLimit);
        assert!(err.to_string().contains("line 1"));
    }
}
