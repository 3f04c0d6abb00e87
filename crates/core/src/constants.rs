/// Constants used throughout the awc codebase
// Standard job identifiers
pub const PRE_ACTIVATION_JOB: &str = "pre_activation";
pub const ACTIVATION_JOB: &str = "activation";
pub const AGENT_JOB: &str = "agent";
pub const SAFE_OUTPUTS_JOB: &str = "safe_outputs";
pub const DETECTION_JOB: &str = "detection";
pub const CONCLUSION_JOB: &str = "conclusion";
pub const PUSH_REPO_MEMORY_JOB: &str = "push_repo_memory";
pub const UPDATE_CACHE_MEMORY_JOB: &str = "update_cache_memory";

// Platform ceiling for any single emitted expression or environment value
pub const MAX_EMITTED_VALUE_BYTES: usize = 21 * 1024;

// Environment variable carrying the consolidated safe-output dispatch config
pub const SAFE_OUTPUTS_CONFIG_ENV: &str = "GH_AW_SAFE_OUTPUTS_HANDLER_CONFIG";
pub const SAFE_OUTPUTS_STAGED_ENV: &str = "GH_AW_SAFE_OUTPUTS_STAGED";
pub const AGENT_OUTPUT_ENV: &str = "GH_AW_AGENT_OUTPUT";

// Artifact names shared between the agent and downstream jobs
pub const AGENT_OUTPUT_ARTIFACT: &str = "agent-output";
pub const AGENT_PATCH_ARTIFACT: &str = "aw.patch";
pub const REPO_MEMORY_ARTIFACT_PREFIX: &str = "repo-memory-";
pub const CACHE_MEMORY_ARTIFACT_PREFIX: &str = "cache-memory-";

// Defaults
pub const DEFAULT_RUNS_ON: &str = "ubuntu-latest";
pub const DEFAULT_AGENT_TIMEOUT_MINUTES: u32 = 20;
pub const DEFAULT_MAX_PATCH_SIZE_KB: u32 = 1024;
pub const DEFAULT_ROLES: &[&str] = &["admin", "maintainer", "write"];
pub const DEFAULT_GITHUB_TOKEN: &str = "${{ secrets.GH_AW_GITHUB_TOKEN || secrets.GITHUB_TOKEN }}";
pub const DEFAULT_REPO_MEMORY_BRANCH_PREFIX: &str = "memory";

// Trigger events that cannot be initiated by an untrusted actor
pub const UNGATED_EVENTS: &[&str] = &["schedule", "workflow_run", "merge_group"];

// Action resolution
pub const ACTIONS_LOCK_FILE: &str = ".github/aw/actions-lock.json";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_RESOLVE_TIMEOUT_SECS: u64 = 10;
pub const GITHUB_TOKEN_VARS: &[&str] = &["GITHUB_TOKEN", "GH_TOKEN"];

// Logging
pub const AWC_LOG_VAR: &str = "AWC_LOG";
