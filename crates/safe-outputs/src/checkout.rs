//! Repository checkout shared by the kinds that push commits

use crate::kind::SafeOutputKind;
use crate::registry::DispatchConfig;
use awc_config::{SafeOutputsConfig, Step};
use awc_core::DEFAULT_GITHUB_TOKEN;

/// Token precedence: per-kind override, then the safe-outputs level
/// override, then the default secret chain
pub fn resolve_github_token(per_kind: Option<&str>, config: &SafeOutputsConfig) -> String {
    per_kind
        .filter(|token| !token.is_empty())
        .or_else(|| config.github_token.as_deref().filter(|t| !t.is_empty()))
        .unwrap_or(DEFAULT_GITHUB_TOKEN)
        .to_string()
}

fn per_kind_token(kind: SafeOutputKind, config: &SafeOutputsConfig) -> Option<&str> {
    match kind {
        SafeOutputKind::CreatePullRequest => config
            .create_pull_request
            .as_ref()
            .and_then(|k| k.common.github_token.as_deref()),
        SafeOutputKind::PushToPullRequestBranch => config
            .push_to_pull_request_branch
            .as_ref()
            .and_then(|k| k.common.github_token.as_deref()),
        _ => None,
    }
}

/// Condition matching any agent output of the given kinds
pub fn output_types_condition(kinds: &[SafeOutputKind]) -> String {
    kinds
        .iter()
        .map(|kind| format!("contains(needs.agent.outputs.output_types, '{}')", kind.key()))
        .collect::<Vec<_>>()
        .join(" || ")
}

const CONFIGURE_GIT_SCRIPT: &str = r#"git config --global user.email "github-actions[bot]@users.noreply.github.com"
git config --global user.name "github-actions[bot]"
SERVER_HOST="${SERVER_URL#https://}"
git remote set-url origin "https://x-access-token:${GIT_TOKEN}@${SERVER_HOST}/${REPO_NAME}.git"
echo "Git configured for ${REPO_NAME}""#;

/// Checkout and git credential steps for the dispatcher.
///
/// Emitted once no matter how many commit-pushing kinds are enabled, guarded
/// by a condition OR-ed over those kinds. The resolved token feeds both the
/// checkout and the git remote. Returns no steps when no such kind is on.
pub fn shared_checkout_steps(
    config: &SafeOutputsConfig,
    dispatch: &DispatchConfig,
    checkout_uses: &str,
) -> Vec<Step> {
    let kinds: Vec<SafeOutputKind> = dispatch
        .kinds()
        .iter()
        .copied()
        .filter(|kind| kind.needs_checkout())
        .collect();
    if kinds.is_empty() {
        return Vec::new();
    }

    let per_kind = kinds.iter().find_map(|kind| per_kind_token(*kind, config));
    let token = resolve_github_token(per_kind, config);
    let condition = output_types_condition(&kinds);

    vec![
        Step::uses("Checkout repository", checkout_uses)
            .with_condition(condition.clone())
            .with_input("token", token.clone())
            .with_input("persist-credentials", false)
            .with_input("fetch-depth", 1),
        Step::run("Configure Git credentials", CONFIGURE_GIT_SCRIPT)
            .with_condition(condition)
            .with_env("REPO_NAME", "${{ github.repository }}")
            .with_env("SERVER_URL", "${{ github.server_url }}")
            .with_env("GIT_TOKEN", token),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DispatchConfigBuilder;

    const CHECKOUT: &str = "actions/checkout@08c6903cd8c0fde910a37f88322edcfb5dd907a8";

    fn steps_for(yaml: &str) -> Vec<Step> {
        let config: SafeOutputsConfig = serde_yaml::from_str(yaml).unwrap();
        let dispatch = DispatchConfigBuilder::new().build(&config).unwrap();
        shared_checkout_steps(&config, &dispatch, CHECKOUT)
    }

    #[test]
    fn test_no_checkout_without_push_kinds() {
        assert!(steps_for("create-issue:\n").is_empty());
    }

    #[test]
    fn test_single_sequence_for_both_kinds() {
        let steps = steps_for("create-pull-request:\npush-to-pull-request-branch:\n");
        assert_eq!(steps.len(), 2);
        let condition = steps[0].condition.as_deref().unwrap();
        assert!(condition.contains("'create_pull_request'"));
        assert!(condition.contains("'push_to_pull_request_branch'"));
        assert!(condition.contains(" || "));
        assert_eq!(steps[0].uses.as_deref(), Some(CHECKOUT));
    }

    #[test]
    fn test_token_precedence() {
        let config: SafeOutputsConfig = serde_yaml::from_str("github-token: LEVEL\n").unwrap();
        assert_eq!(resolve_github_token(Some("KIND"), &config), "KIND");
        assert_eq!(resolve_github_token(None, &config), "LEVEL");
        assert_eq!(
            resolve_github_token(None, &SafeOutputsConfig::default()),
            DEFAULT_GITHUB_TOKEN
        );
    }

    #[test]
    fn test_same_token_for_checkout_and_remote() {
        let steps = steps_for(
            "github-token: LEVEL\npush-to-pull-request-branch:\n  github-token: ${{ secrets.PUSH }}\n",
        );
        assert_eq!(steps[0].with["token"], "${{ secrets.PUSH }}");
        assert_eq!(steps[1].env["GIT_TOKEN"], "${{ secrets.PUSH }}");
    }
}
