//! Per-kind option builders
//!
//! Each builder returns `None` when its kind is not configured and the kind's
//! options object otherwise. Builders never fail; options outside the schema
//! were already dropped while parsing.

use crate::kind::SafeOutputKind;
use crate::options::OptionsBuilder;
use crate::registry::KindBuilder;
use awc_config::{CloseEntityConfig, LabelsConfig, SafeOutputsConfig};
use awc_core::DEFAULT_MAX_PATCH_SIZE_KB;
use serde_json::{Map, Value};

type Options = Option<Map<String, Value>>;

/// Default pull request base: the ref the workflow was triggered on
pub const DEFAULT_BASE_BRANCH: &str = "${{ github.ref_name }}";

/// The registry in dispatch order
pub fn default_registry() -> Vec<(SafeOutputKind, KindBuilder)> {
    let registry: [(SafeOutputKind, KindBuilder); 27] = [
        (SafeOutputKind::CreateIssue, create_issue),
        (SafeOutputKind::AddComment, add_comment),
        (SafeOutputKind::CreateDiscussion, create_discussion),
        (SafeOutputKind::CloseIssue, close_issue),
        (SafeOutputKind::CloseDiscussion, close_discussion),
        (SafeOutputKind::ClosePullRequest, close_pull_request),
        (SafeOutputKind::CreatePullRequest, create_pull_request),
        (
            SafeOutputKind::CreatePullRequestReviewComment,
            create_pull_request_review_comment,
        ),
        (SafeOutputKind::SubmitPullRequestReview, submit_pull_request_review),
        (SafeOutputKind::UpdateIssue, update_issue),
        (SafeOutputKind::UpdatePullRequest, update_pull_request),
        (SafeOutputKind::UpdateDiscussion, update_discussion),
        (SafeOutputKind::UpdateRelease, update_release),
        (SafeOutputKind::PushToPullRequestBranch, push_to_pull_request_branch),
        (SafeOutputKind::AddLabels, add_labels),
        (SafeOutputKind::RemoveLabels, remove_labels),
        (SafeOutputKind::AddReviewer, add_reviewer),
        (SafeOutputKind::AssignMilestone, assign_milestone),
        (SafeOutputKind::AssignToUser, assign_to_user),
        (SafeOutputKind::HideComment, hide_comment),
        (SafeOutputKind::LinkSubIssue, link_sub_issue),
        (SafeOutputKind::UploadAsset, upload_asset),
        (SafeOutputKind::CreateCodeScanningAlert, create_code_scanning_alert),
        (SafeOutputKind::DispatchWorkflow, dispatch_workflow),
        (SafeOutputKind::MissingTool, missing_tool),
        (SafeOutputKind::MissingData, missing_data),
        (SafeOutputKind::Noop, noop),
    ];
    Vec::from(registry)
}

/// Patch ceiling in kilobytes; always written for kinds that push commits
fn max_patch_size(config: &SafeOutputsConfig) -> u32 {
    config
        .max_patch_size
        .filter(|size| *size > 0)
        .unwrap_or(DEFAULT_MAX_PATCH_SIZE_KB)
}

pub fn create_issue(config: &SafeOutputsConfig) -> Options {
    let kind = config.create_issue.as_ref()?;
    Some(
        OptionsBuilder::new()
            .common(&kind.common)
            .string("title_prefix", kind.title_prefix.as_deref())
            .list("labels", &kind.labels)
            .list("assignees", &kind.assignees)
            .positive("expires", kind.expires)
            .footer(kind.common.footer, config.footer)
            .build(),
    )
}

pub fn add_comment(config: &SafeOutputsConfig) -> Options {
    let kind = config.add_comment.as_ref()?;
    Some(
        OptionsBuilder::new()
            .common(&kind.common)
            .flag("hide_older_comments", kind.hide_older_comments)
            .optional_bool("discussion", kind.discussion)
            .footer(kind.common.footer, config.footer)
            .build(),
    )
}

pub fn create_discussion(config: &SafeOutputsConfig) -> Options {
    let kind = config.create_discussion.as_ref()?;
    Some(
        OptionsBuilder::new()
            .common(&kind.common)
            .string("title_prefix", kind.title_prefix.as_deref())
            .string("category", kind.category.as_deref())
            .list("labels", &kind.labels)
            .positive("expires", kind.expires)
            .footer(kind.common.footer, config.footer)
            .build(),
    )
}

fn close_entity(kind: &CloseEntityConfig, config: &SafeOutputsConfig) -> Map<String, Value> {
    OptionsBuilder::new()
        .common(&kind.common)
        .list("required_labels", &kind.required_labels)
        .string("required_title_prefix", kind.required_title_prefix.as_deref())
        .footer(kind.common.footer, config.footer)
        .build()
}

pub fn close_issue(config: &SafeOutputsConfig) -> Options {
    Some(close_entity(config.close_issue.as_ref()?, config))
}

pub fn close_discussion(config: &SafeOutputsConfig) -> Options {
    Some(close_entity(config.close_discussion.as_ref()?, config))
}

pub fn close_pull_request(config: &SafeOutputsConfig) -> Options {
    Some(close_entity(config.close_pull_request.as_ref()?, config))
}

pub fn create_pull_request(config: &SafeOutputsConfig) -> Options {
    let kind = config.create_pull_request.as_ref()?;
    let base_branch = kind
        .base_branch
        .as_deref()
        .filter(|branch| !branch.is_empty())
        .unwrap_or(DEFAULT_BASE_BRANCH);
    Some(
        OptionsBuilder::new()
            .common(&kind.common)
            .string("title_prefix", kind.title_prefix.as_deref())
            .list("labels", &kind.labels)
            .list("reviewers", &kind.reviewers)
            .optional_bool("draft", kind.draft)
            .always("base_branch", base_branch)
            .string("if_no_changes", kind.if_no_changes.as_deref())
            .flag("allow_empty", kind.allow_empty)
            .flag("auto_merge", kind.auto_merge)
            .positive("expires", kind.expires)
            .always("max_patch_size", max_patch_size(config))
            .footer(kind.common.footer, config.footer)
            .build(),
    )
}

pub fn create_pull_request_review_comment(config: &SafeOutputsConfig) -> Options {
    let kind = config.create_pull_request_review_comment.as_ref()?;
    Some(
        OptionsBuilder::new()
            .common(&kind.common)
            .string("side", kind.side.as_deref())
            .build(),
    )
}

pub fn submit_pull_request_review(config: &SafeOutputsConfig) -> Options {
    let kind = config.submit_pull_request_review.as_ref()?;
    Some(
        OptionsBuilder::new()
            .common(&kind.common)
            .footer(kind.common.footer, config.footer)
            .build(),
    )
}

pub fn update_issue(config: &SafeOutputsConfig) -> Options {
    let kind = config.update_issue.as_ref()?;
    Some(
        OptionsBuilder::new()
            .common(&kind.common)
            .flag("allow_status", kind.status.is_supplied())
            .flag("allow_title", kind.title.is_supplied())
            .flag("allow_body", kind.body.is_supplied())
            .footer(kind.common.footer, config.footer)
            .build(),
    )
}

pub fn update_pull_request(config: &SafeOutputsConfig) -> Options {
    let kind = config.update_pull_request.as_ref()?;
    Some(
        OptionsBuilder::new()
            .common(&kind.common)
            .flag("allow_title", kind.title.is_supplied())
            .flag("allow_body", kind.body.is_supplied())
            .footer(kind.common.footer, config.footer)
            .build(),
    )
}

pub fn update_discussion(config: &SafeOutputsConfig) -> Options {
    let kind = config.update_discussion.as_ref()?;
    Some(
        OptionsBuilder::new()
            .common(&kind.common)
            .flag("allow_title", kind.title.is_supplied())
            .flag("allow_body", kind.body.is_supplied())
            .flag("allow_labels", kind.labels.is_supplied())
            .list("allowed_labels", &kind.allowed_labels)
            .footer(kind.common.footer, config.footer)
            .build(),
    )
}

pub fn update_release(config: &SafeOutputsConfig) -> Options {
    let kind = config.update_release.as_ref()?;
    Some(
        OptionsBuilder::new()
            .common(&kind.common)
            .flag("allow_body", kind.body.is_supplied())
            .footer(kind.common.footer, config.footer)
            .build(),
    )
}

pub fn push_to_pull_request_branch(config: &SafeOutputsConfig) -> Options {
    let kind = config.push_to_pull_request_branch.as_ref()?;
    Some(
        OptionsBuilder::new()
            .common(&kind.common)
            .string("title_prefix", kind.title_prefix.as_deref())
            .list("labels", &kind.labels)
            .string("if_no_changes", kind.if_no_changes.as_deref())
            .string("commit_title_suffix", kind.commit_title_suffix.as_deref())
            .always("max_patch_size", max_patch_size(config))
            .build(),
    )
}

fn labels(kind: &LabelsConfig) -> Map<String, Value> {
    OptionsBuilder::new()
        .list("allowed", &kind.allowed)
        .common(&kind.common)
        .build()
}

pub fn add_labels(config: &SafeOutputsConfig) -> Options {
    Some(labels(config.add_labels.as_ref()?))
}

pub fn remove_labels(config: &SafeOutputsConfig) -> Options {
    Some(labels(config.remove_labels.as_ref()?))
}

pub fn add_reviewer(config: &SafeOutputsConfig) -> Options {
    let kind = config.add_reviewer.as_ref()?;
    Some(
        OptionsBuilder::new()
            .list("reviewers", &kind.reviewers)
            .common(&kind.common)
            .build(),
    )
}

pub fn assign_milestone(config: &SafeOutputsConfig) -> Options {
    let kind = config.assign_milestone.as_ref()?;
    Some(
        OptionsBuilder::new()
            .list("allowed", &kind.allowed)
            .common(&kind.common)
            .build(),
    )
}

pub fn assign_to_user(config: &SafeOutputsConfig) -> Options {
    let kind = config.assign_to_user.as_ref()?;
    Some(
        OptionsBuilder::new()
            .list("allowed", &kind.allowed)
            .common(&kind.common)
            .build(),
    )
}

pub fn hide_comment(config: &SafeOutputsConfig) -> Options {
    let kind = config.hide_comment.as_ref()?;
    Some(
        OptionsBuilder::new()
            .common(&kind.common)
            .list("allowed_reasons", &kind.allowed_reasons)
            .build(),
    )
}

pub fn link_sub_issue(config: &SafeOutputsConfig) -> Options {
    let kind = config.link_sub_issue.as_ref()?;
    Some(
        OptionsBuilder::new()
            .common(&kind.common)
            .list("parent_required_labels", &kind.parent_required_labels)
            .string("parent_title_prefix", kind.parent_title_prefix.as_deref())
            .list("sub_required_labels", &kind.sub_required_labels)
            .string("sub_title_prefix", kind.sub_title_prefix.as_deref())
            .build(),
    )
}

pub fn upload_asset(config: &SafeOutputsConfig) -> Options {
    let kind = config.upload_asset.as_ref()?;
    Some(
        OptionsBuilder::new()
            .common(&kind.common)
            .string("branch", kind.branch.as_deref())
            .positive("max_size", kind.max_size)
            .list("allowed_exts", &kind.allowed_exts)
            .build(),
    )
}

pub fn create_code_scanning_alert(config: &SafeOutputsConfig) -> Options {
    let kind = config.create_code_scanning_alert.as_ref()?;
    Some(
        OptionsBuilder::new()
            .common(&kind.common)
            .string("driver", kind.driver.as_deref())
            .build(),
    )
}

pub fn dispatch_workflow(config: &SafeOutputsConfig) -> Options {
    let kind = config.dispatch_workflow.as_ref()?;
    Some(
        OptionsBuilder::new()
            .common(&kind.common)
            .list("workflows", &kind.workflows)
            .build(),
    )
}

pub fn missing_tool(config: &SafeOutputsConfig) -> Options {
    let kind = config.missing_tool.as_ref()?;
    Some(OptionsBuilder::new().common(&kind.common).build())
}

pub fn missing_data(config: &SafeOutputsConfig) -> Options {
    let kind = config.missing_data.as_ref()?;
    Some(OptionsBuilder::new().common(&kind.common).build())
}

pub fn noop(config: &SafeOutputsConfig) -> Options {
    let kind = config.noop.as_ref()?;
    Some(OptionsBuilder::new().common(&kind.common).build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(yaml: &str) -> SafeOutputsConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_unconfigured_kind_is_none() {
        let config = parse("create-issue:\n");
        assert!(create_issue(&config).is_some());
        assert!(add_comment(&config).is_none());
        assert!(noop(&config).is_none());
    }

    #[test]
    fn test_create_pull_request_defaults() {
        let options = create_pull_request(&parse("create-pull-request:\n")).unwrap();
        assert_eq!(
            Value::Object(options),
            json!({
                "base_branch": "${{ github.ref_name }}",
                "max_patch_size": 1024
            })
        );
    }

    #[test]
    fn test_workflow_patch_size_and_base_branch() {
        let config = parse(
            "max-patch-size: 2048\ncreate-pull-request:\n  base-branch: develop\npush-to-pull-request-branch:\n",
        );
        let pr = create_pull_request(&config).unwrap();
        assert_eq!(pr["base_branch"], "develop");
        assert_eq!(pr["max_patch_size"], 2048);
        let push = push_to_pull_request_branch(&config).unwrap();
        assert_eq!(push["max_patch_size"], 2048);
    }

    #[test]
    fn test_update_issue_presence_flags() {
        let options = update_issue(&parse("update-issue:\n  status:\n  body: false\n")).unwrap();
        assert_eq!(
            Value::Object(options),
            json!({"allow_status": true, "allow_body": true})
        );
    }

    #[test]
    fn test_update_discussion_labels_flag() {
        let options = update_discussion(&parse(
            "update-discussion:\n  labels:\n  allowed-labels: [faq]\n",
        ))
        .unwrap();
        assert_eq!(options["allow_labels"], true);
        assert_eq!(options["allowed_labels"], json!(["faq"]));
        assert!(!options.contains_key("allow_title"));
    }

    #[test]
    fn test_footer_override_chain() {
        let config = parse("footer: false\ncreate-issue:\nadd-comment:\n  footer: true\n");
        assert_eq!(create_issue(&config).unwrap()["footer"], false);
        assert!(!add_comment(&config).unwrap().contains_key("footer"));
    }

    #[test]
    fn test_add_labels_empty_block_is_empty_map() {
        let options = add_labels(&parse("add-labels:\n")).unwrap();
        assert!(options.is_empty());
    }

    #[test]
    fn test_registry_covers_every_kind_once() {
        let registry = default_registry();
        assert_eq!(registry.len(), 27);
        let mut keys: Vec<_> = registry.iter().map(|(kind, _)| kind.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), 27);
    }
}
