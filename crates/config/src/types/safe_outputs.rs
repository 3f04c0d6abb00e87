//! Safe-output configuration (`safe-outputs:`)
//!
//! Every kind is an optional block. A key written with no value
//! (`create-issue:`) enables the kind with default options.

use super::{deserialize_block, deserialize_string_map, FieldOverride, Step};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

/// Options shared by every kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KindCommon {
    /// Maximum number of operations of this kind per run
    #[serde(default)]
    pub max: Option<u32>,
    /// Token override for this kind only
    #[serde(default)]
    pub github_token: Option<String>,
    /// `triggering`, `*`, or an explicit number
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub target_repo: Option<String>,
    #[serde(default)]
    pub allowed_repos: Vec<String>,
    /// Attribution footer override; falls back to the workflow-wide value
    #[serde(default)]
    pub footer: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CreateIssueConfig {
    #[serde(flatten)]
    pub common: KindCommon,
    #[serde(default)]
    pub title_prefix: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub assignees: Vec<String>,
    /// Close automatically after this many days
    #[serde(default)]
    pub expires: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AddCommentConfig {
    #[serde(flatten)]
    pub common: KindCommon,
    #[serde(default)]
    pub hide_older_comments: bool,
    #[serde(default)]
    pub discussion: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CreateDiscussionConfig {
    #[serde(flatten)]
    pub common: KindCommon,
    #[serde(default)]
    pub title_prefix: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub expires: Option<u32>,
}

/// Shared by close-issue, close-discussion and close-pull-request
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CloseEntityConfig {
    #[serde(flatten)]
    pub common: KindCommon,
    #[serde(default)]
    pub required_labels: Vec<String>,
    #[serde(default)]
    pub required_title_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CreatePullRequestConfig {
    #[serde(flatten)]
    pub common: KindCommon,
    #[serde(default)]
    pub title_prefix: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub reviewers: Vec<String>,
    #[serde(default)]
    pub draft: Option<bool>,
    #[serde(default)]
    pub base_branch: Option<String>,
    /// `warn`, `error` or `ignore`
    #[serde(default)]
    pub if_no_changes: Option<String>,
    #[serde(default)]
    pub allow_empty: bool,
    #[serde(default)]
    pub auto_merge: bool,
    #[serde(default)]
    pub expires: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReviewCommentConfig {
    #[serde(flatten)]
    pub common: KindCommon,
    /// `LEFT` or `RIGHT`
    #[serde(default)]
    pub side: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SubmitReviewConfig {
    #[serde(flatten)]
    pub common: KindCommon,
}

/// Writing `status`, `title` or `body` (with any value, even none) allows the
/// agent to change that field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdateIssueConfig {
    #[serde(flatten)]
    pub common: KindCommon,
    #[serde(default)]
    pub status: FieldOverride<bool>,
    #[serde(default)]
    pub title: FieldOverride<bool>,
    #[serde(default)]
    pub body: FieldOverride<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdatePullRequestConfig {
    #[serde(flatten)]
    pub common: KindCommon,
    #[serde(default)]
    pub title: FieldOverride<bool>,
    #[serde(default)]
    pub body: FieldOverride<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdateDiscussionConfig {
    #[serde(flatten)]
    pub common: KindCommon,
    #[serde(default)]
    pub title: FieldOverride<bool>,
    #[serde(default)]
    pub body: FieldOverride<bool>,
    #[serde(default)]
    pub labels: FieldOverride<bool>,
    #[serde(default)]
    pub allowed_labels: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdateReleaseConfig {
    #[serde(flatten)]
    pub common: KindCommon,
    #[serde(default)]
    pub body: FieldOverride<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PushToPrBranchConfig {
    #[serde(flatten)]
    pub common: KindCommon,
    #[serde(default)]
    pub title_prefix: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub if_no_changes: Option<String>,
    #[serde(default)]
    pub commit_title_suffix: Option<String>,
}

/// add-labels and remove-labels
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LabelsConfig {
    #[serde(flatten)]
    pub common: KindCommon,
    #[serde(default)]
    pub allowed: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AddReviewerConfig {
    #[serde(flatten)]
    pub common: KindCommon,
    #[serde(default)]
    pub reviewers: Vec<String>,
}

/// assign-milestone and assign-to-user
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AllowListConfig {
    #[serde(flatten)]
    pub common: KindCommon,
    #[serde(default)]
    pub allowed: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HideCommentConfig {
    #[serde(flatten)]
    pub common: KindCommon,
    #[serde(default)]
    pub allowed_reasons: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LinkSubIssueConfig {
    #[serde(flatten)]
    pub common: KindCommon,
    #[serde(default)]
    pub parent_required_labels: Vec<String>,
    #[serde(default)]
    pub parent_title_prefix: Option<String>,
    #[serde(default)]
    pub sub_required_labels: Vec<String>,
    #[serde(default)]
    pub sub_title_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UploadAssetConfig {
    #[serde(flatten)]
    pub common: KindCommon,
    #[serde(default)]
    pub branch: Option<String>,
    /// Kilobytes
    #[serde(default)]
    pub max_size: Option<u32>,
    #[serde(default)]
    pub allowed_exts: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CodeScanningAlertConfig {
    #[serde(flatten)]
    pub common: KindCommon,
    #[serde(default)]
    pub driver: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DispatchWorkflowConfig {
    #[serde(flatten)]
    pub common: KindCommon,
    #[serde(default)]
    pub workflows: Vec<String>,
}

/// missing-tool, missing-data and noop
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReportConfig {
    #[serde(flatten)]
    pub common: KindCommon,
}

/// Threat detection over the agent output before any mutation is applied
#[derive(Debug, Clone, PartialEq)]
pub struct ThreatDetectionConfig {
    pub enabled: bool,
    /// Extra instructions appended to the detection prompt
    pub prompt: Option<String>,
    /// Additional steps run after the built-in scan
    pub steps: Vec<Step>,
}

impl Default for ThreatDetectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prompt: None,
            steps: Vec::new(),
        }
    }
}

impl<'de> Deserialize<'de> for ThreatDetectionConfig {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Full {
                #[serde(default)]
                enabled: Option<bool>,
                #[serde(default)]
                prompt: Option<String>,
                #[serde(default)]
                steps: Vec<Step>,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Flag(enabled) => ThreatDetectionConfig {
                enabled,
                ..Default::default()
            },
            Raw::Full {
                enabled,
                prompt,
                steps,
            } => ThreatDetectionConfig {
                enabled: enabled.unwrap_or(true),
                prompt,
                steps,
            },
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SafeOutputsConfig {
    #[serde(default, deserialize_with = "deserialize_block")]
    pub create_issue: Option<CreateIssueConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub add_comment: Option<AddCommentConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub create_discussion: Option<CreateDiscussionConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub close_issue: Option<CloseEntityConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub close_discussion: Option<CloseEntityConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub close_pull_request: Option<CloseEntityConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub create_pull_request: Option<CreatePullRequestConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub create_pull_request_review_comment: Option<ReviewCommentConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub submit_pull_request_review: Option<SubmitReviewConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub update_issue: Option<UpdateIssueConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub update_pull_request: Option<UpdatePullRequestConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub update_discussion: Option<UpdateDiscussionConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub update_release: Option<UpdateReleaseConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub push_to_pull_request_branch: Option<PushToPrBranchConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub add_labels: Option<LabelsConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub remove_labels: Option<LabelsConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub add_reviewer: Option<AddReviewerConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub assign_milestone: Option<AllowListConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub assign_to_user: Option<AllowListConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub hide_comment: Option<HideCommentConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub link_sub_issue: Option<LinkSubIssueConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub upload_asset: Option<UploadAssetConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub create_code_scanning_alert: Option<CodeScanningAlertConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub dispatch_workflow: Option<DispatchWorkflowConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub missing_tool: Option<ReportConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub missing_data: Option<ReportConfig>,
    #[serde(default, deserialize_with = "deserialize_block")]
    pub noop: Option<ReportConfig>,

    /// Token used by every kind without its own override
    #[serde(default)]
    pub github_token: Option<String>,
    /// Workflow-wide attribution footer default
    #[serde(default)]
    pub footer: Option<bool>,
    /// Kilobytes
    #[serde(default)]
    pub max_patch_size: Option<u32>,
    /// Preview mode: handlers report what they would do without doing it
    #[serde(default)]
    pub staged: bool,
    #[serde(default)]
    pub runs_on: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_map")]
    pub env: IndexMap<String, String>,
    #[serde(default)]
    pub threat_detection: Option<ThreatDetectionConfig>,
}

impl SafeOutputsConfig {
    /// Detection is on unless explicitly disabled
    pub fn threat_detection_enabled(&self) -> bool {
        self.threat_detection
            .as_ref()
            .map_or(true, |detection| detection.enabled)
    }
}
