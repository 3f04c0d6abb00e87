//! Safe-output kinds and the token scopes each one needs

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SafeOutputKind {
    CreateIssue,
    AddComment,
    CreateDiscussion,
    CloseIssue,
    CloseDiscussion,
    ClosePullRequest,
    CreatePullRequest,
    CreatePullRequestReviewComment,
    SubmitPullRequestReview,
    UpdateIssue,
    UpdatePullRequest,
    UpdateDiscussion,
    UpdateRelease,
    PushToPullRequestBranch,
    AddLabels,
    RemoveLabels,
    AddReviewer,
    AssignMilestone,
    AssignToUser,
    HideComment,
    LinkSubIssue,
    UploadAsset,
    CreateCodeScanningAlert,
    DispatchWorkflow,
    MissingTool,
    MissingData,
    Noop,
}

impl SafeOutputKind {
    /// Key in the dispatch configuration and in agent output types
    pub fn key(self) -> &'static str {
        match self {
            SafeOutputKind::CreateIssue => "create_issue",
            SafeOutputKind::AddComment => "add_comment",
            SafeOutputKind::CreateDiscussion => "create_discussion",
            SafeOutputKind::CloseIssue => "close_issue",
            SafeOutputKind::CloseDiscussion => "close_discussion",
            SafeOutputKind::ClosePullRequest => "close_pull_request",
            SafeOutputKind::CreatePullRequest => "create_pull_request",
            SafeOutputKind::CreatePullRequestReviewComment => {
                "create_pull_request_review_comment"
            }
            SafeOutputKind::SubmitPullRequestReview => "submit_pull_request_review",
            SafeOutputKind::UpdateIssue => "update_issue",
            SafeOutputKind::UpdatePullRequest => "update_pull_request",
            SafeOutputKind::UpdateDiscussion => "update_discussion",
            SafeOutputKind::UpdateRelease => "update_release",
            SafeOutputKind::PushToPullRequestBranch => "push_to_pull_request_branch",
            SafeOutputKind::AddLabels => "add_labels",
            SafeOutputKind::RemoveLabels => "remove_labels",
            SafeOutputKind::AddReviewer => "add_reviewer",
            SafeOutputKind::AssignMilestone => "assign_milestone",
            SafeOutputKind::AssignToUser => "assign_to_user",
            SafeOutputKind::HideComment => "hide_comment",
            SafeOutputKind::LinkSubIssue => "link_sub_issue",
            SafeOutputKind::UploadAsset => "upload_asset",
            SafeOutputKind::CreateCodeScanningAlert => "create_code_scanning_alert",
            SafeOutputKind::DispatchWorkflow => "dispatch_workflow",
            SafeOutputKind::MissingTool => "missing_tool",
            SafeOutputKind::MissingData => "missing_data",
            SafeOutputKind::Noop => "noop",
        }
    }

    /// Token scopes the dispatcher needs to apply this kind
    pub fn permissions(self) -> &'static [(&'static str, &'static str)] {
        match self {
            SafeOutputKind::CreateIssue
            | SafeOutputKind::CloseIssue
            | SafeOutputKind::UpdateIssue
            | SafeOutputKind::AssignMilestone
            | SafeOutputKind::AssignToUser
            | SafeOutputKind::LinkSubIssue => &[("contents", "read"), ("issues", "write")],
            SafeOutputKind::AddComment | SafeOutputKind::HideComment => &[
                ("contents", "read"),
                ("issues", "write"),
                ("pull-requests", "write"),
                ("discussions", "write"),
            ],
            SafeOutputKind::CreateDiscussion
            | SafeOutputKind::CloseDiscussion
            | SafeOutputKind::UpdateDiscussion => &[("contents", "read"), ("discussions", "write")],
            SafeOutputKind::ClosePullRequest
            | SafeOutputKind::CreatePullRequestReviewComment
            | SafeOutputKind::SubmitPullRequestReview
            | SafeOutputKind::UpdatePullRequest
            | SafeOutputKind::AddReviewer => &[("contents", "read"), ("pull-requests", "write")],
            SafeOutputKind::CreatePullRequest => &[
                ("contents", "write"),
                ("issues", "write"),
                ("pull-requests", "write"),
            ],
            SafeOutputKind::PushToPullRequestBranch => {
                &[("contents", "write"), ("pull-requests", "read")]
            }
            SafeOutputKind::UpdateRelease | SafeOutputKind::UploadAsset => {
                &[("contents", "write")]
            }
            SafeOutputKind::AddLabels | SafeOutputKind::RemoveLabels => &[
                ("contents", "read"),
                ("issues", "write"),
                ("pull-requests", "write"),
            ],
            SafeOutputKind::CreateCodeScanningAlert => {
                &[("contents", "read"), ("security-events", "write")]
            }
            SafeOutputKind::DispatchWorkflow => &[("contents", "read"), ("actions", "write")],
            SafeOutputKind::MissingTool | SafeOutputKind::MissingData | SafeOutputKind::Noop => {
                &[("contents", "read")]
            }
        }
    }

    /// Kinds that push commits and need the repository checked out
    pub fn needs_checkout(self) -> bool {
        matches!(
            self,
            SafeOutputKind::CreatePullRequest | SafeOutputKind::PushToPullRequestBranch
        )
    }
}

impl fmt::Display for SafeOutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
