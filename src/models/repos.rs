use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{IdentityRef, ProjectReference};

/// Object id Azure DevOps uses for "no commit" in ref updates.
pub const ZERO_OBJECT_ID: &str = "0000000000000000000000000000000000000000";

/// Votes accepted by the reviewers API.
pub const ALLOWED_VOTES: [i32; 5] = [-10, -5, 0, 5, 10];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitRepository {
    pub id: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
    pub remote_url: Option<String>,
    pub ssh_url: Option<String>,
    pub web_url: Option<String>,
    pub default_branch: Option<String>,
    pub size: Option<u64>,
    pub is_disabled: Option<bool>,
    pub project: Option<ProjectReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitRef {
    pub name: Option<String>,
    pub object_id: Option<String>,
    pub creator: Option<IdentityRef>,
    pub is_locked: Option<bool>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitRefUpdate {
    pub name: String,
    pub old_object_id: String,
    pub new_object_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitRefUpdateResult {
    pub name: Option<String>,
    pub old_object_id: Option<String>,
    pub new_object_id: Option<String>,
    pub success: Option<bool>,
    pub update_status: Option<String>,
    pub custom_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitUserDate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitCommitRef {
    pub commit_id: Option<String>,
    pub comment: Option<String>,
    pub author: Option<GitUserDate>,
    pub committer: Option<GitUserDate>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitItem {
    pub object_id: Option<String>,
    pub git_object_type: Option<String>,
    pub commit_id: Option<String>,
    pub path: Option<String>,
    pub is_folder: Option<bool>,
    pub content: Option<String>,
    pub url: Option<String>,
}

/// Pull request status as used in queries and updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum PullRequestStatus {
    #[default]
    Active,
    Abandoned,
    Completed,
    All,
    NotSet,
}

impl PullRequestStatus {
    pub fn as_query(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Abandoned => "abandoned",
            Self::Completed => "completed",
            Self::All => "all",
            Self::NotSet => "notSet",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reviewer {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub unique_name: Option<String>,
    pub vote: Option<i32>,
    pub is_required: Option<bool>,
    pub has_declined: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: Option<String>,
    pub name: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitId {
    pub commit_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub pull_request_id: i32,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub source_ref_name: Option<String>,
    pub target_ref_name: Option<String>,
    pub created_by: Option<IdentityRef>,
    pub creation_date: Option<String>,
    pub closed_date: Option<String>,
    pub is_draft: Option<bool>,
    pub merge_status: Option<String>,
    pub last_merge_source_commit: Option<CommitId>,
    pub last_merge_commit: Option<CommitId>,
    #[serde(default)]
    pub reviewers: Vec<Reviewer>,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub repository: Option<GitRepository>,
    pub url: Option<String>,
}

/// Filters for listing pull requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestSearch {
    /// Status filter; defaults to active.
    #[serde(default)]
    pub status: Option<PullRequestStatus>,
    /// Source branch, short or fully qualified.
    #[serde(default)]
    pub source_branch: Option<String>,
    /// Target branch, short or fully qualified.
    #[serde(default)]
    pub target_branch: Option<String>,
    #[serde(default)]
    pub creator_id: Option<String>,
    #[serde(default)]
    pub reviewer_id: Option<String>,
    /// Only pull requests closed after this time ("7d", "2w", RFC 3339, "2024-01-31").
    #[serde(default)]
    pub since: Option<String>,
    /// Maximum number of pull requests returned (default 100).
    #[serde(default)]
    pub top: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePullRequest {
    pub source_branch: String,
    pub target_branch: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_draft: Option<bool>,
    /// Reviewer identity ids.
    #[serde(default)]
    pub reviewer_ids: Vec<String>,
    /// Work item ids to link.
    #[serde(default)]
    pub work_item_ids: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IdRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatePullRequestBody {
    pub source_ref_name: String,
    pub target_ref_name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_draft: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reviewers: Vec<IdRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub work_item_refs: Vec<IdRef>,
}

/// Fields to change on a pull request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_draft: Option<bool>,
    /// Retarget to another branch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_ref_name: Option<String>,
}

impl PullRequestUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.is_draft.is_none()
            && self.target_ref_name.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum MergeStrategy {
    #[default]
    NoFastForward,
    Squash,
    Rebase,
    RebaseMerge,
}

/// How a pull request should be completed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_strategy: Option<MergeStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_source_branch: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_commit_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_work_items: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bypass_policy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bypass_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompletePullRequestBody<'a> {
    pub status: &'static str,
    pub last_merge_source_commit: CommitId,
    pub completion_options: &'a CompletionOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Option<i32>,
    pub parent_comment_id: Option<i32>,
    pub content: Option<String>,
    pub comment_type: Option<String>,
    pub author: Option<IdentityRef>,
    pub published_date: Option<String>,
    pub is_deleted: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePosition {
    pub line: i32,
    pub offset: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadContext {
    pub file_path: Option<String>,
    pub right_file_start: Option<FilePosition>,
    pub right_file_end: Option<FilePosition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    pub id: Option<i32>,
    pub status: Option<String>,
    pub published_date: Option<String>,
    pub last_updated_date: Option<String>,
    pub is_deleted: Option<bool>,
    pub thread_context: Option<ThreadContext>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    pub id: Option<String>,
    pub url: Option<String>,
}
