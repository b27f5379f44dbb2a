//! Git repositories, branches, commits, files and pull requests.

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::debug;
use url::Url;

use super::Scope;
use super::http::{AdoHttpClient, ServiceHost};
use super::pagination::{DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE, ListResponse};
use crate::error::{ApiError, ApiResult, ValidationError};
use crate::models::repos::{
    ALLOWED_VOTES, Comment, CommentThread, CommitId, CompletePullRequestBody, CompletionOptions,
    CreatePullRequest, CreatePullRequestBody, GitCommitRef, GitItem, GitRef, GitRefUpdate,
    GitRefUpdateResult, GitRepository, IdRef, Label, PullRequest, PullRequestSearch,
    PullRequestUpdate, ResourceRef, Reviewer, ZERO_OBJECT_ID,
};
use crate::utils::parse_time_filter;
use crate::validation::{
    normalize_branch_ref, require_non_empty, validate_ids, validate_name, validate_top,
};

const MAX_REPO_NAME_LEN: usize = 64;
const MAX_LABEL_LEN: usize = 100;
const MAX_COMMITS_TOP: i32 = 1000;
/// Pull requests returned when no `top` is given.
pub const DEFAULT_PULL_REQUEST_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct ReposClient {
    scope: Scope,
}

impl ReposClient {
    pub fn new(http: AdoHttpClient, project: Option<String>) -> Self {
        Self {
            scope: Scope::new(http, project),
        }
    }

    pub fn for_project(&self, project: &str) -> Self {
        Self {
            scope: self.scope.with_project(project),
        }
    }

    pub fn project(&self) -> Option<&str> {
        self.scope.project.as_deref()
    }

    fn git_url(&self, path: &[&str]) -> ApiResult<Url> {
        let project = self.scope.project()?;
        let mut segments = vec!["git", "repositories"];
        segments.extend_from_slice(path);
        self.scope
            .http
            .project_url(ServiceHost::Core, &project, &segments)
    }

    fn pr_url(&self, repo: &str, id: i32, path: &[&str]) -> ApiResult<Url> {
        let repo = require_non_empty("repository", repo)?;
        let id = validate_ids("pullRequestId", &[id])?[0].to_string();
        let mut segments = vec![repo, "pullRequests", id.as_str()];
        segments.extend_from_slice(path);
        self.git_url(&segments)
    }

    pub async fn list_repositories(&self) -> ApiResult<Vec<GitRepository>> {
        let url = self.git_url(&[])?;
        let list: ListResponse<GitRepository> = self.scope.http.get(url).send_json().await?;
        Ok(list.value)
    }

    /// Look up a repository by name or id.
    pub async fn get_repository(&self, repo: &str) -> ApiResult<GitRepository> {
        let repo = require_non_empty("repository", repo)?;
        let url = self.git_url(&[repo])?;
        self.scope.http.get(url).send_json().await
    }

    pub async fn create_repository(&self, name: &str) -> ApiResult<GitRepository> {
        let name = validate_name("name", name, MAX_REPO_NAME_LEN)?;
        let url = self.git_url(&[])?;
        self.scope
            .http
            .post(url)
            .json(&json!({ "name": name }))
            .send_json()
            .await
    }

    /// Delete a repository. The API only accepts the repository id, not its name.
    pub async fn delete_repository(&self, repo_id: &str) -> ApiResult<()> {
        let repo_id = require_non_empty("repositoryId", repo_id)?;
        let url = self.git_url(&[repo_id])?;
        self.scope.http.delete(url).send_empty().await
    }

    pub async fn list_branches(&self, repo: &str) -> ApiResult<Vec<GitRef>> {
        let repo = require_non_empty("repository", repo)?;
        let url = self.git_url(&[repo, "refs"])?;
        let list: ListResponse<GitRef> = self
            .scope
            .http
            .get(url)
            .query("filter", "heads/")
            .send_json()
            .await?;
        Ok(list.value)
    }

    /// Create a branch pointing at `source_commit`.
    pub async fn create_branch(
        &self,
        repo: &str,
        name: &str,
        source_commit: &str,
    ) -> ApiResult<GitRefUpdateResult> {
        let commit = validate_object_id("sourceCommit", source_commit)?;
        let update = GitRefUpdate {
            name: normalize_branch_ref(name)?,
            old_object_id: ZERO_OBJECT_ID.to_string(),
            new_object_id: commit.to_string(),
        };
        self.update_ref(repo, update).await
    }

    /// Delete a branch; `current_commit` must match the branch head.
    pub async fn delete_branch(
        &self,
        repo: &str,
        name: &str,
        current_commit: &str,
    ) -> ApiResult<GitRefUpdateResult> {
        let commit = validate_object_id("currentCommit", current_commit)?;
        let update = GitRefUpdate {
            name: normalize_branch_ref(name)?,
            old_object_id: commit.to_string(),
            new_object_id: ZERO_OBJECT_ID.to_string(),
        };
        self.update_ref(repo, update).await
    }

    async fn update_ref(&self, repo: &str, update: GitRefUpdate) -> ApiResult<GitRefUpdateResult> {
        let repo = require_non_empty("repository", repo)?;
        let url = self.git_url(&[repo, "refs"])?;
        let list: ListResponse<GitRefUpdateResult> = self
            .scope
            .http
            .post(url)
            .json(&[&update])
            .send_json()
            .await?;

        let result = list.value.into_iter().next().ok_or_else(|| ApiError::ParseError {
            message: "ref update returned no results".to_string(),
        })?;
        if result.success == Some(false) {
            return Err(ApiError::Conflict {
                message: format!(
                    "ref update for {} failed: {}",
                    update.name,
                    result
                        .custom_message
                        .clone()
                        .or_else(|| result.update_status.clone())
                        .unwrap_or_else(|| "unknown reason".to_string())
                ),
            });
        }
        Ok(result)
    }

    pub async fn list_commits(
        &self,
        repo: &str,
        branch: Option<&str>,
        top: Option<i32>,
    ) -> ApiResult<Vec<GitCommitRef>> {
        let repo = require_non_empty("repository", repo)?;
        if let Some(top) = top {
            validate_top("top", top, MAX_COMMITS_TOP)?;
        }
        let branch = branch.map(short_branch_name).transpose()?;
        let url = self.git_url(&[repo, "commits"])?;
        let list: ListResponse<GitCommitRef> = self
            .scope
            .http
            .get(url)
            .query_opt("searchCriteria.itemVersion.version", branch)
            .query_opt("searchCriteria.$top", top)
            .send_json()
            .await?;
        Ok(list.value)
    }

    /// Fetch a file with its content, from `branch` or the default branch.
    pub async fn get_file_content(
        &self,
        repo: &str,
        path: &str,
        branch: Option<&str>,
    ) -> ApiResult<GitItem> {
        let repo = require_non_empty("repository", repo)?;
        let path = require_non_empty("path", path)?;
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        let branch = branch.map(short_branch_name).transpose()?;
        let url = self.git_url(&[repo, "items"])?;

        let mut request = self
            .scope
            .http
            .get(url)
            .query("path", path)
            .query("includeContent", true);
        if let Some(branch) = branch {
            request = request
                .query("versionDescriptor.version", branch)
                .query("versionDescriptor.versionType", "branch");
        }
        request.send_json().await
    }

    /// List pull requests matching `search`, newest first.
    ///
    /// Pages with `$top`/`$skip`. When `since` is set, stops at the first pull
    /// request closed before that time. Without `top` at most
    /// [`DEFAULT_PULL_REQUEST_LIMIT`] pull requests are returned.
    pub async fn list_pull_requests(
        &self,
        repo: &str,
        search: &PullRequestSearch,
    ) -> ApiResult<Vec<PullRequest>> {
        let repo = require_non_empty("repository", repo)?;
        let limit = search
            .top
            .map(|top| validate_top("top", top, i32::MAX))
            .transpose()?
            .map_or(DEFAULT_PULL_REQUEST_LIMIT, |top| top as usize);
        let since: Option<DateTime<Utc>> = search
            .since
            .as_deref()
            .map(parse_time_filter)
            .transpose()?;
        let source = search
            .source_branch
            .as_deref()
            .map(normalize_branch_ref)
            .transpose()?;
        let target = search
            .target_branch
            .as_deref()
            .map(normalize_branch_ref)
            .transpose()?;
        let status = search.status.unwrap_or_default();
        let url = self.git_url(&[repo, "pullrequests"])?;

        let page_size = DEFAULT_PAGE_SIZE.min(limit as i32);
        let mut all = Vec::new();
        let mut skip = 0;

        for _ in 0..DEFAULT_MAX_PAGES {
            let list: ListResponse<PullRequest> = self
                .scope
                .http
                .get(url.clone())
                .query("searchCriteria.status", status.as_query())
                .query_opt("searchCriteria.sourceRefName", source.as_deref())
                .query_opt("searchCriteria.targetRefName", target.as_deref())
                .query_opt("searchCriteria.creatorId", search.creator_id.as_deref())
                .query_opt("searchCriteria.reviewerId", search.reviewer_id.as_deref())
                .query("$top", page_size)
                .query("$skip", skip)
                .send_json()
                .await?;
            let fetched = list.value.len();

            for pr in list.value {
                if let Some(since) = since
                    && closed_before(&pr, since)
                {
                    debug!(pull_request = pr.pull_request_id, "Reached since limit");
                    return Ok(all);
                }
                all.push(pr);
                if all.len() >= limit {
                    return Ok(all);
                }
            }

            if fetched < page_size as usize {
                return Ok(all);
            }
            skip += page_size;
        }

        Err(ApiError::PaginationLimitExceeded {
            max: DEFAULT_MAX_PAGES,
            retrieved: all.len(),
        })
    }

    pub async fn get_pull_request(&self, repo: &str, id: i32) -> ApiResult<PullRequest> {
        let url = self.pr_url(repo, id, &[])?;
        self.scope.http.get(url).send_json().await
    }

    pub async fn create_pull_request(
        &self,
        repo: &str,
        request: &CreatePullRequest,
    ) -> ApiResult<PullRequest> {
        let repo = require_non_empty("repository", repo)?;
        let title = require_non_empty("title", &request.title)?;
        let source_ref_name = normalize_branch_ref(&request.source_branch)?;
        let target_ref_name = normalize_branch_ref(&request.target_branch)?;
        if source_ref_name == target_ref_name {
            return Err(ValidationError::Invalid {
                field: "targetBranch".to_string(),
                message: format!("source and target are both {}", source_ref_name),
            }
            .into());
        }
        let work_item_ids = if request.work_item_ids.is_empty() {
            Vec::new()
        } else {
            validate_ids("workItemIds", &request.work_item_ids)?
        };

        let body = CreatePullRequestBody {
            source_ref_name,
            target_ref_name,
            title: title.to_string(),
            description: request.description.clone(),
            is_draft: request.is_draft,
            reviewers: request
                .reviewer_ids
                .iter()
                .map(|id| IdRef { id: id.clone() })
                .collect(),
            work_item_refs: work_item_ids
                .into_iter()
                .map(|id| IdRef { id: id.to_string() })
                .collect(),
        };

        let url = self.git_url(&[repo, "pullrequests"])?;
        self.scope.http.post(url).json(&body).send_json().await
    }

    pub async fn update_pull_request(
        &self,
        repo: &str,
        id: i32,
        update: &PullRequestUpdate,
    ) -> ApiResult<PullRequest> {
        if update.is_empty() {
            return Err(ValidationError::Empty {
                field: "update".to_string(),
            }
            .into());
        }
        let mut update = update.clone();
        if let Some(target) = &update.target_ref_name {
            update.target_ref_name = Some(normalize_branch_ref(target)?);
        }
        let url = self.pr_url(repo, id, &[])?;
        self.scope.http.patch(url).json(&update).send_json().await
    }

    /// Complete (merge) a pull request.
    ///
    /// The service requires the current merge source commit, so the pull
    /// request is fetched first.
    pub async fn complete_pull_request(
        &self,
        repo: &str,
        id: i32,
        options: &CompletionOptions,
    ) -> ApiResult<PullRequest> {
        let current = self.get_pull_request(repo, id).await?;
        let commit_id = current
            .last_merge_source_commit
            .and_then(|c| c.commit_id)
            .ok_or_else(|| ApiError::Conflict {
                message: format!("pull request {} has no merge source commit", id),
            })?;

        let body = CompletePullRequestBody {
            status: "completed",
            last_merge_source_commit: CommitId {
                commit_id: Some(commit_id),
            },
            completion_options: options,
        };
        let url = self.pr_url(repo, id, &[])?;
        self.scope.http.patch(url).json(&body).send_json().await
    }

    pub async fn abandon_pull_request(&self, repo: &str, id: i32) -> ApiResult<PullRequest> {
        let url = self.pr_url(repo, id, &[])?;
        self.scope
            .http
            .patch(url)
            .json(&json!({ "status": "abandoned" }))
            .send_json()
            .await
    }

    pub async fn add_pull_request_label(
        &self,
        repo: &str,
        id: i32,
        label: &str,
    ) -> ApiResult<Label> {
        let label = require_non_empty("label", label)?;
        if label.chars().count() > MAX_LABEL_LEN {
            return Err(ValidationError::TooLong {
                field: "label".to_string(),
                max: MAX_LABEL_LEN,
            }
            .into());
        }
        let url = self.pr_url(repo, id, &["labels"])?;
        self.scope
            .http
            .post(url)
            .json(&json!({ "name": label }))
            .send_json()
            .await
    }

    pub async fn list_pull_request_labels(&self, repo: &str, id: i32) -> ApiResult<Vec<Label>> {
        let url = self.pr_url(repo, id, &["labels"])?;
        let list: ListResponse<Label> = self.scope.http.get(url).send_json().await?;
        Ok(list.value)
    }

    pub async fn list_pull_request_threads(
        &self,
        repo: &str,
        id: i32,
    ) -> ApiResult<Vec<CommentThread>> {
        let url = self.pr_url(repo, id, &["threads"])?;
        let list: ListResponse<CommentThread> = self.scope.http.get(url).send_json().await?;
        Ok(list.value)
    }

    /// Start a discussion thread, optionally anchored to a file.
    pub async fn create_pull_request_thread(
        &self,
        repo: &str,
        id: i32,
        content: &str,
        file_path: Option<&str>,
    ) -> ApiResult<CommentThread> {
        let content = require_non_empty("content", content)?;
        let mut body = json!({
            "comments": [{"parentCommentId": 0, "content": content, "commentType": "text"}],
            "status": "active",
        });
        if let Some(file_path) = file_path.map(str::trim).filter(|p| !p.is_empty()) {
            let file_path = if file_path.starts_with('/') {
                file_path.to_string()
            } else {
                format!("/{}", file_path)
            };
            body["threadContext"] = json!({ "filePath": file_path });
        }
        let url = self.pr_url(repo, id, &["threads"])?;
        self.scope.http.post(url).json(&body).send_json().await
    }

    pub async fn reply_to_thread(
        &self,
        repo: &str,
        id: i32,
        thread_id: i32,
        content: &str,
    ) -> ApiResult<Comment> {
        let content = require_non_empty("content", content)?;
        let thread_id = validate_ids("threadId", &[thread_id])?[0].to_string();
        let url = self.pr_url(repo, id, &["threads", &thread_id, "comments"])?;
        self.scope
            .http
            .post(url)
            .json(&json!({ "content": content, "parentCommentId": 1, "commentType": "text" }))
            .send_json()
            .await
    }

    /// Cast a vote: 10 approve, 5 approve with suggestions, 0 reset,
    /// -5 wait for author, -10 reject.
    pub async fn set_reviewer_vote(
        &self,
        repo: &str,
        id: i32,
        reviewer_id: &str,
        vote: i32,
    ) -> ApiResult<Reviewer> {
        let reviewer_id = require_non_empty("reviewerId", reviewer_id)?;
        if !ALLOWED_VOTES.contains(&vote) {
            return Err(ValidationError::OutOfRange {
                field: "vote".to_string(),
                min: -10,
                max: 10,
                value: vote as i64,
            }
            .into());
        }
        let url = self.pr_url(repo, id, &["reviewers", reviewer_id])?;
        self.scope
            .http
            .put(url)
            .json(&json!({ "vote": vote }))
            .send_json()
            .await
    }

    pub async fn list_pull_request_work_items(
        &self,
        repo: &str,
        id: i32,
    ) -> ApiResult<Vec<ResourceRef>> {
        let url = self.pr_url(repo, id, &["workitems"])?;
        let list: ListResponse<ResourceRef> = self.scope.http.get(url).send_json().await?;
        Ok(list.value)
    }
}

fn closed_before(pr: &PullRequest, since: DateTime<Utc>) -> bool {
    pr.closed_date
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .is_some_and(|closed| closed.with_timezone(&Utc) < since)
}

/// Branch name without the `refs/heads/` prefix, as version descriptors expect.
fn short_branch_name(branch: &str) -> ApiResult<String> {
    let qualified = normalize_branch_ref(branch)?;
    Ok(qualified
        .strip_prefix("refs/heads/")
        .unwrap_or(&qualified)
        .to_string())
}

fn validate_object_id<'a>(field: &str, value: &'a str) -> ApiResult<&'a str> {
    let value = require_non_empty(field, value)?;
    if value.len() != 40 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::Invalid {
            field: field.to_string(),
            message: "expected a 40 character commit id".to_string(),
        }
        .into());
    }
    Ok(value)
}
