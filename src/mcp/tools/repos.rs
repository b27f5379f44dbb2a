//! Git repository and pull request tools.

use schemars::JsonSchema;
use serde::Deserialize;

use super::{ProjectArgs, ProjectScoped};
use crate::api::ReposClient;
use crate::mcp::registry::ToolRegistry;
use crate::models::repos::{CompletionOptions, CreatePullRequest, PullRequestSearch, PullRequestUpdate};

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct RepoArgs {
    /// Repository name or id.
    repository: String,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct CreateRepoArgs {
    name: String,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct DeleteRepoArgs {
    /// Repository id (GUID).
    repository_id: String,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct CreateBranchArgs {
    repository: String,
    /// New branch name, short or fully qualified.
    name: String,
    /// Commit id the branch starts at.
    source_commit: String,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct DeleteBranchArgs {
    repository: String,
    name: String,
    /// Commit the branch currently points at.
    current_commit: String,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ListCommitsArgs {
    repository: String,
    #[serde(default)]
    branch: Option<String>,
    #[serde(default)]
    top: Option<i32>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct FileContentArgs {
    repository: String,
    /// File path inside the repository, e.g. "/src/main.rs".
    path: String,
    #[serde(default)]
    branch: Option<String>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ListPullRequestsArgs {
    repository: String,
    #[serde(flatten)]
    search: PullRequestSearch,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct PullRequestArgs {
    repository: String,
    pull_request_id: i32,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct CreatePullRequestArgs {
    repository: String,
    #[serde(flatten)]
    request: CreatePullRequest,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct UpdatePullRequestArgs {
    repository: String,
    pull_request_id: i32,
    #[serde(flatten)]
    update: PullRequestUpdate,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct CompletePullRequestArgs {
    repository: String,
    pull_request_id: i32,
    #[serde(flatten)]
    options: CompletionOptions,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct LabelArgs {
    repository: String,
    pull_request_id: i32,
    label: String,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct CreateThreadArgs {
    repository: String,
    pull_request_id: i32,
    content: String,
    /// Anchor the thread to a file.
    #[serde(default)]
    file_path: Option<String>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ReplyArgs {
    repository: String,
    pull_request_id: i32,
    thread_id: i32,
    content: String,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct VoteArgs {
    repository: String,
    pull_request_id: i32,
    reviewer_id: String,
    /// 10 approved, 5 approved with suggestions, 0 no vote, -5 waiting, -10 rejected.
    vote: i32,
    #[serde(default)]
    project: Option<String>,
}

pub fn register_repos_tools(registry: &mut ToolRegistry, client: &ReposClient) {
    let c = client.clone();
    registry.register_read(
        "repos_list_repositories",
        "List the Git repositories of a project.",
        move |args: ProjectArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.list_repositories().await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "repos_get_repository",
        "Get a repository by name or id.",
        move |args: RepoArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.get_repository(&args.repository).await }
        },
    );

    let c = client.clone();
    registry.register_write(
        "repos_create_repository",
        "Create an empty Git repository.",
        move |args: CreateRepoArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.create_repository(&args.name).await }
        },
    );

    let c = client.clone();
    registry.register_destructive(
        "repos_delete_repository",
        "Delete a repository.",
        move |args: DeleteRepoArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.delete_repository(&args.repository_id).await }
        },
    );

    let c = client.clone();
    registry.register_read("repos_list_branches", "List branches.", move |args: RepoArgs| {
        let client = c.in_project(args.project.as_deref());
        async move { client.list_branches(&args.repository).await }
    });

    let c = client.clone();
    registry.register_write(
        "repos_create_branch",
        "Create a branch at a commit.",
        move |args: CreateBranchArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .create_branch(&args.repository, &args.name, &args.source_commit)
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_destructive(
        "repos_delete_branch",
        "Delete a branch.",
        move |args: DeleteBranchArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .delete_branch(&args.repository, &args.name, &args.current_commit)
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_read(
        "repos_list_commits",
        "List recent commits, optionally on one branch.",
        move |args: ListCommitsArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .list_commits(&args.repository, args.branch.as_deref(), args.top)
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_read(
        "repos_get_file_content",
        "Read a file from a repository.",
        move |args: FileContentArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .get_file_content(&args.repository, &args.path, args.branch.as_deref())
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_read(
        "repos_list_pull_requests",
        "List pull requests matching the filters.",
        move |args: ListPullRequestsArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.list_pull_requests(&args.repository, &args.search).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "repos_get_pull_request",
        "Get a pull request.",
        move |args: PullRequestArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .get_pull_request(&args.repository, args.pull_request_id)
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_write(
        "repos_create_pull_request",
        "Open a pull request.",
        move |args: CreatePullRequestArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .create_pull_request(&args.repository, &args.request)
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_write(
        "repos_update_pull_request",
        "Change the title, description, draft flag or target of a pull request.",
        move |args: UpdatePullRequestArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .update_pull_request(&args.repository, args.pull_request_id, &args.update)
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_write(
        "repos_complete_pull_request",
        "Complete (merge) a pull request.",
        move |args: CompletePullRequestArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .complete_pull_request(&args.repository, args.pull_request_id, &args.options)
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_write(
        "repos_abandon_pull_request",
        "Abandon a pull request.",
        move |args: PullRequestArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .abandon_pull_request(&args.repository, args.pull_request_id)
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_write(
        "repos_add_pull_request_label",
        "Tag a pull request with a label.",
        move |args: LabelArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .add_pull_request_label(&args.repository, args.pull_request_id, &args.label)
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_read(
        "repos_list_pull_request_labels",
        "List the labels of a pull request.",
        move |args: PullRequestArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .list_pull_request_labels(&args.repository, args.pull_request_id)
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_read(
        "repos_list_pull_request_threads",
        "List the comment threads of a pull request.",
        move |args: PullRequestArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .list_pull_request_threads(&args.repository, args.pull_request_id)
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_write(
        "repos_create_pull_request_thread",
        "Start a comment thread on a pull request.",
        move |args: CreateThreadArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .create_pull_request_thread(
                        &args.repository,
                        args.pull_request_id,
                        &args.content,
                        args.file_path.as_deref(),
                    )
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_write(
        "repos_reply_to_thread",
        "Reply in an existing comment thread.",
        move |args: ReplyArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .reply_to_thread(
                        &args.repository,
                        args.pull_request_id,
                        args.thread_id,
                        &args.content,
                    )
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_write(
        "repos_set_reviewer_vote",
        "Cast a reviewer vote on a pull request.",
        move |args: VoteArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .set_reviewer_vote(
                        &args.repository,
                        args.pull_request_id,
                        &args.reviewer_id,
                        args.vote,
                    )
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_read(
        "repos_list_pull_request_work_items",
        "List the work items linked to a pull request.",
        move |args: PullRequestArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .list_pull_request_work_items(&args.repository, args.pull_request_id)
                    .await
            }
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::mock_http;
    use serde_json::json;

    /// # Vote Validation
    ///
    /// Tests that an out-of-range vote never reaches the service.
    ///
    /// ## Test Scenario
    /// - Calls `repos_set_reviewer_vote` with vote 7
    ///
    /// ## Expected Outcome
    /// - Failure envelope and no request recorded
    #[tokio::test]
    async fn test_reviewer_vote_rejected() {
        let server = wiremock::MockServer::start().await;
        let mut registry = ToolRegistry::new(false);
        register_repos_tools(
            &mut registry,
            &ReposClient::new(mock_http(&server), Some("Fabrikam".to_string())),
        );

        let outcome = registry
            .call(
                "repos_set_reviewer_vote",
                Some(json!({
                    "repository": "web",
                    "pullRequestId": 12,
                    "reviewerId": "u1",
                    "vote": 7
                })),
            )
            .await
            .unwrap();
        assert!(!outcome.envelope.is_success());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn test_read_only_repos_tools() {
        let server_settings = crate::api::ConnectionSettings::new(
            "contoso",
            secrecy::SecretString::from("pat".to_string()),
        );
        let http = crate::api::AdoHttpClient::new(server_settings).unwrap();
        let mut registry = ToolRegistry::new(true);
        register_repos_tools(&mut registry, &ReposClient::new(http, None));

        let names: Vec<_> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert!(names.contains(&"repos_get_file_content".to_string()));
        assert!(names.iter().all(|n| !n.contains("create") && !n.contains("delete")));
    }
}
