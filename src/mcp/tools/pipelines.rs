//! Pipeline and build tools.

use schemars::JsonSchema;
use serde::Deserialize;
use std::collections::BTreeMap;

use super::ProjectScoped;
use crate::api::PipelinesClient;
use crate::mcp::registry::ToolRegistry;
use crate::models::pipelines::{BuildQuery, CreatePipeline, RunPipeline};

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ListPipelinesArgs {
    #[serde(default)]
    top: Option<i32>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct PipelineArgs {
    pipeline_id: i32,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct CreatePipelineArgs {
    #[serde(flatten)]
    pipeline: CreatePipeline,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct RunPipelineArgs {
    pipeline_id: i32,
    #[serde(flatten)]
    run: RunPipeline,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct RunArgs {
    pipeline_id: i32,
    run_id: i32,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ListBuildsArgs {
    #[serde(flatten)]
    query: BuildQuery,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct BuildArgs {
    build_id: i32,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct QueueBuildArgs {
    definition_id: i32,
    #[serde(default)]
    source_branch: Option<String>,
    /// Queue-time variables.
    #[serde(default)]
    parameters: BTreeMap<String, String>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ListDefinitionsArgs {
    /// Name filter; `*` wildcards allowed.
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct BuildLogArgs {
    build_id: i32,
    log_id: i32,
    #[serde(default)]
    start_line: Option<i64>,
    #[serde(default)]
    end_line: Option<i64>,
    #[serde(default)]
    project: Option<String>,
}

pub fn register_pipelines_tools(registry: &mut ToolRegistry, client: &PipelinesClient) {
    let c = client.clone();
    registry.register_read(
        "pipelines_list_pipelines",
        "List the pipelines of a project.",
        move |args: ListPipelinesArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.list_pipelines(args.top).await }
        },
    );

    let c = client.clone();
    registry.register_read("pipelines_get_pipeline", "Get a pipeline.", move |args: PipelineArgs| {
        let client = c.in_project(args.project.as_deref());
        async move { client.get_pipeline(args.pipeline_id).await }
    });

    let c = client.clone();
    registry.register_write(
        "pipelines_create_pipeline",
        "Create a YAML pipeline from a file in an Azure Repos repository.",
        move |args: CreatePipelineArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.create_pipeline(&args.pipeline).await }
        },
    );

    let c = client.clone();
    registry.register_write(
        "pipelines_run_pipeline",
        "Start a pipeline run.",
        move |args: RunPipelineArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.run_pipeline(args.pipeline_id, &args.run).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "pipelines_list_runs",
        "List the runs of a pipeline.",
        move |args: PipelineArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.list_runs(args.pipeline_id).await }
        },
    );

    let c = client.clone();
    registry.register_read("pipelines_get_run", "Get a pipeline run.", move |args: RunArgs| {
        let client = c.in_project(args.project.as_deref());
        async move { client.get_run(args.pipeline_id, args.run_id).await }
    });

    let c = client.clone();
    registry.register_read(
        "pipelines_list_builds",
        "List builds filtered by definition, branch, status, result or age.",
        move |args: ListBuildsArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.list_builds(&args.query).await }
        },
    );

    let c = client.clone();
    registry.register_read("pipelines_get_build", "Get a build.", move |args: BuildArgs| {
        let client = c.in_project(args.project.as_deref());
        async move { client.get_build(args.build_id).await }
    });

    let c = client.clone();
    registry.register_write(
        "pipelines_queue_build",
        "Queue a build of a classic or YAML definition.",
        move |args: QueueBuildArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .queue_build(
                        args.definition_id,
                        args.source_branch.as_deref(),
                        &args.parameters,
                    )
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_write(
        "pipelines_cancel_build",
        "Cancel a running build.",
        move |args: BuildArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.cancel_build(args.build_id).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "pipelines_list_build_definitions",
        "List build definitions.",
        move |args: ListDefinitionsArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.list_build_definitions(args.name.as_deref()).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "pipelines_list_build_logs",
        "List the logs of a build.",
        move |args: BuildArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.list_build_logs(args.build_id).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "pipelines_get_build_log",
        "Read a build log as text, optionally a line range.",
        move |args: BuildLogArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .get_build_log(args.build_id, args.log_id, args.start_line, args.end_line)
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
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// # Build Log Text
    ///
    /// Tests that a plain-text log comes back as a string payload.
    ///
    /// ## Test Scenario
    /// - Requests lines 1-2 of log 3 of build 120
    ///
    /// ## Expected Outcome
    /// - The envelope data is the raw log text
    #[tokio::test]
    async fn test_get_build_log_tool() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contoso/Fabrikam/_apis/build/builds/120/logs/3"))
            .and(query_param("startLine", "1"))
            .and(query_param("endLine", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Starting\nDone\n"))
            .expect(1)
            .mount(&server)
            .await;

        let mut registry = ToolRegistry::new(false);
        register_pipelines_tools(
            &mut registry,
            &PipelinesClient::new(mock_http(&server), Some("Fabrikam".to_string())),
        );

        let outcome = registry
            .call(
                "pipelines_get_build_log",
                Some(json!({"buildId": 120, "logId": 3, "startLine": 1, "endLine": 2})),
            )
            .await
            .unwrap();
        assert_eq!(outcome.envelope.data, Some(json!("Starting\nDone\n")));
    }
}
