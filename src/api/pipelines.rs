//! YAML pipelines, pipeline runs, and classic build resources.

use url::Url;

use super::Scope;
use super::http::{AdoHttpClient, ServiceHost};
use super::pagination::{DEFAULT_MAX_PAGES, ListResponse, collect_continuation_up_to};
use crate::error::{ApiResult, ValidationError};
use crate::models::pipelines::{
    Build, BuildDefinitionReference, BuildLog, BuildQuery, CreatePipeline, CreatePipelineBody,
    DefinitionId, Pipeline, PipelineConfiguration, PipelineRepository, PipelineRun,
    QueueBuildBody, RunPipeline,
};
use crate::utils::parse_time_filter;
use crate::validation::{normalize_branch_ref, require_non_empty, validate_ids, validate_name, validate_top};
use serde_json::json;
use std::collections::BTreeMap;

const MAX_PIPELINE_NAME_LEN: usize = 260;
const MAX_BUILD_PAGE: i32 = 5000;
const BUILD_PAGE_SIZE: usize = 100;
/// Builds returned when no `top` is given.
pub const DEFAULT_BUILD_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct PipelinesClient {
    scope: Scope,
}

impl PipelinesClient {
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

    fn url(&self, path: &[&str]) -> ApiResult<Url> {
        let project = self.scope.project()?;
        self.scope.http.project_url(ServiceHost::Core, &project, path)
    }

    fn pipeline_url(&self, id: i32, path: &[&str]) -> ApiResult<Url> {
        let id = validate_ids("pipelineId", &[id])?[0].to_string();
        let mut segments = vec!["pipelines", id.as_str()];
        segments.extend_from_slice(path);
        self.url(&segments)
    }

    fn build_url(&self, id: i32, path: &[&str]) -> ApiResult<Url> {
        let id = validate_ids("buildId", &[id])?[0].to_string();
        let mut segments = vec!["build", "builds", id.as_str()];
        segments.extend_from_slice(path);
        self.url(&segments)
    }

    pub async fn list_pipelines(&self, top: Option<i32>) -> ApiResult<Vec<Pipeline>> {
        if let Some(top) = top {
            validate_top("top", top, MAX_BUILD_PAGE)?;
        }
        let url = self.url(&["pipelines"])?;
        let list: ListResponse<Pipeline> = self
            .scope
            .http
            .get(url)
            .query_opt("$top", top)
            .send_json()
            .await?;
        Ok(list.value)
    }

    pub async fn get_pipeline(&self, id: i32) -> ApiResult<Pipeline> {
        let url = self.pipeline_url(id, &[])?;
        self.scope.http.get(url).send_json().await
    }

    pub async fn create_pipeline(&self, request: &CreatePipeline) -> ApiResult<Pipeline> {
        let name = validate_name("name", &request.name, MAX_PIPELINE_NAME_LEN)?;
        let yaml_path = require_non_empty("yamlPath", &request.yaml_path)?;
        let repository_id = require_non_empty("repositoryId", &request.repository_id)?;

        let body = CreatePipelineBody {
            name: name.to_string(),
            folder: request
                .folder
                .as_deref()
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .unwrap_or("\\")
                .to_string(),
            configuration: PipelineConfiguration {
                configuration_type: "yaml",
                path: yaml_path.to_string(),
                repository: PipelineRepository {
                    id: repository_id.to_string(),
                    name: request.repository_name.clone(),
                    repository_type: "azureReposGit",
                },
            },
        };
        let url = self.url(&["pipelines"])?;
        self.scope.http.post(url).json(&body).send_json().await
    }

    pub async fn run_pipeline(&self, id: i32, run: &RunPipeline) -> ApiResult<PipelineRun> {
        let branch = run.branch.as_deref().map(normalize_branch_ref).transpose()?;
        let url = self.pipeline_url(id, &["runs"])?;
        self.scope
            .http
            .post(url)
            .json(&run.to_body(branch.as_deref()))
            .send_json()
            .await
    }

    pub async fn list_runs(&self, pipeline_id: i32) -> ApiResult<Vec<PipelineRun>> {
        let url = self.pipeline_url(pipeline_id, &["runs"])?;
        let list: ListResponse<PipelineRun> = self.scope.http.get(url).send_json().await?;
        Ok(list.value)
    }

    pub async fn get_run(&self, pipeline_id: i32, run_id: i32) -> ApiResult<PipelineRun> {
        let run_id = validate_ids("runId", &[run_id])?[0].to_string();
        let url = self.pipeline_url(pipeline_id, &["runs", &run_id])?;
        self.scope.http.get(url).send_json().await
    }

    /// List builds newest first, following continuation tokens up to `top`
    /// (default [`DEFAULT_BUILD_LIMIT`]).
    pub async fn list_builds(&self, query: &BuildQuery) -> ApiResult<Vec<Build>> {
        let limit = query
            .top
            .map(|top| validate_top("top", top, MAX_BUILD_PAGE))
            .transpose()?
            .map_or(DEFAULT_BUILD_LIMIT, |top| top as usize);
        let definitions = if query.definitions.is_empty() {
            None
        } else {
            Some(
                validate_ids("definitions", &query.definitions)?
                    .iter()
                    .map(i32::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
            )
        };
        let branch = query.branch.as_deref().map(normalize_branch_ref).transpose()?;
        let min_time = query
            .since
            .as_deref()
            .map(parse_time_filter)
            .transpose()?
            .map(|t| t.to_rfc3339());
        let page_size = limit.min(BUILD_PAGE_SIZE);
        let url = self.url(&["build", "builds"])?;

        collect_continuation_up_to(Some(limit), DEFAULT_MAX_PAGES, |token| {
            self.scope
                .http
                .get(url.clone())
                .query_opt("definitions", definitions.as_deref())
                .query_opt("branchName", branch.as_deref())
                .query_opt("statusFilter", query.status.map(|s| s.as_query()))
                .query_opt("resultFilter", query.result.map(|r| r.as_query()))
                .query_opt("minTime", min_time.as_deref())
                .query("queryOrder", "queueTimeDescending")
                .query("$top", page_size)
                .query_opt("continuationToken", token)
                .send_page()
        })
        .await
    }

    pub async fn get_build(&self, id: i32) -> ApiResult<Build> {
        let url = self.build_url(id, &[])?;
        self.scope.http.get(url).send_json().await
    }

    /// Queue a build of a classic or YAML definition.
    pub async fn queue_build(
        &self,
        definition_id: i32,
        source_branch: Option<&str>,
        parameters: &BTreeMap<String, String>,
    ) -> ApiResult<Build> {
        let definition_id = validate_ids("definitionId", &[definition_id])?[0];
        let source_branch = source_branch.map(normalize_branch_ref).transpose()?;
        let parameters = if parameters.is_empty() {
            None
        } else {
            Some(json!(parameters).to_string())
        };
        let body = QueueBuildBody {
            definition: DefinitionId { id: definition_id },
            source_branch,
            parameters,
        };
        let url = self.url(&["build", "builds"])?;
        self.scope.http.post(url).json(&body).send_json().await
    }

    pub async fn cancel_build(&self, id: i32) -> ApiResult<Build> {
        let url = self.build_url(id, &[])?;
        self.scope
            .http
            .patch(url)
            .json(&json!({ "status": "cancelling" }))
            .send_json()
            .await
    }

    pub async fn list_build_definitions(
        &self,
        name: Option<&str>,
    ) -> ApiResult<Vec<BuildDefinitionReference>> {
        let url = self.url(&["build", "definitions"])?;
        let list: ListResponse<BuildDefinitionReference> = self
            .scope
            .http
            .get(url)
            .query_opt("name", name.map(str::trim).filter(|n| !n.is_empty()))
            .send_json()
            .await?;
        Ok(list.value)
    }

    pub async fn list_build_logs(&self, build_id: i32) -> ApiResult<Vec<BuildLog>> {
        let url = self.build_url(build_id, &["logs"])?;
        let list: ListResponse<BuildLog> = self.scope.http.get(url).send_json().await?;
        Ok(list.value)
    }

    /// Fetch a log as plain text, optionally limited to a line range.
    pub async fn get_build_log(
        &self,
        build_id: i32,
        log_id: i32,
        start_line: Option<i64>,
        end_line: Option<i64>,
    ) -> ApiResult<String> {
        let log_id = validate_ids("logId", &[log_id])?[0].to_string();
        if let (Some(start), Some(end)) = (start_line, end_line)
            && start > end
        {
            return Err(ValidationError::OutOfRange {
                field: "endLine".to_string(),
                min: start,
                max: i64::MAX,
                value: end,
            }
            .into());
        }
        let url = self.build_url(build_id, &["logs", &log_id])?;
        self.scope
            .http
            .get(url)
            .query_opt("startLine", start_line)
            .query_opt("endLine", end_line)
            .send_text()
            .await
    }
}
