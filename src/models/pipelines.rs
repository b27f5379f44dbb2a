use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{IdentityRef, ShallowReference};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub id: i32,
    pub name: Option<String>,
    pub folder: Option<String>,
    pub revision: Option<i32>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    pub id: i32,
    pub name: Option<String>,
    pub state: Option<String>,
    pub result: Option<String>,
    pub created_date: Option<String>,
    pub finished_date: Option<String>,
    pub pipeline: Option<ShallowReference>,
    pub url: Option<String>,
}

/// A YAML pipeline backed by an Azure Repos git repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePipeline {
    pub name: String,
    /// Folder path, defaults to the root ("\\").
    #[serde(default)]
    pub folder: Option<String>,
    /// Path of the YAML file inside the repository.
    pub yaml_path: String,
    pub repository_id: String,
    #[serde(default)]
    pub repository_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PipelineRepository {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub repository_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PipelineConfiguration {
    #[serde(rename = "type")]
    pub configuration_type: &'static str,
    pub path: String,
    pub repository: PipelineRepository,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatePipelineBody {
    pub name: String,
    pub folder: String,
    pub configuration: PipelineConfiguration,
}

/// Parameters for starting a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunPipeline {
    /// Branch to run, short or fully qualified. Defaults to the pipeline's default branch.
    #[serde(default)]
    pub branch: Option<String>,
    /// Runtime variables.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    /// Values for YAML template parameters.
    #[serde(default)]
    pub template_parameters: BTreeMap<String, String>,
}

impl RunPipeline {
    /// Request body for the runs endpoint; `branch` must already be qualified.
    pub(crate) fn to_body(&self, branch: Option<&str>) -> Value {
        let mut body = serde_json::Map::new();
        if let Some(branch) = branch {
            body.insert(
                "resources".to_string(),
                serde_json::json!({"repositories": {"self": {"refName": branch}}}),
            );
        }
        if !self.variables.is_empty() {
            let variables: serde_json::Map<String, Value> = self
                .variables
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::json!({"value": v})))
                .collect();
            body.insert("variables".to_string(), Value::Object(variables));
        }
        if !self.template_parameters.is_empty() {
            body.insert(
                "templateParameters".to_string(),
                serde_json::json!(self.template_parameters),
            );
        }
        Value::Object(body)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub id: i32,
    pub build_number: Option<String>,
    pub status: Option<String>,
    pub result: Option<String>,
    pub source_branch: Option<String>,
    pub source_version: Option<String>,
    pub queue_time: Option<String>,
    pub start_time: Option<String>,
    pub finish_time: Option<String>,
    pub reason: Option<String>,
    pub definition: Option<ShallowReference>,
    pub requested_for: Option<IdentityRef>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum BuildStatus {
    All,
    Cancelling,
    Completed,
    InProgress,
    NotStarted,
    Postponed,
}

impl BuildStatus {
    pub fn as_query(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Cancelling => "cancelling",
            Self::Completed => "completed",
            Self::InProgress => "inProgress",
            Self::NotStarted => "notStarted",
            Self::Postponed => "postponed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum BuildResult {
    Succeeded,
    PartiallySucceeded,
    Failed,
    Canceled,
}

impl BuildResult {
    pub fn as_query(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::PartiallySucceeded => "partiallySucceeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        }
    }
}

/// Filters for listing builds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildQuery {
    /// Build definition ids.
    #[serde(default)]
    pub definitions: Vec<i32>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub status: Option<BuildStatus>,
    #[serde(default)]
    pub result: Option<BuildResult>,
    /// Only builds queued after this time ("1d", RFC 3339, "2024-01-31").
    #[serde(default)]
    pub since: Option<String>,
    /// Maximum number of builds returned (default 100).
    #[serde(default)]
    pub top: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueueBuildBody {
    pub definition: DefinitionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_branch: Option<String>,
    /// Azure DevOps expects the parameters as a JSON-encoded string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct DefinitionId {
    pub id: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildDefinitionReference {
    pub id: i32,
    pub name: Option<String>,
    pub path: Option<String>,
    pub revision: Option<i32>,
    pub queue_status: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildLog {
    pub id: i32,
    #[serde(rename = "type")]
    pub log_type: Option<String>,
    pub line_count: Option<i64>,
    pub created_on: Option<String>,
    pub last_changed_on: Option<String>,
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// # Run Body
    ///
    /// Tests the request body built for a pipeline run.
    ///
    /// ## Test Scenario
    /// - Builds bodies with and without branch, variables and parameters
    ///
    /// ## Expected Outcome
    /// - Only supplied sections appear, variables are wrapped in `{value}`
    #[test]
    fn test_run_pipeline_body() {
        let mut run = RunPipeline::default();
        assert_eq!(run.to_body(None), json!({}));

        run.variables.insert("env".to_string(), "prod".to_string());
        run.template_parameters
            .insert("deploy".to_string(), "true".to_string());
        assert_eq!(
            run.to_body(Some("refs/heads/main")),
            json!({
                "resources": {"repositories": {"self": {"refName": "refs/heads/main"}}},
                "variables": {"env": {"value": "prod"}},
                "templateParameters": {"deploy": "true"}
            })
        );
    }

    #[test]
    fn test_build_enums_query_values() {
        assert_eq!(BuildStatus::InProgress.as_query(), "inProgress");
        assert_eq!(BuildResult::PartiallySucceeded.as_query(), "partiallySucceeded");
        let query: BuildQuery =
            serde_json::from_value(json!({"status": "completed", "result": "failed"})).unwrap();
        assert_eq!(query.status, Some(BuildStatus::Completed));
        assert_eq!(query.result, Some(BuildResult::Failed));
    }

    #[test]
    fn test_build_definition_id_is_numeric() {
        let build: Build = serde_json::from_value(json!({
            "id": 120,
            "definition": {"id": 7, "name": "CI"}
        }))
        .unwrap();
        assert_eq!(build.definition.unwrap().id.as_deref(), Some("7"));
    }
}
