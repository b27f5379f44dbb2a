//! Projects, processes, teams and team settings.

use serde_json::json;
use tracing::debug;
use url::Url;

use super::Scope;
use super::http::{AdoHttpClient, ServiceHost};
use super::pagination::{
    DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE, ListResponse, collect_skip_paged,
};
use crate::error::{ApiError, ApiResult, ValidationError};
use crate::models::project_settings::{
    CreateProject, CreateProjectBody, Operation, OperationReference, Process, ProjectState,
    ProjectUpdate, TeamBody, TeamMember, TeamProject, TeamSetting, WebApiTeam,
};
use crate::validation::{require_non_empty, validate_name, validate_top};

const MAX_PROJECT_NAME_LEN: usize = 64;
const MAX_TEAM_NAME_LEN: usize = 64;
const MAX_LIST_TOP: i32 = 1000;

#[derive(Debug, Clone)]
pub struct ProjectSettingsClient {
    scope: Scope,
}

impl ProjectSettingsClient {
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

    fn projects_url(&self, path: &[&str]) -> ApiResult<Url> {
        let mut segments = vec!["projects"];
        segments.extend_from_slice(path);
        self.scope.http.org_url(ServiceHost::Core, &segments)
    }

    fn teams_url(&self, path: &[&str]) -> ApiResult<Url> {
        let project = self.scope.project()?;
        let mut segments = vec![project.as_str(), "teams"];
        segments.extend_from_slice(path);
        self.projects_url(&segments)
    }

    pub async fn list_projects(
        &self,
        state: Option<ProjectState>,
        top: Option<i32>,
        skip: Option<i32>,
    ) -> ApiResult<Vec<TeamProject>> {
        let (top, skip) = validate_window(top, skip)?;
        let url = self.projects_url(&[])?;
        let list: ListResponse<TeamProject> = self
            .scope
            .http
            .get(url)
            .query_opt("stateFilter", state.map(ProjectState::as_query))
            .query_opt("$top", top)
            .query_opt("$skip", skip)
            .send_json()
            .await?;
        Ok(list.value)
    }

    /// Look up a project by name or id.
    pub async fn get_project(
        &self,
        project: &str,
        include_capabilities: bool,
    ) -> ApiResult<TeamProject> {
        let project = require_non_empty("project", project)?;
        let url = self.projects_url(&[project])?;
        self.scope
            .http
            .get(url)
            .query_opt("includeCapabilities", include_capabilities.then_some(true))
            .send_json()
            .await
    }

    /// Queue project creation and return the long-running operation.
    ///
    /// Without an explicit process template the organization's default
    /// process is looked up first.
    pub async fn create_project(&self, request: &CreateProject) -> ApiResult<OperationReference> {
        let name = validate_name("name", &request.name, MAX_PROJECT_NAME_LEN)?;
        let template_id = match request
            .process_template_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
        {
            Some(id) => id.to_string(),
            None => self.default_process_id().await?,
        };

        let body = CreateProjectBody {
            name: name.to_string(),
            description: request.description.clone(),
            visibility: request.visibility,
            capabilities: json!({
                "versioncontrol": {"sourceControlType": request.source_control},
                "processTemplate": {"templateTypeId": template_id},
            }),
        };
        let url = self.projects_url(&[])?;
        let operation: OperationReference =
            self.scope.http.post(url).json(&body).send_json().await?;
        debug!(project = name, operation = ?operation.id, "Queued project creation");
        Ok(operation)
    }

    async fn default_process_id(&self) -> ApiResult<String> {
        self.list_processes()
            .await?
            .into_iter()
            .find(|p| p.is_default == Some(true))
            .and_then(|p| p.id)
            .ok_or_else(|| ApiError::NotFound {
                resource: "default process template".to_string(),
            })
    }

    pub async fn update_project(
        &self,
        project_id: &str,
        update: &ProjectUpdate,
    ) -> ApiResult<OperationReference> {
        let project_id = require_non_empty("projectId", project_id)?;
        if update.is_empty() {
            return Err(ValidationError::Empty {
                field: "update".to_string(),
            }
            .into());
        }
        if let Some(name) = &update.name {
            validate_name("name", name, MAX_PROJECT_NAME_LEN)?;
        }
        let url = self.projects_url(&[project_id])?;
        self.scope.http.patch(url).json(update).send_json().await
    }

    pub async fn delete_project(&self, project_id: &str) -> ApiResult<OperationReference> {
        let project_id = require_non_empty("projectId", project_id)?;
        let url = self.projects_url(&[project_id])?;
        self.scope.http.delete(url).send_json().await
    }

    pub async fn get_operation(&self, operation_id: &str) -> ApiResult<Operation> {
        let operation_id = require_non_empty("operationId", operation_id)?;
        let url = self
            .scope
            .http
            .org_url(ServiceHost::Core, &["operations", operation_id])?;
        self.scope.http.get(url).send_json().await
    }

    pub async fn list_processes(&self) -> ApiResult<Vec<Process>> {
        let url = self
            .scope
            .http
            .org_url(ServiceHost::Core, &["process", "processes"])?;
        let list: ListResponse<Process> = self.scope.http.get(url).send_json().await?;
        Ok(list.value)
    }

    pub async fn list_teams(
        &self,
        top: Option<i32>,
        skip: Option<i32>,
    ) -> ApiResult<Vec<WebApiTeam>> {
        let (top, skip) = validate_window(top, skip)?;
        let url = self.teams_url(&[])?;
        let list: ListResponse<WebApiTeam> = self
            .scope
            .http
            .get(url)
            .query_opt("$top", top)
            .query_opt("$skip", skip)
            .send_json()
            .await?;
        Ok(list.value)
    }

    pub async fn get_team(&self, team: &str) -> ApiResult<WebApiTeam> {
        let team = require_non_empty("team", team)?;
        let url = self.teams_url(&[team])?;
        self.scope.http.get(url).send_json().await
    }

    pub async fn create_team(&self, name: &str, description: Option<&str>) -> ApiResult<WebApiTeam> {
        let name = validate_name("name", name, MAX_TEAM_NAME_LEN)?;
        let body = TeamBody {
            name: Some(name),
            description,
        };
        let url = self.teams_url(&[])?;
        self.scope.http.post(url).json(&body).send_json().await
    }

    pub async fn update_team(
        &self,
        team: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> ApiResult<WebApiTeam> {
        let team = require_non_empty("team", team)?;
        if name.is_none() && description.is_none() {
            return Err(ValidationError::Empty {
                field: "update".to_string(),
            }
            .into());
        }
        let name = name
            .map(|n| validate_name("name", n, MAX_TEAM_NAME_LEN))
            .transpose()?;
        let body = TeamBody { name, description };
        let url = self.teams_url(&[team])?;
        self.scope.http.patch(url).json(&body).send_json().await
    }

    pub async fn delete_team(&self, team: &str) -> ApiResult<()> {
        let team = require_non_empty("team", team)?;
        let url = self.teams_url(&[team])?;
        self.scope.http.delete(url).send_empty().await
    }

    pub async fn list_team_members(
        &self,
        team: &str,
        top: Option<i32>,
        skip: Option<i32>,
    ) -> ApiResult<Vec<TeamMember>> {
        let team = require_non_empty("team", team)?;
        let (top, skip) = validate_window(top, skip)?;
        let url = self.teams_url(&[team, "members"])?;

        // No window requested: page through the whole team.
        if top.is_none() && skip.is_none() {
            return collect_skip_paged(DEFAULT_PAGE_SIZE, DEFAULT_MAX_PAGES, |top, skip| {
                let request = self
                    .scope
                    .http
                    .get(url.clone())
                    .query("$top", top)
                    .query("$skip", skip);
                async move {
                    let list: ListResponse<TeamMember> = request.send_json().await?;
                    Ok(list.value)
                }
            })
            .await;
        }

        let list: ListResponse<TeamMember> = self
            .scope
            .http
            .get(url)
            .query_opt("$top", top)
            .query_opt("$skip", skip)
            .send_json()
            .await?;
        Ok(list.value)
    }

    pub async fn get_team_settings(&self, team: &str) -> ApiResult<TeamSetting> {
        let team = require_non_empty("team", team)?;
        let project = self.scope.project()?;
        let url = self.scope.http.team_url(
            ServiceHost::Core,
            &project,
            team,
            &["work", "teamsettings"],
        )?;
        self.scope.http.get(url).send_json().await
    }
}

fn validate_window(
    top: Option<i32>,
    skip: Option<i32>,
) -> Result<(Option<i32>, Option<i32>), ValidationError> {
    let top = top
        .map(|t| validate_top("top", t, MAX_LIST_TOP))
        .transpose()?;
    if let Some(skip) = skip
        && skip < 0
    {
        return Err(ValidationError::OutOfRange {
            field: "skip".to_string(),
            min: 0,
            max: i32::MAX as i64,
            value: skip as i64,
        });
    }
    Ok((top, skip))
}
