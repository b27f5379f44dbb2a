//! Team and project dashboards.

use url::Url;

use super::Scope;
use super::http::{AdoHttpClient, ServiceHost};
use super::pagination::ListResponse;
use crate::error::ApiResult;
use crate::models::dashboards::{CreateDashboardBody, Dashboard};
use crate::validation::{require_non_empty, validate_name};

const DASHBOARD_API_VERSION: &str = "7.1-preview.3";
const MAX_DASHBOARD_NAME_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct DashboardsClient {
    scope: Scope,
}

impl DashboardsClient {
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

    /// Team dashboards when `team` is given, project dashboards otherwise.
    fn url(&self, team: Option<&str>, path: &[&str]) -> ApiResult<Url> {
        let project = self.scope.project()?;
        let mut segments = vec!["dashboard", "dashboards"];
        segments.extend_from_slice(path);
        match team.map(str::trim).filter(|t| !t.is_empty()) {
            Some(team) => self
                .scope
                .http
                .team_url(ServiceHost::Core, &project, team, &segments),
            None => self
                .scope
                .http
                .project_url(ServiceHost::Core, &project, &segments),
        }
    }

    pub async fn list_dashboards(&self, team: Option<&str>) -> ApiResult<Vec<Dashboard>> {
        let url = self.url(team, &[])?;
        let list: ListResponse<Dashboard> = self
            .scope
            .http
            .get(url)
            .api_version(DASHBOARD_API_VERSION)
            .send_json()
            .await?;
        Ok(list.value)
    }

    pub async fn get_dashboard(&self, team: Option<&str>, id: &str) -> ApiResult<Dashboard> {
        let id = require_non_empty("dashboardId", id)?;
        let url = self.url(team, &[id])?;
        self.scope
            .http
            .get(url)
            .api_version(DASHBOARD_API_VERSION)
            .send_json()
            .await
    }

    pub async fn create_dashboard(
        &self,
        team: Option<&str>,
        name: &str,
        description: Option<&str>,
    ) -> ApiResult<Dashboard> {
        let name = validate_name("name", name, MAX_DASHBOARD_NAME_LEN)?;
        let url = self.url(team, &[])?;
        let body = CreateDashboardBody {
            name,
            description: description.map(str::trim).filter(|d| !d.is_empty()),
        };
        self.scope
            .http
            .post(url)
            .api_version(DASHBOARD_API_VERSION)
            .json(&body)
            .send_json()
            .await
    }

    pub async fn delete_dashboard(&self, team: Option<&str>, id: &str) -> ApiResult<()> {
        let id = require_non_empty("dashboardId", id)?;
        let url = self.url(team, &[id])?;
        self.scope
            .http
            .delete(url)
            .api_version(DASHBOARD_API_VERSION)
            .send_empty()
            .await
    }
}
