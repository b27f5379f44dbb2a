//! Azure DevOps REST clients.
//!
//! Every domain client wraps the same [`AdoHttpClient`] (one authenticated
//! connection per organization) plus an optional default project, and maps
//! each public method onto one REST call.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ado_mcp::api::{AdoHttpClient, ConnectionSettings, DomainClients};
//! use secrecy::SecretString;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = ConnectionSettings::new("contoso", SecretString::from("my-pat".to_string()));
//! let clients = DomainClients::new(AdoHttpClient::new(settings)?, Some("Fabrikam".to_string()));
//!
//! let repos = clients.repos.list_repositories().await?;
//! println!("Found {} repositories", repos.len());
//! # Ok(())
//! # }
//! ```

mod artifacts;
mod boards;
mod credential;
mod dashboards;
mod http;
pub mod pagination;
mod pipelines;
mod project_settings;
mod repos;
pub mod retry;
mod search;
mod test_plans;
mod wiki;

pub use artifacts::ArtifactsClient;
pub use boards::BoardsClient;
pub use credential::PatCredential;
pub use dashboards::DashboardsClient;
pub use http::{
    AdoHttpClient, ConnectionSettings, DEFAULT_API_VERSION, RawResponse, RequestSpec, ServiceHost,
};
pub use pipelines::PipelinesClient;
pub use project_settings::ProjectSettingsClient;
pub use repos::ReposClient;
pub use retry::RetryPolicy;
pub use search::SearchClient;
pub use test_plans::TestPlansClient;
pub use wiki::WikiClient;

use crate::error::ApiResult;
use crate::validation::resolve_project;

/// One client per domain, all sharing a single connection.
#[derive(Debug, Clone)]
pub struct DomainClients {
    pub artifacts: ArtifactsClient,
    pub boards: BoardsClient,
    pub dashboards: DashboardsClient,
    pub repos: ReposClient,
    pub pipelines: PipelinesClient,
    pub search: SearchClient,
    pub wiki: WikiClient,
    pub test_plans: TestPlansClient,
    pub project_settings: ProjectSettingsClient,
}

impl DomainClients {
    pub fn new(http: AdoHttpClient, project: Option<String>) -> Self {
        Self {
            artifacts: ArtifactsClient::new(http.clone(), project.clone()),
            boards: BoardsClient::new(http.clone(), project.clone()),
            dashboards: DashboardsClient::new(http.clone(), project.clone()),
            repos: ReposClient::new(http.clone(), project.clone()),
            pipelines: PipelinesClient::new(http.clone(), project.clone()),
            search: SearchClient::new(http.clone(), project.clone()),
            wiki: WikiClient::new(http.clone(), project.clone()),
            test_plans: TestPlansClient::new(http.clone(), project.clone()),
            project_settings: ProjectSettingsClient::new(http, project),
        }
    }
}

/// Connection plus default project; the common core of every domain client.
#[derive(Debug, Clone)]
pub(crate) struct Scope {
    pub http: AdoHttpClient,
    pub project: Option<String>,
}

impl Scope {
    pub fn new(http: AdoHttpClient, project: Option<String>) -> Self {
        let project = project
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        Self { http, project }
    }

    pub fn with_project(&self, project: &str) -> Self {
        Self::new(self.http.clone(), Some(project.to_string()))
    }

    /// The project every project-scoped call needs.
    pub fn project(&self) -> ApiResult<String> {
        Ok(resolve_project(None, self.project.as_deref())?)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use secrecy::SecretString;
    use wiremock::MockServer;

    /// Connection to a mock server with retries disabled.
    pub fn mock_http(server: &MockServer) -> AdoHttpClient {
        let settings = ConnectionSettings::new("contoso", SecretString::from("pat".to_string()))
            .with_base_url(server.uri())
            .with_retry(RetryPolicy::none());
        AdoHttpClient::new(settings).unwrap()
    }
}
