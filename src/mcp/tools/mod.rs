//! Tool catalogue: one registration function per Azure DevOps domain.
//!
//! Tools are named `<domain>_<operation>`. Every tool that works inside a
//! project takes an optional `project` argument which overrides the
//! configured default for that single call.

mod artifacts;
mod boards;
mod pipelines;
mod project_settings;
mod repos;
mod search;
mod test_plans;
mod wiki;

pub use artifacts::register_artifacts_tools;
pub use boards::register_boards_tools;
pub use pipelines::register_pipelines_tools;
pub use project_settings::register_project_settings_tools;
pub use repos::register_repos_tools;
pub use search::register_search_tools;
pub use test_plans::register_test_plans_tools;
pub use wiki::register_wiki_tools;

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::debug;

use super::registry::ToolRegistry;
use crate::api::{
    ArtifactsClient, BoardsClient, DashboardsClient, DomainClients, PipelinesClient,
    ProjectSettingsClient, ReposClient, SearchClient, TestPlansClient, WikiClient,
};
use crate::config::Domain;

/// Arguments of tools that take nothing but the project override.
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectArgs {
    /// Project name or id; defaults to the configured project.
    #[serde(default)]
    pub project: Option<String>,
}

/// A client that can be re-pointed at another project for one call.
pub(crate) trait ProjectScoped: Clone {
    fn scoped_to(&self, project: &str) -> Self;

    fn in_project(&self, project: Option<&str>) -> Self {
        match project.map(str::trim).filter(|p| !p.is_empty()) {
            Some(project) => self.scoped_to(project),
            None => self.clone(),
        }
    }
}

macro_rules! project_scoped {
    ($($client:ty),* $(,)?) => {
        $(
            impl ProjectScoped for $client {
                fn scoped_to(&self, project: &str) -> Self {
                    self.for_project(project)
                }
            }
        )*
    };
}

project_scoped!(
    ArtifactsClient,
    BoardsClient,
    DashboardsClient,
    PipelinesClient,
    ProjectSettingsClient,
    ReposClient,
    SearchClient,
    TestPlansClient,
    WikiClient,
);

/// Register the tools of every enabled domain.
pub fn build_registry(clients: &DomainClients, domains: &[Domain], read_only: bool) -> ToolRegistry {
    let mut registry = ToolRegistry::new(read_only);
    for domain in domains {
        match domain {
            Domain::Artifacts => register_artifacts_tools(&mut registry, &clients.artifacts),
            Domain::Boards => register_boards_tools(&mut registry, &clients.boards),
            Domain::Repos => register_repos_tools(&mut registry, &clients.repos),
            Domain::Pipelines => register_pipelines_tools(&mut registry, &clients.pipelines),
            Domain::Search => register_search_tools(&mut registry, &clients.search),
            Domain::Wiki => register_wiki_tools(&mut registry, &clients.wiki),
            Domain::TestPlans => register_test_plans_tools(&mut registry, &clients.test_plans),
            Domain::ProjectSettings => register_project_settings_tools(
                &mut registry,
                &clients.project_settings,
                &clients.dashboards,
            ),
        }
        debug!(domain = %domain, total = registry.len(), "Registered domain tools");
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::mock_http;
    use serde_json::json;
    use std::collections::HashSet;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn clients(server: &MockServer, project: Option<&str>) -> DomainClients {
        DomainClients::new(mock_http(server), project.map(str::to_string))
    }

    /// # Full Catalogue
    ///
    /// Tests the registry built with every domain enabled.
    ///
    /// ## Test Scenario
    /// - Builds the registry for all domains, then in read-only mode
    ///
    /// ## Expected Outcome
    /// - Names are unique and prefixed by their domain
    /// - Read-only mode keeps the read tools and drops every write tool
    #[tokio::test]
    async fn test_build_registry_all_domains() {
        let server = MockServer::start().await;
        let clients = clients(&server, Some("Fabrikam")).await;

        let registry = build_registry(&clients, &Domain::ALL, false);
        let definitions = registry.definitions();
        let names: HashSet<_> = definitions.iter().map(|d| d.name.clone()).collect();
        assert_eq!(names.len(), definitions.len());

        let prefixes = [
            "artifacts_",
            "boards_",
            "repos_",
            "pipelines_",
            "search_",
            "wiki_",
            "testplans_",
            "projectsettings_",
            "dashboards_",
        ];
        for definition in &definitions {
            assert!(
                prefixes.iter().any(|p| definition.name.starts_with(p)),
                "unexpected tool name {}",
                definition.name
            );
            assert_eq!(definition.input_schema["type"], "object", "{}", definition.name);
        }
        for expected in [
            "boards_get_work_item",
            "repos_create_pull_request",
            "pipelines_get_build_log",
            "search_code",
            "wiki_get_page",
            "testplans_list_plans",
            "projectsettings_list_teams",
            "dashboards_list",
        ] {
            assert!(names.contains(expected), "missing {}", expected);
        }

        let read_only = build_registry(&clients, &Domain::ALL, true);
        assert!(read_only.len() < registry.len());
        assert!(read_only.contains("repos_list_repositories"));
        assert!(!read_only.contains("repos_delete_repository"));
        assert!(
            read_only
                .definitions()
                .iter()
                .all(|d| d.annotations.read_only_hint)
        );
    }

    #[tokio::test]
    async fn test_build_registry_selected_domains() {
        let server = MockServer::start().await;
        let clients = clients(&server, None).await;

        let registry = build_registry(&clients, &[Domain::Search], false);
        assert!(registry.definitions().iter().all(|d| d.name.starts_with("search_")));
        assert!(!registry.is_empty());
    }

    /// # Project Override
    ///
    /// Tests that the `project` argument redirects a single call.
    ///
    /// ## Test Scenario
    /// - Default project is Fabrikam, the call asks for Contoso
    /// - A second call without a project uses the default
    ///
    /// ## Expected Outcome
    /// - Each request hits the matching project path
    #[tokio::test]
    async fn test_project_override() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contoso/Contoso/_apis/git/repositories"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"count": 1, "value": [{"id": "r1", "name": "api"}]})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/contoso/Fabrikam/_apis/git/repositories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 0, "value": []})))
            .expect(1)
            .mount(&server)
            .await;

        let clients = clients(&server, Some("Fabrikam")).await;
        let registry = build_registry(&clients, &[Domain::Repos], false);

        let outcome = registry
            .call("repos_list_repositories", Some(json!({"project": "Contoso"})))
            .await
            .unwrap();
        assert!(outcome.envelope.is_success());
        assert_eq!(outcome.envelope.data.unwrap()[0]["name"], "api");

        let outcome = registry.call("repos_list_repositories", None).await.unwrap();
        assert_eq!(outcome.envelope.data, Some(json!([])));
    }

    #[test]
    fn test_in_project_ignores_blank() {
        let server_uri = "http://localhost:1";
        let settings = crate::api::ConnectionSettings::new(
            "contoso",
            secrecy::SecretString::from("pat".to_string()),
        )
        .with_base_url(server_uri);
        let http = crate::api::AdoHttpClient::new(settings).unwrap();
        let client = ReposClient::new(http, Some("Fabrikam".to_string()));

        assert_eq!(client.in_project(Some("  ")).project(), Some("Fabrikam"));
        assert_eq!(client.in_project(Some("Contoso")).project(), Some("Contoso"));
        assert_eq!(client.in_project(None).project(), Some("Fabrikam"));
    }
}
