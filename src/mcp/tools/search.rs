//! Code, work item and wiki search tools.

use schemars::JsonSchema;
use serde::Deserialize;

use super::ProjectScoped;
use crate::api::SearchClient;
use crate::mcp::registry::ToolRegistry;
use crate::models::search::{CodeSearch, WikiSearch, WorkItemSearch};

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct SearchArgs<S> {
    #[serde(flatten)]
    search: S,
    /// Limit results to this project; searches the whole organization when
    /// neither this nor a default project is set.
    #[serde(default)]
    project: Option<String>,
}

pub fn register_search_tools(registry: &mut ToolRegistry, client: &SearchClient) {
    let c = client.clone();
    registry.register_read(
        "search_code",
        "Search source code across repositories.",
        move |args: SearchArgs<CodeSearch>| {
            let client = c.in_project(args.project.as_deref());
            async move { client.search_code(&args.search).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "search_work_items",
        "Full-text search over work items.",
        move |args: SearchArgs<WorkItemSearch>| {
            let client = c.in_project(args.project.as_deref());
            async move { client.search_work_items(&args.search).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "search_wiki",
        "Full-text search over wiki pages.",
        move |args: SearchArgs<WikiSearch>| {
            let client = c.in_project(args.project.as_deref());
            async move { client.search_wiki(&args.search).await }
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::mock_http;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn registry(server: &MockServer) -> ToolRegistry {
        let mut registry = ToolRegistry::new(true);
        register_search_tools(&mut registry, &SearchClient::new(mock_http(server), None));
        registry
    }

    /// # Organization-wide Search
    ///
    /// Tests a search without any project.
    ///
    /// ## Test Scenario
    /// - Calls `search_work_items` with only `text`
    ///
    /// ## Expected Outcome
    /// - The organization endpoint is used and the hit count is returned
    #[tokio::test]
    async fn test_search_work_items_tool() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contoso/_apis/search/workitemsearchresults"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"count": 3, "results": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let outcome = registry(&server)
            .call("search_work_items", Some(json!({"text": "login timeout"})))
            .await
            .unwrap();
        assert!(outcome.envelope.is_success(), "{:?}", outcome.envelope);
        assert_eq!(outcome.envelope.data.unwrap()["count"], 3);
    }

    #[tokio::test]
    async fn test_blank_search_text_rejected() {
        let server = MockServer::start().await;
        let outcome = registry(&server)
            .call("search_code", Some(json!({"text": "   "})))
            .await
            .unwrap();
        assert!(!outcome.envelope.is_success());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn test_search_tools_are_read_only() {
        let settings = crate::api::ConnectionSettings::new(
            "contoso",
            secrecy::SecretString::from("pat".to_string()),
        );
        let client = SearchClient::new(crate::api::AdoHttpClient::new(settings).unwrap(), None);
        let mut registry = ToolRegistry::new(true);
        register_search_tools(&mut registry, &client);
        assert_eq!(registry.len(), 3);
    }
}
