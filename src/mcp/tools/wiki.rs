//! Wiki and wiki page tools.

use schemars::JsonSchema;
use serde::Deserialize;

use super::{ProjectArgs, ProjectScoped};
use crate::api::WikiClient;
use crate::mcp::registry::ToolRegistry;
use crate::models::wiki::CreateWiki;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct WikiArgs {
    /// Wiki name or id.
    wiki: String,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct CreateWikiArgs {
    #[serde(flatten)]
    wiki: CreateWiki,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct GetPageArgs {
    wiki: String,
    /// Page path, e.g. "/Team/Onboarding".
    path: String,
    #[serde(default = "default_include_content")]
    include_content: bool,
    #[serde(default)]
    project: Option<String>,
}

fn default_include_content() -> bool {
    true
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct PutPageArgs {
    wiki: String,
    path: String,
    /// Markdown content of the page.
    content: String,
    /// ETag from a previous read; required when the page already exists.
    #[serde(default)]
    etag: Option<String>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct PageArgs {
    wiki: String,
    path: String,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ListPagesArgs {
    wiki: String,
    #[serde(default)]
    top: Option<i32>,
    /// Token returned by the previous call.
    #[serde(default)]
    continuation_token: Option<String>,
    #[serde(default)]
    project: Option<String>,
}

pub fn register_wiki_tools(registry: &mut ToolRegistry, client: &WikiClient) {
    let c = client.clone();
    registry.register_read("wiki_list_wikis", "List wikis.", move |args: ProjectArgs| {
        let client = c.in_project(args.project.as_deref());
        async move { client.list_wikis().await }
    });

    let c = client.clone();
    registry.register_read("wiki_get_wiki", "Get a wiki.", move |args: WikiArgs| {
        let client = c.in_project(args.project.as_deref());
        async move { client.get_wiki(&args.wiki).await }
    });

    let c = client.clone();
    registry.register_write(
        "wiki_create_wiki",
        "Create a project wiki or publish a code wiki.",
        move |args: CreateWikiArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.create_wiki(&args.wiki).await }
        },
    );

    let c = client.clone();
    registry.register_destructive(
        "wiki_delete_wiki",
        "Delete or unpublish a wiki.",
        move |args: WikiArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.delete_wiki(&args.wiki).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "wiki_get_page",
        "Read a wiki page and its ETag.",
        move |args: GetPageArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .get_page(&args.wiki, &args.path, args.include_content)
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_write(
        "wiki_create_or_update_page",
        "Create a page, or update it when an ETag is supplied.",
        move |args: PutPageArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .create_or_update_page(&args.wiki, &args.path, &args.content, args.etag.as_deref())
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_destructive(
        "wiki_delete_page",
        "Delete a wiki page.",
        move |args: PageArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.delete_page(&args.wiki, &args.path).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "wiki_list_pages",
        "List the pages of a wiki, one batch per call.",
        move |args: ListPagesArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .list_pages(&args.wiki, args.top, args.continuation_token)
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

    /// # Page Read Defaults
    ///
    /// Tests that `wiki_get_page` includes content unless told otherwise.
    ///
    /// ## Test Scenario
    /// - Calls the tool with only wiki and path
    ///
    /// ## Expected Outcome
    /// - `includeContent=true` is sent and the ETag is part of the data
    #[tokio::test]
    async fn test_get_page_tool() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contoso/Fabrikam/_apis/wiki/wikis/Docs/pages"))
            .and(query_param("path", "/Home"))
            .and(query_param("includeContent", "true"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("ETag", "\"v3\"")
                    .set_body_json(json!({"id": 1, "path": "/Home", "content": "Welcome"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut registry = ToolRegistry::new(false);
        register_wiki_tools(
            &mut registry,
            &WikiClient::new(mock_http(&server), Some("Fabrikam".to_string())),
        );

        let outcome = registry
            .call("wiki_get_page", Some(json!({"wiki": "Docs", "path": "Home"})))
            .await
            .unwrap();
        let data = outcome.envelope.data.unwrap();
        assert_eq!(data["etag"], "\"v3\"");
        assert_eq!(data["page"]["content"], "Welcome");
    }
}
