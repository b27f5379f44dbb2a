//! Feed and package tools.

use schemars::JsonSchema;
use serde::Deserialize;

use super::ProjectScoped;
use crate::api::ArtifactsClient;
use crate::mcp::registry::ToolRegistry;
use crate::models::artifacts::{
    CreateFeed, FeedRetentionPolicy, FeedUpdate, FeedViewVisibility, PackageQuery,
};

/// Which feeds a call addresses.
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct FeedScope {
    /// Project name or id; defaults to the configured project.
    #[serde(default)]
    project: Option<String>,
    /// Use organization-scoped feeds even when a default project is configured.
    #[serde(default)]
    organization_scope: bool,
}

impl FeedScope {
    fn client(&self, client: &ArtifactsClient) -> ArtifactsClient {
        if self.organization_scope {
            client.organization_scoped()
        } else {
            client.in_project(self.project.as_deref())
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct FeedArgs {
    /// Feed name or id.
    feed: String,
    #[serde(flatten)]
    scope: FeedScope,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct CreateFeedArgs {
    #[serde(flatten)]
    feed: CreateFeed,
    #[serde(flatten)]
    scope: FeedScope,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct UpdateFeedArgs {
    feed: String,
    #[serde(flatten)]
    update: FeedUpdate,
    #[serde(flatten)]
    scope: FeedScope,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ListPackagesArgs {
    feed: String,
    #[serde(flatten)]
    query: PackageQuery,
    #[serde(flatten)]
    scope: FeedScope,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct GetPackageArgs {
    feed: String,
    package_id: String,
    #[serde(default)]
    include_all_versions: bool,
    #[serde(flatten)]
    scope: FeedScope,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct CreateViewArgs {
    feed: String,
    /// View name, e.g. "Release".
    name: String,
    #[serde(default)]
    visibility: FeedViewVisibility,
    #[serde(flatten)]
    scope: FeedScope,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ViewArgs {
    feed: String,
    /// View name or id.
    view: String,
    #[serde(flatten)]
    scope: FeedScope,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct SetRetentionArgs {
    feed: String,
    #[serde(flatten)]
    policy: FeedRetentionPolicy,
    #[serde(flatten)]
    scope: FeedScope,
}

pub fn register_artifacts_tools(registry: &mut ToolRegistry, client: &ArtifactsClient) {
    let c = client.clone();
    registry.register_read(
        "artifacts_list_feeds",
        "List package feeds; project-scoped when a project is set, organization feeds otherwise or when organizationScope is true.",
        move |args: FeedScope| {
            let client = args.client(&c);
            async move { client.list_feeds().await }
        },
    );

    let c = client.clone();
    registry.register_read("artifacts_get_feed", "Get a feed by name or id.", move |args: FeedArgs| {
        let client = args.scope.client(&c);
        async move { client.get_feed(&args.feed).await }
    });

    let c = client.clone();
    registry.register_write(
        "artifacts_create_feed",
        "Create a package feed.",
        move |args: CreateFeedArgs| {
            let client = args.scope.client(&c);
            async move { client.create_feed(&args.feed).await }
        },
    );

    let c = client.clone();
    registry.register_write(
        "artifacts_update_feed",
        "Update a feed's description or settings.",
        move |args: UpdateFeedArgs| {
            let client = args.scope.client(&c);
            async move { client.update_feed(&args.feed, &args.update).await }
        },
    );

    let c = client.clone();
    registry.register_destructive(
        "artifacts_delete_feed",
        "Delete a feed and all of its packages.",
        move |args: FeedArgs| {
            let client = args.scope.client(&c);
            async move { client.delete_feed(&args.feed).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "artifacts_list_packages",
        "List packages in a feed, optionally filtered by protocol and name.",
        move |args: ListPackagesArgs| {
            let client = args.scope.client(&c);
            async move { client.list_packages(&args.feed, &args.query).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "artifacts_get_package",
        "Get one package, optionally with every version.",
        move |args: GetPackageArgs| {
            let client = args.scope.client(&c);
            async move {
                client
                    .get_package(&args.feed, &args.package_id, args.include_all_versions)
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_read(
        "artifacts_list_feed_views",
        "List the views of a feed.",
        move |args: FeedArgs| {
            let client = args.scope.client(&c);
            async move { client.list_feed_views(&args.feed).await }
        },
    );

    let c = client.clone();
    registry.register_write(
        "artifacts_create_feed_view",
        "Create a feed view.",
        move |args: CreateViewArgs| {
            let client = args.scope.client(&c);
            async move {
                client
                    .create_feed_view(&args.feed, &args.name, args.visibility)
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_destructive(
        "artifacts_delete_feed_view",
        "Delete a feed view.",
        move |args: ViewArgs| {
            let client = args.scope.client(&c);
            async move { client.delete_feed_view(&args.feed, &args.view).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "artifacts_get_feed_permissions",
        "List the role assignments on a feed.",
        move |args: FeedArgs| {
            let client = args.scope.client(&c);
            async move { client.get_feed_permissions(&args.feed).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "artifacts_get_retention_policy",
        "Get a feed's retention policy.",
        move |args: FeedArgs| {
            let client = args.scope.client(&c);
            async move { client.get_retention_policy(&args.feed).await }
        },
    );

    let c = client.clone();
    registry.register_write(
        "artifacts_set_retention_policy",
        "Set how many versions per package a feed keeps (1-5000).",
        move |args: SetRetentionArgs| {
            let client = args.scope.client(&c);
            async move { client.set_retention_policy(&args.feed, &args.policy).await }
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::mock_http;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// # Flattened Arguments
    ///
    /// Tests that feed creation arguments reach the request body.
    ///
    /// ## Test Scenario
    /// - Calls `artifacts_create_feed` with name and description plus a project
    ///
    /// ## Expected Outcome
    /// - The project-scoped feeds endpoint receives the flattened fields
    #[tokio::test]
    async fn test_create_feed_tool() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contoso/Fabrikam/_apis/packaging/feeds"))
            .and(body_json(json!({"name": "internal", "description": "team packages"})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"id": "f1", "name": "internal"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut registry = ToolRegistry::new(false);
        register_artifacts_tools(&mut registry, &ArtifactsClient::new(mock_http(&server), None));

        let outcome = registry
            .call(
                "artifacts_create_feed",
                Some(json!({
                    "name": "internal",
                    "description": "team packages",
                    "project": "Fabrikam"
                })),
            )
            .await
            .unwrap();
        assert!(outcome.envelope.is_success(), "{:?}", outcome.envelope);
        assert_eq!(outcome.envelope.data.unwrap()["id"], "f1");

        let schema = &registry.definitions()[2].input_schema;
        assert!(schema["properties"]["name"].is_object());
        assert!(schema["properties"]["project"].is_object());
    }

    /// # Organization Feeds With A Default Project
    ///
    /// Tests reaching organization-scoped feeds when a project is configured.
    ///
    /// ## Test Scenario
    /// - The client defaults to Fabrikam
    /// - Lists feeds once plainly and once with `organizationScope: true`
    ///
    /// ## Expected Outcome
    /// - The plain call hits the project feeds, the scoped call the organization feeds
    #[tokio::test]
    async fn test_list_feeds_organization_scope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contoso/Fabrikam/_apis/packaging/feeds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "value": [{"id": "p1", "name": "project-feed"}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/contoso/_apis/packaging/feeds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "value": [{"id": "o1", "name": "org-feed"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut registry = ToolRegistry::new(false);
        let client = ArtifactsClient::new(mock_http(&server), Some("Fabrikam".to_string()));
        register_artifacts_tools(&mut registry, &client);

        let project = registry.call("artifacts_list_feeds", None).await.unwrap();
        assert_eq!(project.envelope.data.unwrap()[0]["name"], "project-feed");

        let organization = registry
            .call("artifacts_list_feeds", Some(json!({"organizationScope": true})))
            .await
            .unwrap();
        assert!(organization.envelope.is_success(), "{:?}", organization.envelope);
        assert_eq!(organization.envelope.data.unwrap()[0]["name"], "org-feed");

        assert_eq!(client.organization_scoped().project(), None);
        assert_eq!(client.project(), Some("Fabrikam"));
    }
}
