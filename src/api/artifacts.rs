//! Azure Artifacts feeds, packages, views, permissions and retention.
//!
//! Feeds live on the `feeds.dev.azure.com` host and can be scoped either to
//! the organization or to a project, so unlike the other clients a missing
//! project is not an error here.

use url::Url;

use super::Scope;
use super::http::{AdoHttpClient, ServiceHost};
use super::pagination::ListResponse;
use crate::error::{ApiResult, ValidationError};
use crate::models::artifacts::{
    CreateFeed, CreateFeedViewBody, Feed, FeedPermission, FeedRetentionPolicy, FeedUpdate,
    FeedView, FeedViewVisibility, Package, PackageQuery,
};
use crate::validation::{require_non_empty, validate_name, validate_top};

const MAX_FEED_NAME_LEN: usize = 64;
const MAX_RETENTION_COUNT: i32 = 5000;
const MAX_PACKAGE_PAGE: i32 = 1000;

#[derive(Debug, Clone)]
pub struct ArtifactsClient {
    scope: Scope,
}

impl ArtifactsClient {
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

    /// A clone that ignores the default project and addresses organization feeds.
    pub fn organization_scoped(&self) -> Self {
        Self {
            scope: Scope::new(self.scope.http.clone(), None),
        }
    }

    pub fn project(&self) -> Option<&str> {
        self.scope.project.as_deref()
    }

    fn url(&self, path: &[&str]) -> ApiResult<Url> {
        let mut segments = vec!["packaging"];
        segments.extend_from_slice(path);
        match &self.scope.project {
            Some(project) => self
                .scope
                .http
                .project_url(ServiceHost::Feeds, project, &segments),
            None => self.scope.http.org_url(ServiceHost::Feeds, &segments),
        }
    }

    pub async fn list_feeds(&self) -> ApiResult<Vec<Feed>> {
        let url = self.url(&["feeds"])?;
        let list: ListResponse<Feed> = self.scope.http.get(url).send_json().await?;
        Ok(list.value)
    }

    pub async fn get_feed(&self, feed: &str) -> ApiResult<Feed> {
        let feed = require_non_empty("feed", feed)?;
        let url = self.url(&["feeds", feed])?;
        self.scope.http.get(url).send_json().await
    }

    pub async fn create_feed(&self, request: &CreateFeed) -> ApiResult<Feed> {
        let name = validate_name("name", &request.name, MAX_FEED_NAME_LEN)?;
        let body = CreateFeed {
            name: name.to_string(),
            ..request.clone()
        };
        let url = self.url(&["feeds"])?;
        self.scope.http.post(url).json(&body).send_json().await
    }

    /// Patch the supplied fields of a feed. At least one field must be set.
    pub async fn update_feed(&self, feed: &str, update: &FeedUpdate) -> ApiResult<Feed> {
        let feed = require_non_empty("feed", feed)?;
        if update.is_empty() {
            return Err(ValidationError::Empty {
                field: "update".to_string(),
            }
            .into());
        }
        if let Some(name) = &update.name {
            validate_name("name", name, MAX_FEED_NAME_LEN)?;
        }
        let url = self.url(&["feeds", feed])?;
        self.scope.http.patch(url).json(update).send_json().await
    }

    pub async fn delete_feed(&self, feed: &str) -> ApiResult<()> {
        let feed = require_non_empty("feed", feed)?;
        let url = self.url(&["feeds", feed])?;
        self.scope.http.delete(url).send_empty().await
    }

    pub async fn list_packages(&self, feed: &str, query: &PackageQuery) -> ApiResult<Vec<Package>> {
        let feed = require_non_empty("feed", feed)?;
        if let Some(top) = query.top {
            validate_top("top", top, MAX_PACKAGE_PAGE)?;
        }
        let url = self.url(&["feeds", feed, "packages"])?;
        let list: ListResponse<Package> = self
            .scope
            .http
            .get(url)
            .query_opt("protocolType", query.protocol_type.as_deref())
            .query_opt("packageNameQuery", query.package_name_query.as_deref())
            .query_opt("includeAllVersions", query.include_all_versions)
            .query_opt("$top", query.top)
            .query_opt("$skip", query.skip.filter(|s| *s > 0))
            .send_json()
            .await?;
        Ok(list.value)
    }

    pub async fn get_package(
        &self,
        feed: &str,
        package_id: &str,
        include_all_versions: bool,
    ) -> ApiResult<Package> {
        let feed = require_non_empty("feed", feed)?;
        let package_id = require_non_empty("packageId", package_id)?;
        let url = self.url(&["feeds", feed, "packages", package_id])?;
        self.scope
            .http
            .get(url)
            .query("includeAllVersions", include_all_versions)
            .send_json()
            .await
    }

    pub async fn list_feed_views(&self, feed: &str) -> ApiResult<Vec<FeedView>> {
        let feed = require_non_empty("feed", feed)?;
        let url = self.url(&["feeds", feed, "views"])?;
        let list: ListResponse<FeedView> = self.scope.http.get(url).send_json().await?;
        Ok(list.value)
    }

    /// Create a release view such as `@Prerelease` or `@Release`.
    pub async fn create_feed_view(
        &self,
        feed: &str,
        name: &str,
        visibility: FeedViewVisibility,
    ) -> ApiResult<FeedView> {
        let feed = require_non_empty("feed", feed)?;
        let name = validate_name("name", name, MAX_FEED_NAME_LEN)?;
        let url = self.url(&["feeds", feed, "views"])?;
        let body = CreateFeedViewBody {
            name,
            view_type: "release",
            visibility,
        };
        self.scope.http.post(url).json(&body).send_json().await
    }

    pub async fn delete_feed_view(&self, feed: &str, view: &str) -> ApiResult<()> {
        let feed = require_non_empty("feed", feed)?;
        let view = require_non_empty("view", view)?;
        let url = self.url(&["feeds", feed, "views", view])?;
        self.scope.http.delete(url).send_empty().await
    }

    pub async fn get_feed_permissions(&self, feed: &str) -> ApiResult<Vec<FeedPermission>> {
        let feed = require_non_empty("feed", feed)?;
        let url = self.url(&["feeds", feed, "permissions"])?;
        let list: ListResponse<FeedPermission> = self.scope.http.get(url).send_json().await?;
        Ok(list.value)
    }

    pub async fn get_retention_policy(&self, feed: &str) -> ApiResult<FeedRetentionPolicy> {
        let feed = require_non_empty("feed", feed)?;
        let url = self.url(&["feeds", feed, "retentionpolicies"])?;
        self.scope.http.get(url).send_json().await
    }

    pub async fn set_retention_policy(
        &self,
        feed: &str,
        policy: &FeedRetentionPolicy,
    ) -> ApiResult<FeedRetentionPolicy> {
        let feed = require_non_empty("feed", feed)?;
        if let Some(count) = policy.count_limit {
            validate_top("countLimit", count, MAX_RETENTION_COUNT)?;
        }
        if let Some(days) = policy.days_to_keep_recently_downloaded_packages
            && days < 1
        {
            return Err(ValidationError::OutOfRange {
                field: "daysToKeepRecentlyDownloadedPackages".to_string(),
                min: 1,
                max: i32::MAX as i64,
                value: days as i64,
            }
            .into());
        }
        let url = self.url(&["feeds", feed, "retentionpolicies"])?;
        self.scope.http.put(url).json(policy).send_json().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::mock_http;
    use crate::error::ApiError;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// # Feed Scope
    ///
    /// Tests organization and project scoped feed URLs.
    ///
    /// ## Test Scenario
    /// - Lists feeds without a project, then with one
    ///
    /// ## Expected Outcome
    /// - The project segment appears only when a project is configured
    #[tokio::test]
    async fn test_list_feeds_scopes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contoso/_apis/packaging/feeds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "value": [{"id": "f1", "name": "org-feed"}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/contoso/Fabrikam/_apis/packaging/feeds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "value": [{"id": "f2", "name": "project-feed"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ArtifactsClient::new(mock_http(&server), None);
        let feeds = client.list_feeds().await.unwrap();
        assert_eq!(feeds[0].name.as_deref(), Some("org-feed"));

        let feeds = client.for_project("Fabrikam").list_feeds().await.unwrap();
        assert_eq!(feeds[0].name.as_deref(), Some("project-feed"));
    }

    #[tokio::test]
    async fn test_create_feed_trims_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contoso/_apis/packaging/feeds"))
            .and(body_json(json!({"name": "internal", "upstreamEnabled": true})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "f1", "name": "internal"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ArtifactsClient::new(mock_http(&server), None);
        let feed = client
            .create_feed(&CreateFeed {
                name: " internal ".to_string(),
                upstream_enabled: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(feed.id.as_deref(), Some("f1"));
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = ArtifactsClient::new(mock_http(&server), None);
        let err = client
            .create_feed(&CreateFeed {
                name: "bad/name".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(ValidationError::InvalidCharacters { .. })));

        let err = client
            .update_feed("f1", &FeedUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(ValidationError::Empty { .. })));
    }

    #[tokio::test]
    async fn test_list_packages_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contoso/_apis/packaging/feeds/internal/packages"))
            .and(query_param("protocolType", "npm"))
            .and(query_param("packageNameQuery", "left"))
            .and(query_param("$top", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "value": [{"id": "p1", "name": "left-pad", "versions": [{"version": "1.3.0", "isLatest": true}]}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ArtifactsClient::new(mock_http(&server), None);
        let packages = client
            .list_packages(
                "internal",
                &PackageQuery {
                    protocol_type: Some("npm".to_string()),
                    package_name_query: Some("left".to_string()),
                    top: Some(50),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(packages[0].versions[0].version.as_deref(), Some("1.3.0"));
    }

    #[tokio::test]
    async fn test_create_feed_view_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contoso/_apis/packaging/feeds/internal/views"))
            .and(body_json(json!({"name": "Release", "type": "release", "visibility": "organization"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "v1", "name": "Release"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ArtifactsClient::new(mock_http(&server), None);
        let view = client
            .create_feed_view("internal", "Release", FeedViewVisibility::Organization)
            .await
            .unwrap();
        assert_eq!(view.id.as_deref(), Some("v1"));
    }

    /// # Retention Limit
    ///
    /// Tests the accepted range for the retention count limit.
    ///
    /// ## Test Scenario
    /// - Sets a limit of 0, then 5001, then a valid 20
    ///
    /// ## Expected Outcome
    /// - Out-of-range values fail locally, the valid one is PUT
    #[tokio::test]
    async fn test_set_retention_policy_range() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/contoso/_apis/packaging/feeds/internal/retentionpolicies"))
            .and(body_json(json!({"countLimit": 20})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"countLimit": 20})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ArtifactsClient::new(mock_http(&server), None);
        for bad in [0, 5001] {
            let policy = FeedRetentionPolicy {
                count_limit: Some(bad),
                ..Default::default()
            };
            assert!(matches!(
                client.set_retention_policy("internal", &policy).await,
                Err(ApiError::Validation(ValidationError::OutOfRange { .. }))
            ));
        }

        let policy = FeedRetentionPolicy {
            count_limit: Some(20),
            ..Default::default()
        };
        let saved = client.set_retention_policy("internal", &policy).await.unwrap();
        assert_eq!(saved.count_limit, Some(20));
    }
}
