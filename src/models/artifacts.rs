use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ProjectReference;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feed {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub fully_qualified_name: Option<String>,
    pub fully_qualified_id: Option<String>,
    pub project: Option<ProjectReference>,
    pub upstream_enabled: Option<bool>,
    pub hide_deleted_package_versions: Option<bool>,
    pub is_read_only: Option<bool>,
    pub capabilities: Option<String>,
    pub view: Option<FeedView>,
    #[serde(default)]
    pub upstream_sources: Vec<UpstreamSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamSource {
    pub id: Option<String>,
    pub name: Option<String>,
    pub protocol: Option<String>,
    pub location: Option<String>,
    pub upstream_source_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedView {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub view_type: Option<String>,
    pub visibility: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: Option<String>,
    pub name: Option<String>,
    pub normalized_name: Option<String>,
    pub protocol_type: Option<String>,
    pub url: Option<String>,
    pub is_cached: Option<bool>,
    #[serde(default)]
    pub versions: Vec<PackageVersion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageVersion {
    pub id: Option<String>,
    pub version: Option<String>,
    pub normalized_version: Option<String>,
    pub is_latest: Option<bool>,
    pub is_listed: Option<bool>,
    pub is_deleted: Option<bool>,
    pub publish_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPermission {
    pub role: Option<String>,
    pub identity_descriptor: Option<String>,
    pub identity_id: Option<String>,
    pub display_name: Option<String>,
    pub is_inherited_role: Option<bool>,
}

/// Retention limits for a feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedRetentionPolicy {
    /// Maximum versions kept per package (1-5000).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count_limit: Option<i32>,
    /// Days to keep versions that were recently downloaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_to_keep_recently_downloaded_packages: Option<i32>,
}

/// Body for creating a feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeed {
    /// Feed name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether upstream sources (e.g. npmjs, nuget.org) are enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_deleted_package_versions: Option<bool>,
}

/// Fields to change on an existing feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_deleted_package_versions: Option<bool>,
}

impl FeedUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.upstream_enabled.is_none()
            && self.hide_deleted_package_versions.is_none()
    }
}

/// Filters for listing packages in a feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackageQuery {
    /// Protocol filter: npm, nuget, maven, pypi, upack, cargo.
    #[serde(default)]
    pub protocol_type: Option<String>,
    /// Substring match on the package name.
    #[serde(default)]
    pub package_name_query: Option<String>,
    #[serde(default)]
    pub include_all_versions: Option<bool>,
    #[serde(default)]
    pub top: Option<i32>,
    #[serde(default)]
    pub skip: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum FeedViewVisibility {
    #[default]
    Private,
    Collection,
    Organization,
    AadTenant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateFeedViewBody<'a> {
    pub name: &'a str,
    #[serde(rename = "type")]
    pub view_type: &'static str,
    pub visibility: FeedViewVisibility,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_feed_deserializes_sparse_payload() {
        let feed: Feed = serde_json::from_value(json!({
            "id": "6f1b",
            "name": "internal",
            "upstreamEnabled": true,
            "view": {"id": "v1", "name": "Release", "type": "release"}
        }))
        .unwrap();
        assert_eq!(feed.name.as_deref(), Some("internal"));
        assert_eq!(feed.upstream_enabled, Some(true));
        assert_eq!(feed.view.unwrap().view_type.as_deref(), Some("release"));
        assert!(feed.upstream_sources.is_empty());
    }

    #[test]
    fn test_create_feed_omits_unset_fields() {
        let body = CreateFeed {
            name: "internal".to_string(),
            upstream_enabled: Some(false),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"name": "internal", "upstreamEnabled": false})
        );
    }

    #[test]
    fn test_feed_update_is_empty() {
        assert!(FeedUpdate::default().is_empty());
        assert!(
            !FeedUpdate {
                description: Some("d".to_string()),
                ..Default::default()
            }
            .is_empty()
        );
    }
}
