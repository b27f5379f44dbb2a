use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum WikiKind {
    /// The project wiki, stored in a hidden repository.
    #[default]
    ProjectWiki,
    /// Wiki published from a folder of a regular repository.
    CodeWiki,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wiki {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<WikiKind>,
    pub project_id: Option<String>,
    pub repository_id: Option<String>,
    pub mapped_path: Option<String>,
    pub remote_url: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWiki {
    pub name: String,
    #[serde(default)]
    pub kind: WikiKind,
    /// Backing repository, required for code wikis.
    #[serde(default)]
    pub repository_id: Option<String>,
    /// Folder inside the repository, code wikis only. Defaults to "/".
    #[serde(default)]
    pub mapped_path: Option<String>,
    /// Published branch, code wikis only.
    #[serde(default)]
    pub branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WikiVersion {
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateWikiBody {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: WikiKind,
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapped_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<WikiVersion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiPage {
    pub id: Option<i32>,
    pub path: Option<String>,
    pub content: Option<String>,
    pub git_item_path: Option<String>,
    pub is_parent_page: Option<bool>,
    pub order: Option<i32>,
    pub remote_url: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub sub_pages: Vec<WikiPage>,
}

/// A page together with the version (`ETag`) needed to update it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiPageWithETag {
    pub page: WikiPage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiPageDetail {
    pub id: Option<i32>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PagesBatchRequest {
    pub top: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wiki_kind_wire_values() {
        let wiki: Wiki =
            serde_json::from_value(json!({"id": "w1", "name": "Docs", "type": "codeWiki"})).unwrap();
        assert_eq!(wiki.kind, Some(WikiKind::CodeWiki));
        assert_eq!(
            serde_json::to_value(WikiKind::ProjectWiki).unwrap(),
            json!("projectWiki")
        );
    }

    #[test]
    fn test_page_with_etag_omits_missing_etag() {
        let value = serde_json::to_value(WikiPageWithETag::default()).unwrap();
        assert!(value.get("etag").is_none());
        assert!(value.get("page").is_some());
    }
}
