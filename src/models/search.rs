use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Maximum length of a search query accepted by the service.
pub const MAX_SEARCH_TEXT_CHARS: usize = 1000;
pub const MAX_SEARCH_TOP: i32 = 1000;
pub const DEFAULT_SEARCH_TOP: i32 = 25;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CodeSearch {
    /// Search text; supports the code search syntax (ext:, file:, path:).
    pub text: String,
    #[serde(default)]
    pub repositories: Vec<String>,
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub branches: Vec<String>,
    #[serde(default)]
    pub top: Option<i32>,
    #[serde(default)]
    pub skip: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemSearch {
    pub text: String,
    #[serde(default)]
    pub work_item_types: Vec<String>,
    #[serde(default)]
    pub states: Vec<String>,
    #[serde(default)]
    pub assigned_to: Vec<String>,
    #[serde(default)]
    pub top: Option<i32>,
    #[serde(default)]
    pub skip: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WikiSearch {
    pub text: String,
    /// Wiki names to restrict results to.
    #[serde(default)]
    pub wikis: Vec<String>,
    #[serde(default)]
    pub top: Option<i32>,
    #[serde(default)]
    pub skip: Option<i32>,
}

/// Wire body shared by the three search endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchRequest {
    pub search_text: String,
    #[serde(rename = "$top")]
    pub top: i32,
    #[serde(rename = "$skip")]
    pub skip: i32,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<&'static str, Vec<String>>,
    pub include_facets: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchProject {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRepository {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub repository_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchVersion {
    pub branch_name: Option<String>,
    pub change_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSearchResult {
    pub file_name: Option<String>,
    pub path: Option<String>,
    pub project: Option<SearchProject>,
    pub repository: Option<SearchRepository>,
    #[serde(default)]
    pub versions: Vec<SearchVersion>,
    pub content_id: Option<String>,
    pub matches: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub field_reference_name: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemSearchResult {
    pub project: Option<SearchProject>,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default)]
    pub hits: Vec<SearchHit>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchWiki {
    pub id: Option<String>,
    pub name: Option<String>,
    pub mapped_path: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiSearchResult {
    pub file_name: Option<String>,
    pub path: Option<String>,
    pub project: Option<SearchProject>,
    pub wiki: Option<SearchWiki>,
    #[serde(default)]
    pub hits: Vec<SearchHit>,
    pub content_id: Option<String>,
}

/// `{ count, results }` returned by every search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    pub info_code: Option<i32>,
}
