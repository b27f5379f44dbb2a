//! Code, work item and wiki search on the `almsearch.dev.azure.com` host.

use std::collections::BTreeMap;
use url::Url;

use super::Scope;
use super::http::{AdoHttpClient, ServiceHost};
use crate::error::{ApiResult, ValidationError};
use crate::models::search::{
    CodeSearch, CodeSearchResult, DEFAULT_SEARCH_TOP, MAX_SEARCH_TEXT_CHARS, MAX_SEARCH_TOP,
    SearchRequest, SearchResponse, WikiSearch, WikiSearchResult, WorkItemSearch,
    WorkItemSearchResult,
};
use crate::validation::{require_non_empty, validate_top};

#[derive(Debug, Clone)]
pub struct SearchClient {
    scope: Scope,
}

impl SearchClient {
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

    pub fn project(&self) -> Option<&str> {
        self.scope.project.as_deref()
    }

    fn url(&self, endpoint: &str) -> ApiResult<Url> {
        let path = ["search", endpoint];
        match &self.scope.project {
            Some(project) => self
                .scope
                .http
                .project_url(ServiceHost::Search, project, &path),
            None => self.scope.http.org_url(ServiceHost::Search, &path),
        }
    }

    /// Validate paging and text, and start the filter set with the project.
    fn request(
        &self,
        text: &str,
        top: Option<i32>,
        skip: Option<i32>,
        project_filter: &'static str,
    ) -> ApiResult<SearchRequest> {
        let text = require_non_empty("text", text)?;
        if text.chars().count() > MAX_SEARCH_TEXT_CHARS {
            return Err(ValidationError::TooLong {
                field: "text".to_string(),
                max: MAX_SEARCH_TEXT_CHARS,
            }
            .into());
        }
        let top = validate_top("top", top.unwrap_or(DEFAULT_SEARCH_TOP), MAX_SEARCH_TOP)?;
        let skip = skip.unwrap_or(0);
        if skip < 0 {
            return Err(ValidationError::OutOfRange {
                field: "skip".to_string(),
                min: 0,
                max: i32::MAX as i64,
                value: skip as i64,
            }
            .into());
        }

        let mut filters = BTreeMap::new();
        if let Some(project) = &self.scope.project {
            filters.insert(project_filter, vec![project.clone()]);
        }
        Ok(SearchRequest {
            search_text: text.to_string(),
            top,
            skip,
            filters,
            include_facets: false,
        })
    }

    pub async fn search_code(
        &self,
        search: &CodeSearch,
    ) -> ApiResult<SearchResponse<CodeSearchResult>> {
        let mut request = self.request(&search.text, search.top, search.skip, "Project")?;
        add_filter(&mut request, "Repository", &search.repositories);
        add_filter(&mut request, "Path", &search.paths);
        add_filter(&mut request, "Branch", &search.branches);
        let url = self.url("codesearchresults")?;
        self.scope.http.post(url).json(&request).send_json().await
    }

    pub async fn search_work_items(
        &self,
        search: &WorkItemSearch,
    ) -> ApiResult<SearchResponse<WorkItemSearchResult>> {
        let mut request =
            self.request(&search.text, search.top, search.skip, "System.TeamProject")?;
        add_filter(&mut request, "System.WorkItemType", &search.work_item_types);
        add_filter(&mut request, "System.State", &search.states);
        add_filter(&mut request, "System.AssignedTo", &search.assigned_to);
        let url = self.url("workitemsearchresults")?;
        self.scope.http.post(url).json(&request).send_json().await
    }

    pub async fn search_wiki(
        &self,
        search: &WikiSearch,
    ) -> ApiResult<SearchResponse<WikiSearchResult>> {
        let mut request = self.request(&search.text, search.top, search.skip, "Project")?;
        add_filter(&mut request, "Wiki", &search.wikis);
        let url = self.url("wikisearchresults")?;
        self.scope.http.post(url).json(&request).send_json().await
    }
}

fn add_filter(request: &mut SearchRequest, name: &'static str, values: &[String]) {
    let values: Vec<String> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    if !values.is_empty() {
        request.filters.insert(name, values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::mock_http;
    use crate::error::ApiError;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// # Code Search Request
    ///
    /// Tests the body sent to the code search endpoint.
    ///
    /// ## Test Scenario
    /// - Searches with a project scope, a repository filter and blank entries
    ///
    /// ## Expected Outcome
    /// - Project and repository filters are present, blanks dropped, defaults applied
    #[tokio::test]
    async fn test_search_code_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contoso/Fabrikam/_apis/search/codesearchresults"))
            .and(body_json(json!({
                "searchText": "RetryPolicy",
                "$top": 25,
                "$skip": 0,
                "filters": {"Project": ["Fabrikam"], "Repository": ["web"]},
                "includeFacets": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "results": [{"fileName": "retry.rs", "path": "/src/retry.rs", "repository": {"name": "web"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = SearchClient::new(mock_http(&server), Some("Fabrikam".to_string()));
        let response = client
            .search_code(&CodeSearch {
                text: "  RetryPolicy ".to_string(),
                repositories: vec!["web".to_string(), " ".to_string()],
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(response.count, 1);
        assert_eq!(response.results[0].file_name.as_deref(), Some("retry.rs"));
    }

    #[tokio::test]
    async fn test_search_work_items_filters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contoso/_apis/search/workitemsearchresults"))
            .and(body_json(json!({
                "searchText": "login",
                "$top": 5,
                "$skip": 10,
                "filters": {"System.State": ["Active"], "System.WorkItemType": ["Bug"]},
                "includeFacets": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "results": [{"fields": {"system.id": "12", "system.title": "Login fails"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = SearchClient::new(mock_http(&server), None);
        let response = client
            .search_work_items(&WorkItemSearch {
                text: "login".to_string(),
                work_item_types: vec!["Bug".to_string()],
                states: vec!["Active".to_string()],
                top: Some(5),
                skip: Some(10),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(response.results[0].fields["system.id"], "12");
    }

    #[tokio::test]
    async fn test_search_text_limits() {
        let server = MockServer::start().await;
        let client = SearchClient::new(mock_http(&server), None);

        let err = client
            .search_wiki(&WikiSearch {
                text: "   ".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(ValidationError::Empty { .. })));

        let err = client
            .search_wiki(&WikiSearch {
                text: "x".repeat(MAX_SEARCH_TEXT_CHARS + 1),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(ValidationError::TooLong { .. })));

        let err = client
            .search_wiki(&WikiSearch {
                text: "onboarding".to_string(),
                top: Some(1001),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(ValidationError::OutOfRange { .. })));
    }
}
