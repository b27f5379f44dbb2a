//! Project and code wikis and their pages.

use serde_json::json;
use url::Url;

use super::Scope;
use super::http::{AdoHttpClient, ServiceHost};
use super::pagination::{ListResponse, Page};
use crate::error::{ApiError, ApiResult, ValidationError};
use crate::models::project_settings::TeamProject;
use crate::models::wiki::{
    CreateWiki, CreateWikiBody, PagesBatchRequest, Wiki, WikiKind, WikiPage, WikiPageDetail,
    WikiPageWithETag, WikiVersion,
};
use crate::validation::{normalize_wiki_path, require_non_empty, validate_name, validate_top};

const MAX_WIKI_NAME_LEN: usize = 255;
const MAX_PAGES_BATCH: i32 = 100;

#[derive(Debug, Clone)]
pub struct WikiClient {
    scope: Scope,
}

impl WikiClient {
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

    fn url(&self, path: &[&str]) -> ApiResult<Url> {
        let project = self.scope.project()?;
        let mut segments = vec!["wiki", "wikis"];
        segments.extend_from_slice(path);
        self.scope
            .http
            .project_url(ServiceHost::Core, &project, &segments)
    }

    pub async fn list_wikis(&self) -> ApiResult<Vec<Wiki>> {
        let url = self.url(&[])?;
        let list: ListResponse<Wiki> = self.scope.http.get(url).send_json().await?;
        Ok(list.value)
    }

    /// Look up a wiki by name or id.
    pub async fn get_wiki(&self, wiki: &str) -> ApiResult<Wiki> {
        let wiki = require_non_empty("wiki", wiki)?;
        let url = self.url(&[wiki])?;
        self.scope.http.get(url).send_json().await
    }

    /// Create a project wiki, or publish a repository folder as a code wiki.
    ///
    /// The create endpoint wants the project id rather than its name, so the
    /// project is looked up first.
    pub async fn create_wiki(&self, request: &CreateWiki) -> ApiResult<Wiki> {
        let name = validate_name("name", &request.name, MAX_WIKI_NAME_LEN)?;
        let (repository_id, mapped_path, version) = match request.kind {
            WikiKind::ProjectWiki => (None, None, None),
            WikiKind::CodeWiki => {
                let repository_id = request
                    .repository_id
                    .as_deref()
                    .map(|r| require_non_empty("repositoryId", r))
                    .transpose()?
                    .ok_or_else(|| ValidationError::Empty {
                        field: "repositoryId".to_string(),
                    })?;
                let branch = request
                    .branch
                    .as_deref()
                    .map(|b| require_non_empty("branch", b))
                    .transpose()?
                    .ok_or_else(|| ValidationError::Empty {
                        field: "branch".to_string(),
                    })?;
                let mapped_path = normalize_wiki_path(request.mapped_path.as_deref().unwrap_or("/"))?;
                (
                    Some(repository_id.to_string()),
                    Some(mapped_path),
                    Some(WikiVersion {
                        version: branch.trim_start_matches("refs/heads/").to_string(),
                    }),
                )
            }
        };

        let project = self.scope.project()?;
        let project_url = self
            .scope
            .http
            .org_url(ServiceHost::Core, &["projects", &project])?;
        let team_project: TeamProject = self.scope.http.get(project_url).send_json().await?;
        let project_id = team_project.id.ok_or_else(|| ApiError::ParseError {
            message: format!("project '{}' has no id", project),
        })?;

        let body = CreateWikiBody {
            name: name.to_string(),
            kind: request.kind,
            project_id,
            repository_id,
            mapped_path,
            version,
        };
        let url = self.url(&[])?;
        self.scope.http.post(url).json(&body).send_json().await
    }

    pub async fn delete_wiki(&self, wiki: &str) -> ApiResult<Wiki> {
        let wiki = require_non_empty("wiki", wiki)?;
        let url = self.url(&[wiki])?;
        self.scope.http.delete(url).send_json().await
    }

    pub async fn get_page(
        &self,
        wiki: &str,
        path: &str,
        include_content: bool,
    ) -> ApiResult<WikiPageWithETag> {
        let wiki = require_non_empty("wiki", wiki)?;
        let path = normalize_wiki_path(path)?;
        let url = self.url(&[wiki, "pages"])?;
        let (page, etag): (WikiPage, Option<String>) = self
            .scope
            .http
            .get(url)
            .query("path", path)
            .query("includeContent", include_content)
            .send_with_etag()
            .await?;
        Ok(WikiPageWithETag { page, etag })
    }

    /// Create a page, or update it when `etag` carries the version being replaced.
    pub async fn create_or_update_page(
        &self,
        wiki: &str,
        path: &str,
        content: &str,
        etag: Option<&str>,
    ) -> ApiResult<WikiPageWithETag> {
        let wiki = require_non_empty("wiki", wiki)?;
        let path = normalize_wiki_path(path)?;
        if path == "/" {
            return Err(ValidationError::InvalidPath { path }.into());
        }
        let url = self.url(&[wiki, "pages"])?;
        let (page, etag): (WikiPage, Option<String>) = self
            .scope
            .http
            .put(url)
            .query("path", path)
            .if_match(etag.map(str::trim).filter(|e| !e.is_empty()))
            .json(&json!({ "content": content }))
            .send_with_etag()
            .await?;
        Ok(WikiPageWithETag { page, etag })
    }

    pub async fn delete_page(&self, wiki: &str, path: &str) -> ApiResult<()> {
        let wiki = require_non_empty("wiki", wiki)?;
        let path = normalize_wiki_path(path)?;
        if path == "/" {
            return Err(ValidationError::InvalidPath { path }.into());
        }
        let url = self.url(&[wiki, "pages"])?;
        self.scope
            .http
            .delete(url)
            .query("path", path)
            .send_empty()
            .await
    }

    /// One page of the wiki's page list; pass the returned token to continue.
    pub async fn list_pages(
        &self,
        wiki: &str,
        top: Option<i32>,
        continuation_token: Option<String>,
    ) -> ApiResult<Page<WikiPageDetail>> {
        let wiki = require_non_empty("wiki", wiki)?;
        let top = validate_top("top", top.unwrap_or(MAX_PAGES_BATCH), MAX_PAGES_BATCH)?;
        let url = self.url(&[wiki, "pagesbatch"])?;
        let body = PagesBatchRequest {
            top,
            continuation_token: continuation_token.filter(|t| !t.trim().is_empty()),
        };
        self.scope.http.post(url).json(&body).send_page().await
    }
}
