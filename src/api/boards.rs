//! Work items, comments, WIQL queries and project classification.

use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use super::Scope;
use super::http::{AdoHttpClient, ServiceHost};
use super::pagination::ListResponse;
use crate::error::{ApiError, ApiResult, ValidationError};
use crate::models::JsonPatchOperation;
use crate::models::boards::{
    ClassificationGroup, ClassificationNode, FIELD_STATE, TeamIteration, WiqlResult, WorkItem,
    WorkItemComment, WorkItemCommentList, WorkItemDraft, WorkItemExpand, WorkItemLinkType,
    WorkItemType, WorkItemUpdate, field_path,
};
use crate::validation::{require_non_empty, validate_ids, validate_top, validate_wiql};

/// The batch endpoint accepts at most this many ids per request.
pub const WORK_ITEM_BATCH_SIZE: usize = 200;
const MAX_CONCURRENT_BATCHES: usize = 4;
const COMMENTS_API_VERSION: &str = "7.1-preview.4";
const MAX_WIQL_TOP: i32 = 20000;
const MAX_COMMENTS_TOP: i32 = 200;

#[derive(Debug, Clone)]
pub struct BoardsClient {
    scope: Scope,
}

impl BoardsClient {
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

    fn wit_url(&self, path: &[&str]) -> ApiResult<url::Url> {
        let project = self.scope.project()?;
        let mut segments = vec!["wit"];
        segments.extend_from_slice(path);
        self.scope
            .http
            .project_url(ServiceHost::Core, &project, &segments)
    }

    pub async fn get_work_item(&self, id: i32, expand: WorkItemExpand) -> ApiResult<WorkItem> {
        let id = validate_ids("id", &[id])?[0];
        let url = self.wit_url(&["workitems", &id.to_string()])?;
        self.scope
            .http
            .get(url)
            .query("$expand", expand.as_query())
            .send_json()
            .await
    }

    /// Fetch many work items at once.
    ///
    /// Ids are deduplicated and split into batches of 200 fetched concurrently.
    /// Results follow the order of `ids`; ids that do not exist are skipped.
    pub async fn get_work_items(
        &self,
        ids: &[i32],
        fields: &[String],
    ) -> ApiResult<Vec<WorkItem>> {
        let ids = validate_ids("ids", ids)?;
        let url = self.wit_url(&["workitems"])?;
        let fields = (!fields.is_empty()).then(|| fields.join(","));

        let batches: Vec<String> = ids
            .chunks(WORK_ITEM_BATCH_SIZE)
            .map(|chunk| {
                chunk
                    .iter()
                    .map(i32::to_string)
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect();

        let batches: Vec<Vec<WorkItem>> = stream::iter(batches)
            .map(|joined| {
                let url = url.clone();
                let fields = fields.clone();
                async move {
                    let list: ListResponse<Option<WorkItem>> = self
                        .scope
                        .http
                        .get(url)
                        .query("ids", joined)
                        .query_opt("fields", fields)
                        .query("errorPolicy", "omit")
                        .send_json()
                        .await?;
                    Ok::<_, ApiError>(list.value.into_iter().flatten().collect())
                }
            })
            .buffered(MAX_CONCURRENT_BATCHES)
            .try_collect()
            .await?;

        let mut by_id: HashMap<i32, WorkItem> = batches
            .into_iter()
            .flatten()
            .map(|item| (item.id, item))
            .collect();
        debug!(requested = ids.len(), found = by_id.len(), "Fetched work items");
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    pub async fn create_work_item(
        &self,
        work_item_type: &str,
        draft: &WorkItemDraft,
    ) -> ApiResult<WorkItem> {
        let work_item_type = require_non_empty("workItemType", work_item_type)?;
        require_non_empty("title", &draft.title)?;
        let type_segment = format!("${}", work_item_type);
        let url = self.wit_url(&["workitems", &type_segment])?;
        self.scope
            .http
            .post(url)
            .json_patch(&draft.to_patch())
            .send_json()
            .await
    }

    /// Set arbitrary fields, keyed by reference name.
    pub async fn update_work_item(
        &self,
        id: i32,
        fields: &BTreeMap<String, Value>,
    ) -> ApiResult<WorkItem> {
        if fields.is_empty() {
            return Err(ValidationError::Empty {
                field: "fields".to_string(),
            }
            .into());
        }
        let operations: Vec<JsonPatchOperation> = fields
            .iter()
            .map(|(name, value)| JsonPatchOperation::add(field_path(name), value.clone()))
            .collect();
        self.patch_work_item(id, &operations).await
    }

    pub async fn update_work_item_state(&self, id: i32, state: &str) -> ApiResult<WorkItem> {
        let state = require_non_empty("state", state)?;
        let operations = [JsonPatchOperation::add(
            field_path(FIELD_STATE),
            Value::String(state.to_string()),
        )];
        self.patch_work_item(id, &operations).await
    }

    async fn patch_work_item(
        &self,
        id: i32,
        operations: &[JsonPatchOperation],
    ) -> ApiResult<WorkItem> {
        let id = validate_ids("id", &[id])?[0];
        let url = self.wit_url(&["workitems", &id.to_string()])?;
        self.scope
            .http
            .patch(url)
            .json_patch(operations)
            .send_json()
            .await
    }

    /// Move a work item to the recycle bin, or remove it permanently with `destroy`.
    pub async fn delete_work_item(&self, id: i32, destroy: bool) -> ApiResult<()> {
        let id = validate_ids("id", &[id])?[0];
        let url = self.wit_url(&["workitems", &id.to_string()])?;
        self.scope
            .http
            .delete(url)
            .query_opt("destroy", destroy.then_some(true))
            .send_empty()
            .await
    }

    pub async fn add_comment(&self, id: i32, text: &str) -> ApiResult<WorkItemComment> {
        let id = validate_ids("id", &[id])?[0];
        let text = require_non_empty("text", text)?;
        let url = self.wit_url(&["workItems", &id.to_string(), "comments"])?;
        self.scope
            .http
            .post(url)
            .api_version(COMMENTS_API_VERSION)
            .json(&json!({ "text": text }))
            .send_json()
            .await
    }

    pub async fn list_comments(
        &self,
        id: i32,
        top: Option<i32>,
    ) -> ApiResult<Vec<WorkItemComment>> {
        let id = validate_ids("id", &[id])?[0];
        if let Some(top) = top {
            validate_top("top", top, MAX_COMMENTS_TOP)?;
        }
        let url = self.wit_url(&["workItems", &id.to_string(), "comments"])?;
        let list: WorkItemCommentList = self
            .scope
            .http
            .get(url)
            .api_version(COMMENTS_API_VERSION)
            .query_opt("$top", top)
            .send_json()
            .await?;
        Ok(list.comments)
    }

    /// Run a WIQL query and return the matching work item ids.
    pub async fn query_by_wiql(&self, wiql: &str, top: Option<i32>) -> ApiResult<Vec<i32>> {
        let wiql = validate_wiql(wiql)?;
        if let Some(top) = top {
            validate_top("top", top, MAX_WIQL_TOP)?;
        }
        let url = self.wit_url(&["wiql"])?;
        let result: WiqlResult = self
            .scope
            .http
            .post(url)
            .query_opt("$top", top)
            .json(&json!({ "query": wiql }))
            .send_json()
            .await?;
        Ok(result.work_items.into_iter().map(|r| r.id).collect())
    }

    /// Run a WIQL query and resolve the ids to full work items.
    pub async fn query_work_items(
        &self,
        wiql: &str,
        fields: &[String],
        top: Option<i32>,
    ) -> ApiResult<Vec<WorkItem>> {
        let ids = self.query_by_wiql(wiql, top).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.get_work_items(&ids, fields).await
    }

    pub async fn get_work_item_updates(&self, id: i32) -> ApiResult<Vec<WorkItemUpdate>> {
        let id = validate_ids("id", &[id])?[0];
        let url = self.wit_url(&["workitems", &id.to_string(), "updates"])?;
        let list: ListResponse<WorkItemUpdate> = self.scope.http.get(url).send_json().await?;
        Ok(list.value)
    }

    /// Link `source` to `target` with the given relation.
    pub async fn add_link(
        &self,
        source: i32,
        target: i32,
        link_type: WorkItemLinkType,
        comment: Option<&str>,
    ) -> ApiResult<WorkItem> {
        let target = validate_ids("target", &[target])?[0];
        if source == target {
            return Err(ValidationError::Invalid {
                field: "target".to_string(),
                message: format!("work item {} cannot link to itself", source),
            }
            .into());
        }
        let target_url = self
            .scope
            .http
            .org_url(ServiceHost::Core, &["wit", "workItems", &target.to_string()])?;

        let mut relation = json!({
            "rel": link_type.reference_name(),
            "url": target_url.as_str(),
        });
        if let Some(comment) = comment.map(str::trim).filter(|c| !c.is_empty()) {
            relation["attributes"] = json!({ "comment": comment });
        }

        let operations = [JsonPatchOperation::add("/relations/-", relation)];
        self.patch_work_item(source, &operations).await
    }

    pub async fn list_work_item_types(&self) -> ApiResult<Vec<WorkItemType>> {
        let url = self.wit_url(&["workitemtypes"])?;
        let list: ListResponse<WorkItemType> = self.scope.http.get(url).send_json().await?;
        Ok(list.value)
    }

    /// Root of the area or iteration tree, `depth` levels deep.
    pub async fn list_classification_nodes(
        &self,
        group: ClassificationGroup,
        depth: Option<i32>,
    ) -> ApiResult<ClassificationNode> {
        if let Some(depth) = depth {
            validate_top("depth", depth, 10)?;
        }
        let url = self.wit_url(&["classificationnodes", group.as_segment()])?;
        self.scope
            .http
            .get(url)
            .query_opt("$depth", depth)
            .send_json()
            .await
    }

    /// Iterations assigned to a team; `timeframe` may be "current".
    pub async fn list_team_iterations(
        &self,
        team: &str,
        timeframe: Option<&str>,
    ) -> ApiResult<Vec<TeamIteration>> {
        let team = require_non_empty("team", team)?;
        let project = self.scope.project()?;
        let url = self.scope.http.team_url(
            ServiceHost::Core,
            &project,
            team,
            &["work", "teamsettings", "iterations"],
        )?;
        let list: ListResponse<TeamIteration> = self
            .scope
            .http
            .get(url)
            .query_opt("$timeframe", timeframe.map(str::trim).filter(|t| !t.is_empty()))
            .send_json()
            .await?;
        Ok(list.value)
    }
}
