//! Work item tracking tools.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::{ProjectArgs, ProjectScoped};
use crate::api::BoardsClient;
use crate::mcp::registry::ToolRegistry;
use crate::models::boards::{ClassificationGroup, WorkItemDraft, WorkItemExpand, WorkItemLinkType};

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct GetWorkItemArgs {
    id: i32,
    #[serde(default)]
    expand: WorkItemExpand,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct GetWorkItemsArgs {
    ids: Vec<i32>,
    /// Field reference names to return; all fields when empty.
    #[serde(default)]
    fields: Vec<String>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct CreateWorkItemArgs {
    /// Work item type, e.g. "Bug", "User Story", "Task".
    work_item_type: String,
    #[serde(flatten)]
    draft: WorkItemDraft,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct UpdateWorkItemArgs {
    id: i32,
    /// Field values keyed by reference name, e.g. {"System.Title": "New title"}.
    fields: BTreeMap<String, Value>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct UpdateStateArgs {
    id: i32,
    /// Target state, e.g. "Active" or "Closed".
    state: String,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct DeleteWorkItemArgs {
    id: i32,
    /// Delete permanently instead of moving to the recycle bin.
    #[serde(default)]
    destroy: bool,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct WorkItemIdArgs {
    id: i32,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct AddCommentArgs {
    id: i32,
    /// Comment text; HTML is accepted.
    text: String,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ListCommentsArgs {
    id: i32,
    #[serde(default)]
    top: Option<i32>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct WiqlArgs {
    /// WIQL query text.
    wiql: String,
    #[serde(default)]
    top: Option<i32>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct QueryWorkItemsArgs {
    wiql: String,
    #[serde(default)]
    fields: Vec<String>,
    #[serde(default)]
    top: Option<i32>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct AddLinkArgs {
    source_id: i32,
    target_id: i32,
    #[serde(default)]
    link_type: WorkItemLinkType,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ClassificationArgs {
    #[serde(default)]
    group: ClassificationGroup,
    #[serde(default)]
    depth: Option<i32>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct TeamIterationsArgs {
    team: String,
    /// Only "current" is supported by the service.
    #[serde(default)]
    timeframe: Option<String>,
    #[serde(default)]
    project: Option<String>,
}

pub fn register_boards_tools(registry: &mut ToolRegistry, client: &BoardsClient) {
    let c = client.clone();
    registry.register_read(
        "boards_get_work_item",
        "Get a work item by id.",
        move |args: GetWorkItemArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.get_work_item(args.id, args.expand).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "boards_get_work_items",
        "Get several work items by id, in the order given.",
        move |args: GetWorkItemsArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.get_work_items(&args.ids, &args.fields).await }
        },
    );

    let c = client.clone();
    registry.register_write(
        "boards_create_work_item",
        "Create a work item of the given type.",
        move |args: CreateWorkItemArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .create_work_item(&args.work_item_type, &args.draft)
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_write(
        "boards_update_work_item",
        "Set fields on a work item.",
        move |args: UpdateWorkItemArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.update_work_item(args.id, &args.fields).await }
        },
    );

    let c = client.clone();
    registry.register_write(
        "boards_update_work_item_state",
        "Move a work item to another state.",
        move |args: UpdateStateArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.update_work_item_state(args.id, &args.state).await }
        },
    );

    let c = client.clone();
    registry.register_destructive(
        "boards_delete_work_item",
        "Delete a work item.",
        move |args: DeleteWorkItemArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.delete_work_item(args.id, args.destroy).await }
        },
    );

    let c = client.clone();
    registry.register_write(
        "boards_add_comment",
        "Comment on a work item.",
        move |args: AddCommentArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.add_comment(args.id, &args.text).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "boards_list_comments",
        "List the comments on a work item.",
        move |args: ListCommentsArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.list_comments(args.id, args.top).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "boards_query_by_wiql",
        "Run a WIQL query and return the matching work item ids.",
        move |args: WiqlArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.query_by_wiql(&args.wiql, args.top).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "boards_query_work_items",
        "Run a WIQL query and return the matching work items.",
        move |args: QueryWorkItemsArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .query_work_items(&args.wiql, &args.fields, args.top)
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_read(
        "boards_get_work_item_updates",
        "Get the revision history of a work item.",
        move |args: WorkItemIdArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.get_work_item_updates(args.id).await }
        },
    );

    let c = client.clone();
    registry.register_write(
        "boards_add_link",
        "Link two work items.",
        move |args: AddLinkArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .add_link(
                        args.source_id,
                        args.target_id,
                        args.link_type,
                        args.comment.as_deref(),
                    )
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_read(
        "boards_list_work_item_types",
        "List the work item types of a project.",
        move |args: ProjectArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.list_work_item_types().await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "boards_list_classification_nodes",
        "Get the area or iteration tree of a project.",
        move |args: ClassificationArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.list_classification_nodes(args.group, args.depth).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "boards_list_team_iterations",
        "List the iterations a team is subscribed to.",
        move |args: TeamIterationsArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .list_team_iterations(&args.team, args.timeframe.as_deref())
                    .await
            }
        },
    );
}
