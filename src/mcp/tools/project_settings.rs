//! Project, process, team and dashboard tools.

use schemars::JsonSchema;
use serde::Deserialize;

use super::ProjectScoped;
use crate::api::{DashboardsClient, ProjectSettingsClient};
use crate::mcp::registry::ToolRegistry;
use crate::models::project_settings::{CreateProject, ProjectState, ProjectUpdate};

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ListProjectsArgs {
    #[serde(default)]
    state: Option<ProjectState>,
    #[serde(default)]
    top: Option<i32>,
    #[serde(default)]
    skip: Option<i32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct GetProjectArgs {
    /// Project name or id.
    project: String,
    #[serde(default)]
    include_capabilities: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ProjectIdArgs {
    /// Project id (GUID).
    project_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct UpdateProjectArgs {
    project_id: String,
    #[serde(flatten)]
    update: ProjectUpdate,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct OperationArgs {
    /// Operation id returned by create, update or delete.
    operation_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct NoArgs {}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct PageArgs {
    #[serde(default)]
    top: Option<i32>,
    #[serde(default)]
    skip: Option<i32>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct TeamArgs {
    /// Team name or id.
    team: String,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct CreateTeamArgs {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct UpdateTeamArgs {
    team: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct TeamMembersArgs {
    team: String,
    #[serde(default)]
    top: Option<i32>,
    #[serde(default)]
    skip: Option<i32>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct DashboardListArgs {
    /// Team whose dashboards to use; project dashboards when omitted.
    #[serde(default)]
    team: Option<String>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct DashboardArgs {
    dashboard_id: String,
    #[serde(default)]
    team: Option<String>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct CreateDashboardArgs {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    team: Option<String>,
    #[serde(default)]
    project: Option<String>,
}

pub fn register_project_settings_tools(
    registry: &mut ToolRegistry,
    client: &ProjectSettingsClient,
    dashboards: &DashboardsClient,
) {
    register_project_tools(registry, client);
    register_team_tools(registry, client);
    register_dashboard_tools(registry, dashboards);
}

fn register_project_tools(registry: &mut ToolRegistry, client: &ProjectSettingsClient) {
    let c = client.clone();
    registry.register_read(
        "projectsettings_list_projects",
        "List the projects of the organization.",
        move |args: ListProjectsArgs| {
            let client = c.clone();
            async move { client.list_projects(args.state, args.top, args.skip).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "projectsettings_get_project",
        "Get a project, optionally with its capabilities.",
        move |args: GetProjectArgs| {
            let client = c.clone();
            async move {
                client
                    .get_project(&args.project, args.include_capabilities)
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_write(
        "projectsettings_create_project",
        "Queue creation of a project; poll the returned operation.",
        move |args: CreateProject| {
            let client = c.clone();
            async move { client.create_project(&args).await }
        },
    );

    let c = client.clone();
    registry.register_write(
        "projectsettings_update_project",
        "Rename a project or change its description or visibility.",
        move |args: UpdateProjectArgs| {
            let client = c.clone();
            async move { client.update_project(&args.project_id, &args.update).await }
        },
    );

    let c = client.clone();
    registry.register_destructive(
        "projectsettings_delete_project",
        "Queue deletion of a project.",
        move |args: ProjectIdArgs| {
            let client = c.clone();
            async move { client.delete_project(&args.project_id).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "projectsettings_get_operation",
        "Get the status of a long-running operation.",
        move |args: OperationArgs| {
            let client = c.clone();
            async move { client.get_operation(&args.operation_id).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "projectsettings_list_processes",
        "List the process templates of the organization.",
        move |_: NoArgs| {
            let client = c.clone();
            async move { client.list_processes().await }
        },
    );
}

fn register_team_tools(registry: &mut ToolRegistry, client: &ProjectSettingsClient) {
    let c = client.clone();
    registry.register_read(
        "projectsettings_list_teams",
        "List the teams of a project.",
        move |args: PageArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.list_teams(args.top, args.skip).await }
        },
    );

    let c = client.clone();
    registry.register_read("projectsettings_get_team", "Get a team.", move |args: TeamArgs| {
        let client = c.in_project(args.project.as_deref());
        async move { client.get_team(&args.team).await }
    });

    let c = client.clone();
    registry.register_write(
        "projectsettings_create_team",
        "Create a team.",
        move |args: CreateTeamArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .create_team(&args.name, args.description.as_deref())
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_write(
        "projectsettings_update_team",
        "Rename a team or change its description.",
        move |args: UpdateTeamArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .update_team(&args.team, args.name.as_deref(), args.description.as_deref())
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_destructive(
        "projectsettings_delete_team",
        "Delete a team.",
        move |args: TeamArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.delete_team(&args.team).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "projectsettings_list_team_members",
        "List the members of a team.",
        move |args: TeamMembersArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .list_team_members(&args.team, args.top, args.skip)
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_read(
        "projectsettings_get_team_settings",
        "Get a team's backlog and working-day settings.",
        move |args: TeamArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.get_team_settings(&args.team).await }
        },
    );
}

fn register_dashboard_tools(registry: &mut ToolRegistry, client: &DashboardsClient) {
    let c = client.clone();
    registry.register_read(
        "dashboards_list",
        "List the dashboards of a project or team.",
        move |args: DashboardListArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.list_dashboards(args.team.as_deref()).await }
        },
    );

    let c = client.clone();
    registry.register_read("dashboards_get", "Get a dashboard.", move |args: DashboardArgs| {
        let client = c.in_project(args.project.as_deref());
        async move {
            client
                .get_dashboard(args.team.as_deref(), &args.dashboard_id)
                .await
        }
    });

    let c = client.clone();
    registry.register_write(
        "dashboards_create",
        "Create an empty dashboard.",
        move |args: CreateDashboardArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .create_dashboard(
                        args.team.as_deref(),
                        &args.name,
                        args.description.as_deref(),
                    )
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_destructive(
        "dashboards_delete",
        "Delete a dashboard.",
        move |args: DashboardArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .delete_dashboard(args.team.as_deref(), &args.dashboard_id)
                    .await
            }
        },
    );
}
