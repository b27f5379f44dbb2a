//! Test plan, suite, case and run tools.

use schemars::JsonSchema;
use serde::Deserialize;

use super::ProjectScoped;
use crate::api::TestPlansClient;
use crate::mcp::registry::ToolRegistry;
use crate::models::test_plans::{CreateTestPlan, CreateTestSuite, TestPlanUpdate};

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ListPlansArgs {
    /// Owner identity id or display name.
    #[serde(default)]
    owner: Option<String>,
    /// Only plans that are still active.
    #[serde(default)]
    filter_active: bool,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct PlanArgs {
    plan_id: i32,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct CreatePlanArgs {
    #[serde(flatten)]
    plan: CreateTestPlan,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct UpdatePlanArgs {
    plan_id: i32,
    #[serde(flatten)]
    update: TestPlanUpdate,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct CreateSuiteArgs {
    plan_id: i32,
    #[serde(flatten)]
    suite: CreateTestSuite,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct SuiteArgs {
    plan_id: i32,
    suite_id: i32,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct SuiteCasesArgs {
    plan_id: i32,
    suite_id: i32,
    /// Test case work item ids.
    test_case_ids: Vec<i32>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ListRunsArgs {
    #[serde(default)]
    plan_id: Option<i32>,
    #[serde(default)]
    top: Option<i32>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ListResultsArgs {
    run_id: i32,
    #[serde(default)]
    top: Option<i32>,
    #[serde(default)]
    project: Option<String>,
}

pub fn register_test_plans_tools(registry: &mut ToolRegistry, client: &TestPlansClient) {
    let c = client.clone();
    registry.register_read(
        "testplans_list_plans",
        "List test plans.",
        move |args: ListPlansArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .list_test_plans(args.owner.as_deref(), args.filter_active)
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_read("testplans_get_plan", "Get a test plan.", move |args: PlanArgs| {
        let client = c.in_project(args.project.as_deref());
        async move { client.get_test_plan(args.plan_id).await }
    });

    let c = client.clone();
    registry.register_write(
        "testplans_create_plan",
        "Create a test plan for an iteration.",
        move |args: CreatePlanArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.create_test_plan(&args.plan).await }
        },
    );

    let c = client.clone();
    registry.register_write(
        "testplans_update_plan",
        "Update a test plan.",
        move |args: UpdatePlanArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.update_test_plan(args.plan_id, &args.update).await }
        },
    );

    let c = client.clone();
    registry.register_destructive(
        "testplans_delete_plan",
        "Delete a test plan.",
        move |args: PlanArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.delete_test_plan(args.plan_id).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "testplans_list_suites",
        "List the suites of a test plan.",
        move |args: PlanArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.list_test_suites(args.plan_id).await }
        },
    );

    let c = client.clone();
    registry.register_write(
        "testplans_create_suite",
        "Create a test suite, under the root suite unless a parent is given.",
        move |args: CreateSuiteArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.create_test_suite(args.plan_id, &args.suite).await }
        },
    );

    let c = client.clone();
    registry.register_destructive(
        "testplans_delete_suite",
        "Delete a test suite.",
        move |args: SuiteArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.delete_test_suite(args.plan_id, args.suite_id).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "testplans_list_cases",
        "List the test cases of a suite.",
        move |args: SuiteArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.list_test_cases(args.plan_id, args.suite_id).await }
        },
    );

    let c = client.clone();
    registry.register_write(
        "testplans_add_cases",
        "Add existing test case work items to a suite.",
        move |args: SuiteCasesArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .add_test_cases(args.plan_id, args.suite_id, &args.test_case_ids)
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_write(
        "testplans_remove_cases",
        "Remove test cases from a suite; the work items are kept.",
        move |args: SuiteCasesArgs| {
            let client = c.in_project(args.project.as_deref());
            async move {
                client
                    .remove_test_cases(args.plan_id, args.suite_id, &args.test_case_ids)
                    .await
            }
        },
    );

    let c = client.clone();
    registry.register_read(
        "testplans_list_runs",
        "List test runs, optionally for one plan.",
        move |args: ListRunsArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.list_test_runs(args.plan_id, args.top).await }
        },
    );

    let c = client.clone();
    registry.register_read(
        "testplans_list_results",
        "List the results of a test run.",
        move |args: ListResultsArgs| {
            let client = c.in_project(args.project.as_deref());
            async move { client.list_test_results(args.run_id, args.top).await }
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::mock_http;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// # Remove Cases
    ///
    /// Tests the id list forwarding of `testplans_remove_cases`.
    ///
    /// ## Test Scenario
    /// - Removes cases 10 and 11 from suite 3 of plan 1
    ///
    /// ## Expected Outcome
    /// - One DELETE with a comma-joined id list, success with null data
    #[tokio::test]
    async fn test_remove_cases_tool() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/contoso/Fabrikam/_apis/testplan/Plans/1/Suites/3/TestCase"))
            .and(query_param("testCaseIds", "10,11"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let mut registry = ToolRegistry::new(false);
        register_test_plans_tools(
            &mut registry,
            &TestPlansClient::new(mock_http(&server), Some("Fabrikam".to_string())),
        );

        let outcome = registry
            .call(
                "testplans_remove_cases",
                Some(json!({"planId": 1, "suiteId": 3, "testCaseIds": [10, 11]})),
            )
            .await
            .unwrap();
        assert!(outcome.envelope.is_success(), "{:?}", outcome.envelope);
    }
}
