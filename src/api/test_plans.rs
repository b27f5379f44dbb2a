//! Test plans, suites, cases, runs and results.

use url::Url;

use super::Scope;
use super::http::{AdoHttpClient, ServiceHost};
use super::pagination::{DEFAULT_MAX_PAGES, ListResponse, collect_continuation};
use crate::error::{ApiError, ApiResult, ValidationError};
use crate::models::test_plans::{
    AddTestCaseBody, CreateTestPlan, CreateTestSuite, CreateTestSuiteBody, SuiteIdRef, TestCase,
    TestCaseResult, TestPlan, TestPlanUpdate, TestRun, TestSuite,
};
use crate::validation::{require_non_empty, validate_ids, validate_name, validate_top};

const MAX_PLAN_NAME_LEN: usize = 256;
const MAX_RUNS_TOP: i32 = 1000;

#[derive(Debug, Clone)]
pub struct TestPlansClient {
    scope: Scope,
}

impl TestPlansClient {
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
        self.scope.http.project_url(ServiceHost::Core, &project, path)
    }

    fn plan_url(&self, plan_id: i32, path: &[&str]) -> ApiResult<Url> {
        let plan_id = validate_ids("planId", &[plan_id])?[0].to_string();
        let mut segments = vec!["testplan", "Plans", plan_id.as_str()];
        segments.extend_from_slice(path);
        self.url(&segments)
    }

    fn suite_url(&self, plan_id: i32, suite_id: i32, path: &[&str]) -> ApiResult<Url> {
        let suite_id = validate_ids("suiteId", &[suite_id])?[0].to_string();
        let mut segments = vec!["Suites", suite_id.as_str()];
        segments.extend_from_slice(path);
        self.plan_url(plan_id, &segments)
    }

    /// All plans, optionally filtered by owner and active state.
    pub async fn list_test_plans(
        &self,
        owner: Option<&str>,
        filter_active: bool,
    ) -> ApiResult<Vec<TestPlan>> {
        let url = self.url(&["testplan", "plans"])?;
        let owner = owner.map(str::trim).filter(|o| !o.is_empty());
        collect_continuation(DEFAULT_MAX_PAGES, |token| {
            self.scope
                .http
                .get(url.clone())
                .query_opt("owner", owner)
                .query_opt("filterActivePlans", filter_active.then_some(true))
                .query_opt("continuationToken", token)
                .send_page()
        })
        .await
    }

    pub async fn get_test_plan(&self, plan_id: i32) -> ApiResult<TestPlan> {
        let url = self.plan_url(plan_id, &[])?;
        self.scope.http.get(url).send_json().await
    }

    pub async fn create_test_plan(&self, request: &CreateTestPlan) -> ApiResult<TestPlan> {
        validate_name("name", &request.name, MAX_PLAN_NAME_LEN)?;
        require_non_empty("iteration", &request.iteration)?;
        let url = self.url(&["testplan", "plans"])?;
        self.scope.http.post(url).json(request).send_json().await
    }

    pub async fn update_test_plan(
        &self,
        plan_id: i32,
        update: &TestPlanUpdate,
    ) -> ApiResult<TestPlan> {
        if update.is_empty() {
            return Err(ValidationError::Empty {
                field: "update".to_string(),
            }
            .into());
        }
        if let Some(name) = &update.name {
            validate_name("name", name, MAX_PLAN_NAME_LEN)?;
        }
        let url = self.plan_url(plan_id, &[])?;
        self.scope.http.patch(url).json(update).send_json().await
    }

    pub async fn delete_test_plan(&self, plan_id: i32) -> ApiResult<()> {
        let url = self.plan_url(plan_id, &[])?;
        self.scope.http.delete(url).send_empty().await
    }

    pub async fn list_test_suites(&self, plan_id: i32) -> ApiResult<Vec<TestSuite>> {
        let url = self.plan_url(plan_id, &["suites"])?;
        let list: ListResponse<TestSuite> = self.scope.http.get(url).send_json().await?;
        Ok(list.value)
    }

    /// Create a suite under `parent_suite_id`, or under the plan's root suite.
    pub async fn create_test_suite(
        &self,
        plan_id: i32,
        request: &CreateTestSuite,
    ) -> ApiResult<TestSuite> {
        let name = validate_name("name", &request.name, MAX_PLAN_NAME_LEN)?;
        let parent_id = match request.parent_suite_id {
            Some(id) => validate_ids("parentSuiteId", &[id])?[0],
            None => {
                let plan = self.get_test_plan(plan_id).await?;
                plan.root_suite
                    .and_then(|root| root.id)
                    .and_then(|id| id.parse::<i32>().ok())
                    .ok_or_else(|| ApiError::ParseError {
                        message: format!("test plan {} has no root suite", plan_id),
                    })?
            }
        };

        let body = CreateTestSuiteBody {
            name,
            suite_type: request.suite_type,
            parent_suite: SuiteIdRef { id: parent_id },
            query_string: request.query_string.as_deref(),
            requirement_id: request.requirement_id,
        };
        let url = self.plan_url(plan_id, &["suites"])?;
        self.scope.http.post(url).json(&body).send_json().await
    }

    pub async fn delete_test_suite(&self, plan_id: i32, suite_id: i32) -> ApiResult<()> {
        let suite_id = validate_ids("suiteId", &[suite_id])?[0].to_string();
        let url = self.plan_url(plan_id, &["suites", &suite_id])?;
        self.scope.http.delete(url).send_empty().await
    }

    pub async fn list_test_cases(&self, plan_id: i32, suite_id: i32) -> ApiResult<Vec<TestCase>> {
        let url = self.suite_url(plan_id, suite_id, &["TestCase"])?;
        let list: ListResponse<TestCase> = self.scope.http.get(url).send_json().await?;
        Ok(list.value)
    }

    /// Add existing test case work items to a suite.
    pub async fn add_test_cases(
        &self,
        plan_id: i32,
        suite_id: i32,
        test_case_ids: &[i32],
    ) -> ApiResult<Vec<TestCase>> {
        let ids = validate_ids("testCaseIds", test_case_ids)?;
        let body: Vec<AddTestCaseBody> = ids
            .into_iter()
            .map(|id| AddTestCaseBody {
                work_item: SuiteIdRef { id },
            })
            .collect();
        let url = self.suite_url(plan_id, suite_id, &["TestCase"])?;
        let list: ListResponse<TestCase> =
            self.scope.http.post(url).json(&body).send_json().await?;
        Ok(list.value)
    }

    pub async fn remove_test_cases(
        &self,
        plan_id: i32,
        suite_id: i32,
        test_case_ids: &[i32],
    ) -> ApiResult<()> {
        let ids = validate_ids("testCaseIds", test_case_ids)?;
        let joined = ids
            .iter()
            .map(i32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let url = self.suite_url(plan_id, suite_id, &["TestCase"])?;
        self.scope
            .http
            .delete(url)
            .query("testCaseIds", joined)
            .send_empty()
            .await
    }

    pub async fn list_test_runs(
        &self,
        plan_id: Option<i32>,
        top: Option<i32>,
    ) -> ApiResult<Vec<TestRun>> {
        let plan_id = plan_id
            .map(|id| validate_ids("planId", &[id]).map(|ids| ids[0]))
            .transpose()?;
        if let Some(top) = top {
            validate_top("top", top, MAX_RUNS_TOP)?;
        }
        let url = self.url(&["test", "runs"])?;
        let list: ListResponse<TestRun> = self
            .scope
            .http
            .get(url)
            .query_opt("planId", plan_id)
            .query_opt("$top", top)
            .send_json()
            .await?;
        Ok(list.value)
    }

    pub async fn list_test_results(
        &self,
        run_id: i32,
        top: Option<i32>,
    ) -> ApiResult<Vec<TestCaseResult>> {
        let run_id = validate_ids("runId", &[run_id])?[0].to_string();
        if let Some(top) = top {
            validate_top("top", top, MAX_RUNS_TOP)?;
        }
        let url = self.url(&["test", "Runs", &run_id, "results"])?;
        let list: ListResponse<TestCaseResult> = self
            .scope
            .http
            .get(url)
            .query_opt("$top", top)
            .send_json()
            .await?;
        Ok(list.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_plans::TestSuiteType;
    use crate::api::test_support::mock_http;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn client(server: &MockServer) -> TestPlansClient {
        TestPlansClient::new(mock_http(server), Some("Fabrikam".to_string()))
    }

    #[tokio::test]
    async fn test_list_test_plans_continuation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contoso/Fabrikam/_apis/testplan/plans"))
            .and(query_param("filterActivePlans", "true"))
            .respond_with(|req: &Request| {
                if req.url.query_pairs().any(|(k, _)| k == "continuationToken") {
                    ResponseTemplate::new(200).set_body_json(json!({"value": [{"id": 2}]}))
                } else {
                    ResponseTemplate::new(200)
                        .insert_header("x-ms-continuationtoken", "next")
                        .set_body_json(json!({"value": [{"id": 1}]}))
                }
            })
            .expect(2)
            .mount(&server)
            .await;

        let plans = client(&server).list_test_plans(None, true).await.unwrap();
        assert_eq!(plans.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    /// # Suite Under Root
    ///
    /// Tests that a suite without an explicit parent lands under the root suite.
    ///
    /// ## Test Scenario
    /// - The plan lookup returns root suite 2; a static suite is created
    ///
    /// ## Expected Outcome
    /// - The create body references parent suite 2
    #[tokio::test]
    async fn test_create_suite_defaults_to_root() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contoso/Fabrikam/_apis/testplan/Plans/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1,
                "name": "Release 1",
                "rootSuite": {"id": 2, "name": "Release 1"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/contoso/Fabrikam/_apis/testplan/Plans/1/suites"))
            .and(body_json(json!({
                "name": "Smoke",
                "suiteType": "staticTestSuite",
                "parentSuite": {"id": 2}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3, "name": "Smoke"})))
            .expect(1)
            .mount(&server)
            .await;

        let suite = client(&server)
            .create_test_suite(
                1,
                &CreateTestSuite {
                    name: "Smoke".to_string(),
                    suite_type: TestSuiteType::StaticTestSuite,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(suite.id, 3);
    }

    #[tokio::test]
    async fn test_add_and_remove_test_cases() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contoso/Fabrikam/_apis/testplan/Plans/1/Suites/3/TestCase"))
            .and(body_json(json!([{"workItem": {"id": 10}}, {"workItem": {"id": 11}}])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"workItem": {"id": 10}}, {"workItem": {"id": 11}}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/contoso/Fabrikam/_apis/testplan/Plans/1/Suites/3/TestCase"))
            .and(query_param("testCaseIds", "10,11"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let cases = client.add_test_cases(1, 3, &[10, 11, 10]).await.unwrap();
        assert_eq!(cases.len(), 2);
        client.remove_test_cases(1, 3, &[10, 11]).await.unwrap();
        assert!(client.remove_test_cases(1, 3, &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_runs_and_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contoso/Fabrikam/_apis/test/runs"))
            .and(query_param("planId", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"id": 50, "state": "Completed", "totalTests": 4, "passedTests": 3}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/contoso/Fabrikam/_apis/test/Runs/50/results"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"id": 100000, "outcome": "Failed", "testCaseTitle": "Login"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let runs = client.list_test_runs(Some(1), None).await.unwrap();
        assert_eq!(runs[0].passed_tests, Some(3));
        let results = client.list_test_results(50, Some(10)).await.unwrap();
        assert_eq!(results[0].outcome.as_deref(), Some("Failed"));
    }

    #[tokio::test]
    async fn test_update_plan_requires_fields() {
        let server = MockServer::start().await;
        let err = client(&server)
            .update_test_plan(1, &TestPlanUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(ValidationError::Empty { .. })));
    }
}
