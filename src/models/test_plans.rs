use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{IdentityRef, ShallowReference};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPlan {
    pub id: i32,
    pub name: Option<String>,
    pub description: Option<String>,
    pub state: Option<String>,
    pub area_path: Option<String>,
    pub iteration: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub owner: Option<IdentityRef>,
    pub root_suite: Option<ShallowReference>,
    pub revision: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTestPlan {
    pub name: String,
    /// Iteration path, e.g. "Fabrikam\\Sprint 4".
    pub iteration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestPlanUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// "Active" or "Inactive".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl TestPlanUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.state.is_none()
            && self.iteration.is_none()
            && self.area_path.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuite {
    pub id: i32,
    pub name: Option<String>,
    pub suite_type: Option<String>,
    pub parent_suite: Option<ShallowReference>,
    pub plan: Option<ShallowReference>,
    pub has_children: Option<bool>,
    pub query_string: Option<String>,
    pub requirement_id: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum TestSuiteType {
    #[default]
    StaticTestSuite,
    DynamicTestSuite,
    RequirementTestSuite,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTestSuite {
    pub name: String,
    /// Parent suite id; the plan's root suite when omitted.
    #[serde(default)]
    pub parent_suite_id: Option<i32>,
    #[serde(default)]
    pub suite_type: TestSuiteType,
    /// WIQL query for dynamic suites.
    #[serde(default)]
    pub query_string: Option<String>,
    /// Requirement work item for requirement-based suites.
    #[serde(default)]
    pub requirement_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SuiteIdRef {
    pub id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateTestSuiteBody<'a> {
    pub name: &'a str,
    pub suite_type: TestSuiteType,
    pub parent_suite: SuiteIdRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_string: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement_id: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseWorkItem {
    pub id: i32,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub work_item: Option<TestCaseWorkItem>,
    pub order: Option<i32>,
    pub test_plan: Option<ShallowReference>,
    pub test_suite: Option<ShallowReference>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct AddTestCaseBody {
    #[serde(rename = "workItem")]
    pub work_item: SuiteIdRef,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRun {
    pub id: i32,
    pub name: Option<String>,
    pub state: Option<String>,
    pub plan: Option<ShallowReference>,
    pub total_tests: Option<i32>,
    pub passed_tests: Option<i32>,
    pub unanalyzed_tests: Option<i32>,
    pub started_date: Option<String>,
    pub completed_date: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    pub id: i32,
    pub test_case_title: Option<String>,
    pub outcome: Option<String>,
    pub state: Option<String>,
    pub duration_in_ms: Option<f64>,
    pub error_message: Option<String>,
    pub automated_test_name: Option<String>,
    pub test_case: Option<ShallowReference>,
    pub completed_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_suite_body_serialization() {
        let body = CreateTestSuiteBody {
            name: "Smoke",
            suite_type: TestSuiteType::StaticTestSuite,
            parent_suite: SuiteIdRef { id: 2 },
            query_string: None,
            requirement_id: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"name": "Smoke", "suiteType": "staticTestSuite", "parentSuite": {"id": 2}})
        );
    }

    #[test]
    fn test_plan_update_is_empty() {
        assert!(TestPlanUpdate::default().is_empty());
        let update = TestPlanUpdate {
            state: Some("Inactive".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"state": "Inactive"}));
    }
}
