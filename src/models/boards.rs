use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{IdentityRef, JsonPatchOperation};

pub const FIELD_TITLE: &str = "System.Title";
pub const FIELD_STATE: &str = "System.State";
pub const FIELD_WORK_ITEM_TYPE: &str = "System.WorkItemType";
pub const FIELD_DESCRIPTION: &str = "System.Description";
pub const FIELD_ASSIGNED_TO: &str = "System.AssignedTo";
pub const FIELD_AREA_PATH: &str = "System.AreaPath";
pub const FIELD_ITERATION_PATH: &str = "System.IterationPath";
pub const FIELD_TAGS: &str = "System.Tags";
pub const FIELD_HISTORY: &str = "System.History";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: i32,
    pub rev: Option<i32>,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default)]
    pub relations: Vec<WorkItemRelation>,
    pub url: Option<String>,
}

impl WorkItem {
    /// String value of a field, if present and a string.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.field_str(FIELD_TITLE)
    }

    pub fn state(&self) -> Option<&str> {
        self.field_str(FIELD_STATE)
    }

    pub fn work_item_type(&self) -> Option<&str> {
        self.field_str(FIELD_WORK_ITEM_TYPE)
    }

    /// Display name of the assignee (identity fields are objects).
    pub fn assigned_to(&self) -> Option<&str> {
        self.fields
            .get(FIELD_ASSIGNED_TO)
            .and_then(|v| v.get("displayName").or(Some(v)))
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemRelation {
    pub rel: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

/// Which optional sections to include when fetching a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum WorkItemExpand {
    #[default]
    None,
    Relations,
    Fields,
    Links,
    All,
}

impl WorkItemExpand {
    pub fn as_query(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Relations => "relations",
            Self::Fields => "fields",
            Self::Links => "links",
            Self::All => "all",
        }
    }
}

/// Fields for a new work item. `fields` carries any additional reference names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// User display name or email.
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub area_path: Option<String>,
    #[serde(default)]
    pub iteration_path: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Extra fields keyed by reference name, e.g. "Microsoft.VSTS.Common.Priority".
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl WorkItemDraft {
    /// JSON Patch document creating this work item.
    pub fn to_patch(&self) -> Vec<JsonPatchOperation> {
        let mut ops = vec![JsonPatchOperation::add(
            field_path(FIELD_TITLE),
            Value::String(self.title.trim().to_string()),
        )];

        let optional = [
            (FIELD_DESCRIPTION, &self.description),
            (FIELD_ASSIGNED_TO, &self.assigned_to),
            (FIELD_AREA_PATH, &self.area_path),
            (FIELD_ITERATION_PATH, &self.iteration_path),
        ];
        for (field, value) in optional {
            if let Some(v) = value {
                ops.push(JsonPatchOperation::add(field_path(field), Value::String(v.clone())));
            }
        }

        if !self.tags.is_empty() {
            ops.push(JsonPatchOperation::add(
                field_path(FIELD_TAGS),
                Value::String(self.tags.join("; ")),
            ));
        }

        ops.extend(
            self.fields
                .iter()
                .map(|(name, value)| JsonPatchOperation::add(field_path(name), value.clone())),
        );
        ops
    }
}

/// `/fields/<reference name>`
pub fn field_path(reference_name: &str) -> String {
    format!("/fields/{}", reference_name)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemComment {
    pub id: Option<i64>,
    pub work_item_id: Option<i32>,
    pub version: Option<i32>,
    pub text: Option<String>,
    pub created_by: Option<IdentityRef>,
    pub created_date: Option<String>,
    pub modified_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemCommentList {
    pub total_count: Option<i32>,
    pub count: Option<i32>,
    #[serde(default)]
    pub comments: Vec<WorkItemComment>,
    pub continuation_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemReference {
    pub id: i32,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WiqlResult {
    pub query_type: Option<String>,
    pub as_of: Option<String>,
    #[serde(default)]
    pub work_items: Vec<WorkItemReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

/// One revision in a work item's history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemUpdate {
    pub id: Option<i32>,
    pub work_item_id: Option<i32>,
    pub rev: Option<i32>,
    pub revised_by: Option<IdentityRef>,
    pub revised_date: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldChange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemType {
    pub name: Option<String>,
    pub reference_name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub is_disabled: Option<bool>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationNode {
    pub id: Option<i32>,
    pub identifier: Option<String>,
    pub name: Option<String>,
    pub structure_type: Option<String>,
    pub has_children: Option<bool>,
    pub path: Option<String>,
    #[serde(default)]
    pub children: Vec<ClassificationNode>,
    pub attributes: Option<Value>,
}

/// The two classification trees of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ClassificationGroup {
    #[default]
    Areas,
    Iterations,
}

impl ClassificationGroup {
    pub fn as_segment(self) -> &'static str {
        match self {
            Self::Areas => "areas",
            Self::Iterations => "iterations",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationAttributes {
    pub start_date: Option<String>,
    pub finish_date: Option<String>,
    pub time_frame: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamIteration {
    pub id: Option<String>,
    pub name: Option<String>,
    pub path: Option<String>,
    pub attributes: Option<IterationAttributes>,
    pub url: Option<String>,
}

/// Link type reference names accepted by `add_link`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum WorkItemLinkType {
    #[default]
    Related,
    Parent,
    Child,
    Predecessor,
    Successor,
    Duplicate,
    DuplicateOf,
}

impl WorkItemLinkType {
    pub fn reference_name(self) -> &'static str {
        match self {
            Self::Related => "System.LinkTypes.Related",
            Self::Parent => "System.LinkTypes.Hierarchy-Reverse",
            Self::Child => "System.LinkTypes.Hierarchy-Forward",
            Self::Predecessor => "System.LinkTypes.Dependency-Reverse",
            Self::Successor => "System.LinkTypes.Dependency-Forward",
            Self::Duplicate => "System.LinkTypes.Duplicate-Forward",
            Self::DuplicateOf => "System.LinkTypes.Duplicate-Reverse",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatchOp;
    use serde_json::json;

    /// # Draft to JSON Patch
    ///
    /// Tests the patch document generated for a new work item.
    ///
    /// ## Test Scenario
    /// - Builds a draft with title, assignee, tags and a custom field
    ///
    /// ## Expected Outcome
    /// - Title first, then optional fields, tags joined with "; ", custom fields last
    #[test]
    fn test_draft_to_patch() {
        let mut fields = BTreeMap::new();
        fields.insert("Microsoft.VSTS.Common.Priority".to_string(), json!(2));
        let draft = WorkItemDraft {
            title: "  Login fails  ".to_string(),
            assigned_to: Some("dev@contoso.com".to_string()),
            tags: vec!["auth".to_string(), "p1".to_string()],
            fields,
            ..Default::default()
        };

        let ops = draft.to_patch();
        assert_eq!(ops.len(), 4);
        assert!(ops.iter().all(|op| op.op == PatchOp::Add));
        assert_eq!(ops[0].path, "/fields/System.Title");
        assert_eq!(ops[0].value, Some(json!("Login fails")));
        assert_eq!(ops[1].path, "/fields/System.AssignedTo");
        assert_eq!(ops[2].value, Some(json!("auth; p1")));
        assert_eq!(ops[3].path, "/fields/Microsoft.VSTS.Common.Priority");
        assert_eq!(ops[3].value, Some(json!(2)));
    }

    #[test]
    fn test_work_item_accessors() {
        let item: WorkItem = serde_json::from_value(json!({
            "id": 12,
            "rev": 3,
            "fields": {
                "System.Title": "Crash on save",
                "System.State": "Active",
                "System.WorkItemType": "Bug",
                "System.AssignedTo": {"displayName": "Ana", "uniqueName": "ana@contoso.com"}
            }
        }))
        .unwrap();

        assert_eq!(item.title(), Some("Crash on save"));
        assert_eq!(item.state(), Some("Active"));
        assert_eq!(item.work_item_type(), Some("Bug"));
        assert_eq!(item.assigned_to(), Some("Ana"));
        assert!(item.relations.is_empty());
    }

    #[test]
    fn test_link_type_reference_names() {
        assert_eq!(
            WorkItemLinkType::Parent.reference_name(),
            "System.LinkTypes.Hierarchy-Reverse"
        );
        assert_eq!(
            WorkItemLinkType::Related.reference_name(),
            "System.LinkTypes.Related"
        );
    }
}
