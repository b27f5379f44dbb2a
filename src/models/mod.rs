//! Data transfer objects mirroring Azure DevOps REST shapes.
//!
//! Response types tolerate missing fields (everything optional or defaulted)
//! because the service omits empty values. Request/argument types derive
//! `JsonSchema` so the MCP layer can publish them as tool input schemas.

pub mod artifacts;
pub mod boards;
pub mod dashboards;
pub mod pipelines;
pub mod project_settings;
pub mod repos;
pub mod search;
pub mod test_plans;
pub mod wiki;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A user or group as Azure DevOps returns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRef {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub unique_name: Option<String>,
    pub url: Option<String>,
}

/// Shallow project reference embedded in many resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReference {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub state: Option<String>,
    pub visibility: Option<String>,
    pub revision: Option<i64>,
    pub last_update_time: Option<String>,
}

/// `{ id, name }` reference used by several services.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShallowReference {
    #[serde(default, deserialize_with = "id_as_string")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
}

/// JSON Patch operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Remove,
    Replace,
    Test,
    Copy,
    Move,
}

/// A single RFC 6902 JSON Patch operation, as used by the work item API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonPatchOperation {
    pub op: PatchOp,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl JsonPatchOperation {
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Add,
            path: path.into(),
            value: Some(value),
            from: None,
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: PatchOp::Remove,
            path: path.into(),
            value: None,
            from: None,
        }
    }

    pub fn test(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Test,
            path: path.into(),
            value: Some(value),
            from: None,
        }
    }
}

/// Some services return numeric ids, others strings; normalize to a string.
fn id_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patch_operation_serialization() {
        let op = JsonPatchOperation::add("/fields/System.Title", json!("Fix login"));
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({"op": "add", "path": "/fields/System.Title", "value": "Fix login"})
        );

        let op = JsonPatchOperation::remove("/relations/0");
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({"op": "remove", "path": "/relations/0"})
        );
    }

    #[test]
    fn test_shallow_reference_accepts_numeric_ids() {
        let r: ShallowReference = serde_json::from_value(json!({"id": 42, "name": "Run"})).unwrap();
        assert_eq!(r.id.as_deref(), Some("42"));

        let r: ShallowReference = serde_json::from_value(json!({"id": "abc"})).unwrap();
        assert_eq!(r.id.as_deref(), Some("abc"));

        let r: ShallowReference = serde_json::from_value(json!({})).unwrap();
        assert!(r.id.is_none());
    }
}
