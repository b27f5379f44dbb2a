//! Tool registry: definitions, input schemas and type-erased handlers.
//!
//! Every handler is a plain async function from a deserialized argument
//! struct to an [`ApiResult`]. The registry generates the JSON schema for the
//! argument type, decodes incoming arguments, and turns the outcome into an
//! [`OperationResult`] envelope so API failures reach the agent as data
//! rather than as protocol errors.

use futures::FutureExt;
use futures::future::BoxFuture;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::envelope::OperationResult;
use crate::error::{ApiResult, McpError};

/// Behavioral hints published with each tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    pub read_only_hint: bool,
    pub destructive_hint: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub annotations: ToolAnnotations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToolKind {
    Read,
    Write,
    Destructive,
}

type ToolHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, OperationResult<Value>> + Send + Sync>;

struct RegisteredTool {
    definition: ToolDefinition,
    handler: ToolHandler,
}

/// Result of one `tools/call`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallOutcome {
    pub envelope: OperationResult<Value>,
}

impl ToolCallOutcome {
    /// Render as an MCP `CallToolResult`.
    pub fn to_call_result(&self) -> Value {
        let structured = serde_json::to_value(&self.envelope).unwrap_or(Value::Null);
        let text = serde_json::to_string_pretty(&structured).unwrap_or_else(|_| structured.to_string());
        json!({
            "content": [{"type": "text", "text": text}],
            "structuredContent": structured,
            "isError": !self.envelope.is_success(),
        })
    }
}

/// Ordered set of tools; write tools are dropped when read-only.
pub struct ToolRegistry {
    read_only: bool,
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("read_only", &self.read_only)
            .field("tools", &self.tools.len())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new(read_only: bool) -> Self {
        Self {
            read_only,
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn register_read<A, T, F, Fut>(&mut self, name: &str, description: &str, handler: F)
    where
        A: DeserializeOwned + JsonSchema + Send + 'static,
        T: Serialize + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        self.insert(name, description, ToolKind::Read, handler);
    }

    pub fn register_write<A, T, F, Fut>(&mut self, name: &str, description: &str, handler: F)
    where
        A: DeserializeOwned + JsonSchema + Send + 'static,
        T: Serialize + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        self.insert(name, description, ToolKind::Write, handler);
    }

    pub fn register_destructive<A, T, F, Fut>(&mut self, name: &str, description: &str, handler: F)
    where
        A: DeserializeOwned + JsonSchema + Send + 'static,
        T: Serialize + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        self.insert(name, description, ToolKind::Destructive, handler);
    }

    fn insert<A, T, F, Fut>(&mut self, name: &str, description: &str, kind: ToolKind, handler: F)
    where
        A: DeserializeOwned + JsonSchema + Send + 'static,
        T: Serialize + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        if self.read_only && kind != ToolKind::Read {
            debug!(tool = name, "Skipping write tool in read-only mode");
            return;
        }

        let definition = ToolDefinition {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: input_schema::<A>(),
            annotations: ToolAnnotations {
                read_only_hint: kind == ToolKind::Read,
                destructive_hint: kind == ToolKind::Destructive,
            },
        };

        let handler: ToolHandler = Arc::new(move |arguments: Value| {
            match serde_json::from_value::<A>(arguments) {
                Ok(args) => {
                    let call = handler(args);
                    async move {
                        match call.await {
                            Ok(data) => match serde_json::to_value(data) {
                                Ok(value) => OperationResult::success(value),
                                Err(e) => OperationResult::failure(format!(
                                    "Failed to serialize result: {}",
                                    e
                                )),
                            },
                            Err(e) => OperationResult::failure(e.to_string()),
                        }
                    }
                    .boxed()
                }
                Err(e) => {
                    futures::future::ready(OperationResult::failure(format!(
                        "Invalid arguments: {}",
                        e
                    )))
                    .boxed()
                }
            }
        });

        let tool = RegisteredTool {
            definition,
            handler,
        };
        match self.index.get(name) {
            Some(&position) => {
                warn!(tool = name, "Tool registered twice, keeping the latest");
                self.tools[position] = tool;
            }
            None => {
                self.index.insert(name.to_string(), self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool. Only an unknown name is a protocol error.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> Result<ToolCallOutcome, McpError> {
        let tool = self
            .index
            .get(name)
            .and_then(|&i| self.tools.get(i))
            .ok_or_else(|| McpError::InvalidParams(format!("Unknown tool: {}", name)))?;

        let arguments = match arguments {
            None | Some(Value::Null) => json!({}),
            Some(value) => value,
        };

        let started = Instant::now();
        let envelope = (tool.handler)(arguments).await;
        info!(
            tool = name,
            success = envelope.is_success(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tool call finished"
        );
        Ok(ToolCallOutcome { envelope })
    }
}

/// JSON schema for an argument type, with the meta keys MCP clients ignore removed.
fn input_schema<A: JsonSchema>() -> Value {
    let mut schema = serde_json::to_value(schemars::schema_for!(A))
        .unwrap_or_else(|_| json!({"type": "object"}));
    if let Some(object) = schema.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
        object
            .entry("type")
            .or_insert_with(|| Value::String("object".to_string()));
    }
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ValidationError};

    #[derive(Debug, Deserialize, JsonSchema)]
    struct EchoArgs {
        text: String,
        #[serde(default)]
        times: Option<usize>,
    }

    #[derive(Debug, Deserialize, JsonSchema)]
    struct NoArgs {}

    fn sample_registry(read_only: bool) -> ToolRegistry {
        let mut registry = ToolRegistry::new(read_only);
        registry.register_read("echo", "Repeat text", |args: EchoArgs| async move {
            Ok(args.text.repeat(args.times.unwrap_or(1)))
        });
        registry.register_write("fail", "Always fails", |_: NoArgs| async move {
            Err::<(), _>(ApiError::Validation(ValidationError::MissingProject))
        });
        registry.register_destructive("drop", "Deletes things", |_: NoArgs| async move {
            Ok(())
        });
        registry
    }

    /// # Definitions and Annotations
    ///
    /// Tests tool definitions and read-only filtering.
    ///
    /// ## Test Scenario
    /// - Builds the same registry in normal and read-only mode
    ///
    /// ## Expected Outcome
    /// - Normal mode lists all tools in order with matching hints and object schemas
    /// - Read-only mode keeps only read tools
    #[test]
    fn test_definitions_and_read_only() {
        let registry = sample_registry(false);
        let definitions = registry.definitions();
        let names: Vec<_> = definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["echo", "fail", "drop"]);

        let echo = &definitions[0];
        assert!(echo.annotations.read_only_hint);
        assert_eq!(echo.input_schema["type"], "object");
        assert!(echo.input_schema["properties"]["text"].is_object());
        assert!(echo.input_schema.get("$schema").is_none());
        assert!(definitions[2].annotations.destructive_hint);

        let registry = sample_registry(true);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("echo"));
        assert!(!registry.contains("drop"));
    }

    /// # Envelope Outcomes
    ///
    /// Tests how handler results become envelopes.
    ///
    /// ## Test Scenario
    /// - Calls a tool with valid, invalid and missing arguments, and a failing tool
    ///
    /// ## Expected Outcome
    /// - Success carries data, bad arguments and API errors are failure envelopes
    #[tokio::test]
    async fn test_call_outcomes() {
        let registry = sample_registry(false);

        let ok = registry
            .call("echo", Some(json!({"text": "ab", "times": 2})))
            .await
            .unwrap();
        assert_eq!(ok.envelope, OperationResult::success(json!("abab")));
        let rendered = ok.to_call_result();
        assert_eq!(rendered["isError"], false);
        assert_eq!(rendered["structuredContent"]["data"], "abab");
        assert_eq!(rendered["content"][0]["type"], "text");

        let bad = registry.call("echo", None).await.unwrap();
        assert!(!bad.envelope.is_success());
        assert!(
            bad.envelope
                .error_message
                .as_deref()
                .unwrap()
                .starts_with("Invalid arguments")
        );

        let failed = registry.call("fail", Some(Value::Null)).await.unwrap();
        assert_eq!(failed.to_call_result()["isError"], true);
        assert!(failed.envelope.error_message.unwrap().contains("project is required"));

        let unknown = registry.call("nope", None).await.unwrap_err();
        assert!(matches!(unknown, McpError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn test_duplicate_registration_replaces() {
        let mut registry = ToolRegistry::new(false);
        registry.register_read("echo", "first", |_: NoArgs| async { Ok(1) });
        registry.register_read("echo", "second", |_: NoArgs| async { Ok(2) });

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.definitions()[0].description, "second");
        let outcome = registry.call("echo", None).await.unwrap();
        assert_eq!(outcome.envelope.data, Some(json!(2)));
    }
}
