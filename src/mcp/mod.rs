//! Model Context Protocol server exposing the domain clients as tools.
//!
//! The server speaks line-delimited JSON-RPC 2.0 on stdio. `tools/list`
//! publishes one definition per registered tool and `tools/call` returns an
//! [`OperationResult`](crate::envelope::OperationResult) envelope as the
//! call's structured content.

pub mod protocol;
pub mod registry;
pub mod server;
pub mod tools;

pub use protocol::{JsonRpcRequest, JsonRpcResponse, ServerInfo};
pub use registry::{ToolAnnotations, ToolCallOutcome, ToolDefinition, ToolRegistry};
pub use server::{MAX_LINE_BYTES, McpServer, serve_stdio};
pub use tools::build_registry;
