//! # ado-mcp
//!
//! An Azure DevOps client SDK and a Model Context Protocol server that
//! exposes it to LLM agents as tools. This library provides:
//!
//! - Typed clients for Artifacts, Boards, Dashboards, Repos, Pipelines,
//!   Search, Wiki, Test Plans and Project Settings
//! - Layered configuration (file, environment, command line)
//! - A JSON-RPC 2.0 stdio server with one tool per client operation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ado_mcp::api::{AdoHttpClient, ConnectionSettings, DomainClients};
//! use ado_mcp::config::Domain;
//! use ado_mcp::mcp::{McpServer, ServerInfo, build_registry, serve_stdio};
//! use secrecy::SecretString;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = ConnectionSettings::new("contoso", SecretString::from("my-pat".to_string()));
//! let clients = DomainClients::new(AdoHttpClient::new(settings)?, Some("Fabrikam".to_string()));
//!
//! let registry = build_registry(&clients, &Domain::ALL, false);
//! serve_stdio(McpServer::new(registry, ServerInfo::default())).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod envelope;
pub mod error;
pub mod logging;
pub mod mcp;
pub mod models;
pub mod parsed_property;
pub mod utils;
pub mod validation;

// Re-export commonly used types for convenience
pub use api::{AdoHttpClient, ConnectionSettings, DomainClients};
pub use config::{Config, ResolvedConfig};
pub use envelope::OperationResult;
pub use error::{AdoMcpError, AdoMcpResult, ApiError, ApiResult};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version plus the git commit the binary was built from.
pub const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("ADO_MCP_GIT_HASH"), ")");

/// Version string reported to MCP clients.
pub fn build_version() -> String {
    LONG_VERSION.to_string()
}
