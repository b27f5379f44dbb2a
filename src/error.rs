//! Unified error handling for ado-mcp.
//!
//! Errors are grouped by the layer that produces them so callers can match on
//! the category they care about:
//!
//! - [`ApiError`]: failures talking to Azure DevOps (HTTP status, transport, parsing)
//! - [`ValidationError`]: input rejected before any request is sent
//! - [`ConfigError`]: configuration loading and resolution
//! - [`McpError`]: JSON-RPC/MCP protocol errors
//!
//! ## Example
//!
//! ```rust
//! use ado_mcp::error::{AdoMcpError, ApiError};
//!
//! fn example() -> Result<(), AdoMcpError> {
//!     Err(ApiError::Unauthorized)?;
//!     Ok(())
//! }
//! assert!(example().is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for the library.
#[derive(Error, Debug)]
pub enum AdoMcpError {
    /// An error occurred while interacting with the Azure DevOps API.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// An error occurred while loading or validating configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A protocol-level MCP error.
    #[error("MCP error: {0}")]
    Mcp(#[from] McpError),

    /// A generic error for cases not covered by specific error types.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Errors that can occur when calling the Azure DevOps REST API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The API request was unauthorized (401).
    #[error("Unauthorized: invalid or expired Personal Access Token")]
    Unauthorized,

    /// The token is valid but lacks permission (403).
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Message returned by the service.
        message: String,
    },

    /// The requested resource was not found (404).
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Description of the resource that was not found.
        resource: String,
    },

    /// The request conflicts with the current state of the resource (409/412).
    #[error("Conflict: {message}")]
    Conflict {
        /// Message returned by the service.
        message: String,
    },

    /// The API rate limit was exceeded (429) and retries were exhausted.
    #[error("Rate limit exceeded, retry after {retry_after_seconds} seconds")]
    RateLimited {
        /// Number of seconds to wait before retrying.
        retry_after_seconds: u64,
    },

    /// The API returned an error response.
    #[error("API request failed with status {status}: {message}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Failed to parse the API response.
    #[error("Failed to parse API response: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
    },

    /// A network error occurred.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A request URL could not be built.
    #[error("Invalid request URL: {message}")]
    InvalidUrl {
        /// Description of the problem.
        message: String,
    },

    /// Exceeded maximum pagination requests.
    #[error("Exceeded maximum requests ({max}) while fetching data, retrieved {retrieved} items")]
    PaginationLimitExceeded {
        /// Maximum allowed requests.
        max: usize,
        /// Number of items retrieved before the limit was hit.
        retrieved: usize,
    },

    /// Input was rejected before a request was made.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
}

impl ApiError {
    /// HTTP status associated with this error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::Conflict { .. } => Some(409),
            Self::RateLimited { .. } => Some(429),
            Self::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Input validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required value was empty.
    #[error("{field} must not be empty")]
    Empty {
        /// Name of the field.
        field: String,
    },

    /// A value exceeded its maximum length.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Name of the field.
        field: String,
        /// Maximum allowed length.
        max: usize,
    },

    /// A value contained characters Azure DevOps rejects.
    #[error("{field} contains invalid characters: {characters}")]
    InvalidCharacters {
        /// Name of the field.
        field: String,
        /// The offending characters.
        characters: String,
    },

    /// Invalid git reference.
    #[error("Invalid git reference '{reference}': contains forbidden characters or sequences")]
    InvalidReference {
        /// The invalid reference string.
        reference: String,
    },

    /// Invalid wiki or repository path.
    #[error("Invalid path '{path}'")]
    InvalidPath {
        /// The rejected path.
        path: String,
    },

    /// A value that is well-formed but not acceptable for this field.
    #[error("Invalid {field}: {message}")]
    Invalid {
        /// Name of the field.
        field: String,
        /// What is wrong with the value.
        message: String,
    },

    /// A numeric value fell outside its allowed range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// Name of the field.
        field: String,
        /// Minimum allowed value.
        min: i64,
        /// Maximum allowed value.
        max: i64,
        /// The rejected value.
        value: i64,
    },

    /// Neither the call nor the configuration supplied a project.
    #[error("project is required (pass a project or configure a default project)")]
    MissingProject,
}

/// Errors that can occur during configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required configuration field is missing.
    #[error("{field} is required (use --{field}, {env_var} env var, or config file)")]
    MissingRequired {
        /// Name of the missing field.
        field: String,
        /// Environment variable name for this field.
        env_var: String,
    },

    /// Failed to read the configuration file.
    #[error("Failed to read config file at {path}: {message}")]
    FileReadError {
        /// Path to the config file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Failed to parse the configuration file.
    #[error("Failed to parse config file at {path}: {message}")]
    ParseError {
        /// Path to the config file.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// An invalid value was provided for a configuration field.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        /// Name of the field with invalid value.
        field: String,
        /// Description of why the value is invalid.
        message: String,
    },

    /// Failed to create config directory.
    #[error("Failed to create config directory at {path}: {message}")]
    DirectoryCreationError {
        /// Path where directory creation failed.
        path: PathBuf,
        /// Error message.
        message: String,
    },
}

/// JSON-RPC / MCP protocol errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum McpError {
    /// The message was not valid JSON.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The message was JSON but not a valid request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The method is not supported.
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// The parameters were invalid (including unknown tool names).
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// An internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl McpError {
    /// JSON-RPC 2.0 error code.
    pub fn code(&self) -> i32 {
        match self {
            Self::ParseError(_) => -32700,
            Self::InvalidRequest(_) => -32600,
            Self::MethodNotFound(_) => -32601,
            Self::InvalidParams(_) => -32602,
            Self::Internal(_) => -32603,
        }
    }
}

/// Result alias for Azure DevOps API calls.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Result alias using [`AdoMcpError`].
///
/// Not re-exported from the crate root to avoid shadowing `anyhow::Result`.
pub type AdoMcpResult<T> = std::result::Result<T, AdoMcpError>;
