//! Command line interface.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::{LogConfig, LogFormat, LogLevel};

/// Connection and tool selection flags shared by `serve` and `tools`.
///
/// Every flag is optional here; missing values fall back to `ADO_MCP_*`
/// environment variables, then the config file, then defaults.
#[derive(ClapArgs, Clone, Default, Debug)]
pub struct ConnectionArgs {
    // Azure DevOps Connection
    /// Azure DevOps organization name or URL
    #[arg(short, long, help_heading = "Azure DevOps Connection")]
    pub organization: Option<String>,

    /// Default project for project-scoped tools
    #[arg(short, long, help_heading = "Azure DevOps Connection")]
    pub project: Option<String>,

    /// Personal Access Token (prefer ADO_MCP_PAT over this flag)
    #[arg(short = 't', long, help_heading = "Azure DevOps Connection")]
    pub pat: Option<String>,

    /// Send every request to this URL instead of the Azure DevOps hosts
    #[arg(long, help_heading = "Azure DevOps Connection")]
    pub base_url: Option<String>,

    /// REST API version [default: 7.1]
    #[arg(long, help_heading = "Azure DevOps Connection")]
    pub api_version: Option<String>,

    // Performance Tuning
    /// Request timeout in seconds [default: 30]
    #[arg(long, help_heading = "Performance Tuning")]
    pub timeout_secs: Option<u64>,

    /// Retries for throttled or failed requests [default: 3]
    #[arg(long, help_heading = "Performance Tuning")]
    pub max_retries: Option<u32>,

    /// Maximum parallel API requests [default: 10]
    #[arg(long, help_heading = "Performance Tuning")]
    pub max_concurrent_requests: Option<usize>,

    // Tools
    /// Domains to expose, comma separated (artifacts, boards, repos, pipelines,
    /// search, wiki, testplans, projectsettings or all) [default: all]
    #[arg(long, value_delimiter = ',', help_heading = "Tools")]
    pub domains: Option<Vec<String>>,

    /// Only register tools that do not modify anything
    #[arg(long, help_heading = "Tools")]
    pub read_only: bool,
}

/// Logging flags.
#[derive(ClapArgs, Clone, Default, Debug)]
pub struct LogArgs {
    /// Log level; logging is off when unset
    #[arg(long, value_enum, env = "ADO_MCP_LOG_LEVEL", global = true, help_heading = "Logging")]
    pub log_level: Option<LogLevel>,

    /// Append logs to this file instead of stderr
    #[arg(long, env = "ADO_MCP_LOG_FILE", global = true, help_heading = "Logging")]
    pub log_file: Option<PathBuf>,

    /// Log line format
    #[arg(
        long,
        value_enum,
        env = "ADO_MCP_LOG_FORMAT",
        default_value_t = LogFormat::Text,
        global = true,
        help_heading = "Logging"
    )]
    pub log_format: LogFormat,
}

impl LogArgs {
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.log_level,
            file: self.log_file.clone(),
            format: self.log_format,
        }
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Serve MCP over stdio (the default)
    Serve(ConnectionArgs),
    /// Print the tool definitions as JSON and exit
    Tools(ConnectionArgs),
    /// Create a sample config file at ~/.config/ado-mcp/config.toml
    InitConfig,
}

#[derive(Parser, Clone, Debug)]
#[command(
    name = "ado-mcp",
    version = crate::VERSION,
    long_version = crate::LONG_VERSION,
    about = "Azure DevOps tools for LLM agents over the Model Context Protocol",
    after_help = "Examples:\n    \
        # Serve with a default project\n    \
        ADO_MCP_PAT=<PAT> ado-mcp -o contoso -p Fabrikam\n\n    \
        # Only expose read-only Boards and Repos tools\n    \
        ado-mcp serve -o contoso --domains boards,repos --read-only\n\n    \
        # List the tools a configuration would expose\n    \
        ado-mcp tools --domains pipelines\n\n    \
        # Create a sample config file\n    \
        ado-mcp init-config"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Connection flags for the default `serve` command
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

impl Cli {
    /// The command to run; bare invocations serve with the top-level flags.
    pub fn into_command(self) -> Command {
        match self.command {
            Some(command) => command,
            None => Command::Serve(self.connection),
        }
    }
}
