//! Configuration management for ado-mcp.
//!
//! Settings are collected from several sources and merged with this
//! precedence, lowest first:
//! - built-in defaults
//! - TOML file at `$XDG_CONFIG_HOME/ado-mcp/config.toml` (`~/.config/...` otherwise)
//! - `ADO_MCP_*` environment variables
//! - command line flags
//!
//! ## Example
//!
//! ```rust,no_run
//! use ado_mcp::Config;
//!
//! let config = Config::default()
//!     .merge(Config::load_from_file().unwrap())
//!     .merge(Config::load_from_env().unwrap());
//! let resolved = config.resolve().unwrap();
//! println!("Organization: {}", resolved.organization);
//! ```

use crate::api::{ConnectionSettings, DEFAULT_API_VERSION, RetryPolicy};
use crate::cli::ConnectionArgs;
use crate::error::ConfigError;
use crate::parsed_property::ParsedProperty;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// A group of tools that can be enabled or disabled as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Artifacts,
    Boards,
    Repos,
    Pipelines,
    Search,
    Wiki,
    TestPlans,
    ProjectSettings,
}

impl Domain {
    pub const ALL: [Domain; 8] = [
        Domain::Artifacts,
        Domain::Boards,
        Domain::Repos,
        Domain::Pipelines,
        Domain::Search,
        Domain::Wiki,
        Domain::TestPlans,
        Domain::ProjectSettings,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Artifacts => "artifacts",
            Self::Boards => "boards",
            Self::Repos => "repos",
            Self::Pipelines => "pipelines",
            Self::Search => "search",
            Self::Wiki => "wiki",
            Self::TestPlans => "testplans",
            Self::ProjectSettings => "projectsettings",
        }
    }

    /// Parse a comma separated list; `all` expands to every domain.
    ///
    /// Duplicates are dropped while keeping first-seen order.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Domain>, ConfigError> {
        let mut domains = Vec::new();
        for name in names
            .iter()
            .flat_map(|n| n.as_ref().split(','))
            .map(str::trim)
            .filter(|n| !n.is_empty())
        {
            let parsed = if name.eq_ignore_ascii_case("all") {
                Domain::ALL.to_vec()
            } else {
                vec![name.parse::<Domain>()?]
            };
            for domain in parsed {
                if !domains.contains(&domain) {
                    domains.push(domain);
                }
            }
        }
        if domains.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "domains".to_string(),
                message: "at least one domain must be enabled".to_string(),
            });
        }
        Ok(domains)
    }
}

impl FromStr for Domain {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        Domain::ALL
            .into_iter()
            .find(|d| d.as_str() == normalized)
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "domains".to_string(),
                message: format!(
                    "unknown domain '{}' (expected one of: {})",
                    s.trim(),
                    Domain::ALL.map(Domain::as_str).join(", ")
                ),
            })
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of the TOML configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    pub organization: Option<String>,
    pub project: Option<String>,
    pub pat: Option<String>,
    pub base_url: Option<String>,
    pub api_version: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_base_delay_ms: Option<u64>,
    pub retry_max_delay_ms: Option<u64>,
    pub max_concurrent_requests: Option<usize>,
    pub domains: Option<Vec<String>>,
    pub read_only: Option<bool>,
}

/// Configuration assembled from CLI flags, environment, config file and defaults.
#[derive(Clone)]
pub struct Config {
    /// Organization name, or its `https://dev.azure.com/{org}` URL.
    pub organization: Option<ParsedProperty<String>>,
    /// Project used when a tool call does not name one.
    pub project: Option<ParsedProperty<String>>,
    pub pat: Option<ParsedProperty<String>>,
    /// Replaces every service host root.
    pub base_url: Option<ParsedProperty<String>>,
    pub api_version: Option<ParsedProperty<String>>,
    pub timeout_secs: Option<ParsedProperty<u64>>,
    pub max_retries: Option<ParsedProperty<u32>>,
    pub retry_base_delay_ms: Option<ParsedProperty<u64>>,
    pub retry_max_delay_ms: Option<ParsedProperty<u64>>,
    pub max_concurrent_requests: Option<ParsedProperty<usize>>,
    pub domains: Option<ParsedProperty<Vec<Domain>>>,
    /// Hide every tool that writes or deletes.
    pub read_only: Option<ParsedProperty<bool>>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("organization", &self.organization)
            .field("project", &self.project)
            .field("pat", &self.pat.as_ref().map(|p| p.source_name()))
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("domains", &self.domains)
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            organization: None,
            project: None,
            pat: None,
            base_url: None,
            api_version: Some(ParsedProperty::Default(DEFAULT_API_VERSION.to_string())),
            timeout_secs: Some(ParsedProperty::Default(30)),
            max_retries: Some(ParsedProperty::Default(3)),
            retry_base_delay_ms: Some(ParsedProperty::Default(500)),
            retry_max_delay_ms: Some(ParsedProperty::Default(30_000)),
            max_concurrent_requests: Some(ParsedProperty::Default(10)),
            domains: Some(ParsedProperty::Default(Domain::ALL.to_vec())),
            read_only: Some(ParsedProperty::Default(false)),
        }
    }
}

/// Fully validated settings, ready to open a connection.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub organization: String,
    pub project: Option<String>,
    pub pat: SecretString,
    pub base_url: Option<String>,
    pub api_version: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub max_concurrent_requests: usize,
    pub domains: Vec<Domain>,
    pub read_only: bool,
}

impl ResolvedConfig {
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            organization: self.organization.clone(),
            pat: self.pat.clone(),
            base_url: self.base_url.clone(),
            api_version: self.api_version.clone(),
            timeout: self.timeout,
            retry: self.retry,
            max_concurrent_requests: self.max_concurrent_requests,
        }
    }
}

fn file_prop<T: ToString>(value: T, path: &Path) -> ParsedProperty<T> {
    let original = value.to_string();
    ParsedProperty::File(value, path.to_path_buf(), original)
}

fn env_string(name: &str) -> Option<ParsedProperty<String>> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|v| ParsedProperty::Env(v.clone(), v))
}

fn env_parsed<T: FromStr>(name: &str, field: &str) -> Result<Option<ParsedProperty<T>>, ConfigError> {
    env_string(name)
        .map(|prop| {
            let raw = prop.into_value();
            raw.trim()
                .parse::<T>()
                .map(|v| ParsedProperty::Env(v, raw.clone()))
                .map_err(|_| ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("'{}' from {} is not valid", raw, name),
                })
        })
        .transpose()
}

fn cli_prop<T: Clone + ToString>(value: Option<&T>) -> Option<ParsedProperty<T>> {
    value.map(|v| ParsedProperty::Cli(v.clone(), v.to_string()))
}

impl Config {
    /// Path of the configuration file; the file itself may not exist.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = match std::env::var("XDG_CONFIG_HOME") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()
                .ok_or_else(|| ConfigError::InvalidValue {
                    field: "config_path".to_string(),
                    message: "could not determine home directory".to_string(),
                })?
                .join(".config"),
        };
        Ok(config_dir.join("ado-mcp").join("config.toml"))
    }

    /// Load the XDG configuration file, or nothing when it does not exist.
    pub fn load_from_file() -> Result<Self, ConfigError> {
        Self::load_from_path(&Self::config_path()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::empty());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::FileReadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let file: ConfigFile = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let domains = file
            .domains
            .map(|names| {
                Domain::parse_list(&names)
                    .map(|d| ParsedProperty::File(d, path.to_path_buf(), names.join(",")))
            })
            .transpose()?;

        Ok(Self {
            organization: file.organization.map(|v| file_prop(v, path)),
            project: file.project.map(|v| file_prop(v, path)),
            pat: file.pat.map(|v| ParsedProperty::File(v, path.to_path_buf(), String::new())),
            base_url: file.base_url.map(|v| file_prop(v, path)),
            api_version: file.api_version.map(|v| file_prop(v, path)),
            timeout_secs: file.timeout_secs.map(|v| file_prop(v, path)),
            max_retries: file.max_retries.map(|v| file_prop(v, path)),
            retry_base_delay_ms: file.retry_base_delay_ms.map(|v| file_prop(v, path)),
            retry_max_delay_ms: file.retry_max_delay_ms.map(|v| file_prop(v, path)),
            max_concurrent_requests: file.max_concurrent_requests.map(|v| file_prop(v, path)),
            domains,
            read_only: file.read_only.map(|v| file_prop(v, path)),
        })
    }

    /// Load `ADO_MCP_*` environment variables; blank values count as unset.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let domains = env_string("ADO_MCP_DOMAINS")
            .map(|prop| {
                let raw = prop.into_value();
                Domain::parse_list(&[raw.as_str()]).map(|d| ParsedProperty::Env(d, raw.clone()))
            })
            .transpose()?;

        Ok(Self {
            organization: env_string("ADO_MCP_ORGANIZATION"),
            project: env_string("ADO_MCP_PROJECT"),
            pat: std::env::var("ADO_MCP_PAT")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|v| ParsedProperty::Env(v, String::new())),
            base_url: env_string("ADO_MCP_BASE_URL"),
            api_version: env_string("ADO_MCP_API_VERSION"),
            timeout_secs: env_parsed("ADO_MCP_TIMEOUT_SECS", "timeout_secs")?,
            max_retries: env_parsed("ADO_MCP_MAX_RETRIES", "max_retries")?,
            retry_base_delay_ms: env_parsed("ADO_MCP_RETRY_BASE_DELAY_MS", "retry_base_delay_ms")?,
            retry_max_delay_ms: env_parsed("ADO_MCP_RETRY_MAX_DELAY_MS", "retry_max_delay_ms")?,
            max_concurrent_requests: env_parsed(
                "ADO_MCP_MAX_CONCURRENT_REQUESTS",
                "max_concurrent_requests",
            )?,
            domains,
            read_only: env_parsed("ADO_MCP_READ_ONLY", "read_only")?,
        })
    }

    /// Build a Config from command line flags.
    pub fn from_args(args: &ConnectionArgs) -> Result<Self, ConfigError> {
        let domains = args
            .domains
            .as_ref()
            .map(|names| {
                Domain::parse_list(names).map(|d| ParsedProperty::Cli(d, names.join(",")))
            })
            .transpose()?;

        Ok(Self {
            organization: cli_prop(args.organization.as_ref()),
            project: cli_prop(args.project.as_ref()),
            pat: args
                .pat
                .as_ref()
                .map(|v| ParsedProperty::Cli(v.clone(), "--pat".to_string())),
            base_url: cli_prop(args.base_url.as_ref()),
            api_version: cli_prop(args.api_version.as_ref()),
            timeout_secs: cli_prop(args.timeout_secs.as_ref()),
            max_retries: cli_prop(args.max_retries.as_ref()),
            retry_base_delay_ms: None,
            retry_max_delay_ms: None,
            max_concurrent_requests: cli_prop(args.max_concurrent_requests.as_ref()),
            domains,
            read_only: args
                .read_only
                .then(|| ParsedProperty::Cli(true, "--read-only".to_string())),
        })
    }

    fn empty() -> Self {
        Self {
            organization: None,
            project: None,
            pat: None,
            base_url: None,
            api_version: None,
            timeout_secs: None,
            max_retries: None,
            retry_base_delay_ms: None,
            retry_max_delay_ms: None,
            max_concurrent_requests: None,
            domains: None,
            read_only: None,
        }
    }

    /// Merge this config with another, preferring values from `other` when present.
    pub fn merge(self, other: Self) -> Self {
        Self {
            organization: other.organization.or(self.organization),
            project: other.project.or(self.project),
            pat: other.pat.or(self.pat),
            base_url: other.base_url.or(self.base_url),
            api_version: other.api_version.or(self.api_version),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            max_retries: other.max_retries.or(self.max_retries),
            retry_base_delay_ms: other.retry_base_delay_ms.or(self.retry_base_delay_ms),
            retry_max_delay_ms: other.retry_max_delay_ms.or(self.retry_max_delay_ms),
            max_concurrent_requests: other
                .max_concurrent_requests
                .or(self.max_concurrent_requests),
            domains: other.domains.or(self.domains),
            read_only: other.read_only.or(self.read_only),
        }
    }

    /// Defaults, then file, then environment, then `args`.
    pub fn load(args: &ConnectionArgs) -> Result<Self, ConfigError> {
        Ok(Self::default()
            .merge(Self::load_from_file()?)
            .merge(Self::load_from_env()?)
            .merge(Self::from_args(args)?))
    }

    /// Validate required fields and ranges.
    pub fn resolve(self) -> Result<ResolvedConfig, ConfigError> {
        let defaults = Self::default();

        let organization = self
            .organization
            .ok_or_else(|| missing("organization", "ADO_MCP_ORGANIZATION"))?;
        let organization = normalize_organization(&organization)?;

        let pat = self
            .pat
            .map(ParsedProperty::into_value)
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| missing("pat", "ADO_MCP_PAT"))?;

        let project = self
            .project
            .map(ParsedProperty::into_value)
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        let base_url = match self.base_url {
            Some(prop) => {
                let raw = prop.value().trim().to_string();
                Url::parse(&raw).map_err(|e| ConfigError::InvalidValue {
                    field: "base_url".to_string(),
                    message: format!("{} (from {})", e, prop.describe_source("ADO_MCP_BASE_URL")),
                })?;
                Some(raw)
            }
            None => None,
        };

        let api_version = self
            .api_version
            .or(defaults.api_version)
            .map(ParsedProperty::into_value)
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        let timeout_secs = at_least_one(
            self.timeout_secs.or(defaults.timeout_secs),
            "timeout_secs",
            "ADO_MCP_TIMEOUT_SECS",
        )?;
        let max_concurrent_requests = at_least_one(
            self.max_concurrent_requests
                .or(defaults.max_concurrent_requests)
                .map(|p| p.map(|v| v as u64)),
            "max_concurrent_requests",
            "ADO_MCP_MAX_CONCURRENT_REQUESTS",
        )?;

        let max_retries = self
            .max_retries
            .or(defaults.max_retries)
            .map_or(3, ParsedProperty::into_value);
        let base_delay = self
            .retry_base_delay_ms
            .or(defaults.retry_base_delay_ms)
            .map_or(500, ParsedProperty::into_value);
        let max_delay = self
            .retry_max_delay_ms
            .or(defaults.retry_max_delay_ms)
            .map_or(30_000, ParsedProperty::into_value);
        if base_delay > max_delay {
            return Err(ConfigError::InvalidValue {
                field: "retry_base_delay_ms".to_string(),
                message: format!(
                    "{} exceeds retry_max_delay_ms ({})",
                    base_delay, max_delay
                ),
            });
        }

        let domains = self
            .domains
            .or(defaults.domains)
            .map_or_else(|| Domain::ALL.to_vec(), ParsedProperty::into_value);
        let read_only = self.read_only.is_some_and(|p| *p);

        Ok(ResolvedConfig {
            organization,
            project,
            pat: SecretString::from(pat),
            base_url,
            api_version,
            timeout: Duration::from_secs(timeout_secs),
            retry: RetryPolicy::new(
                max_retries,
                Duration::from_millis(base_delay),
                Duration::from_millis(max_delay),
            ),
            max_concurrent_requests: max_concurrent_requests as usize,
            domains,
            read_only,
        })
    }

    /// Write a commented sample config to the XDG path unless one exists.
    ///
    /// Returns the path when a file was created.
    pub fn create_sample_config() -> Result<Option<PathBuf>, ConfigError> {
        let path = Self::config_path()?;
        Self::create_sample_config_at(&path).map(|created| created.then_some(path))
    }

    pub fn create_sample_config_at(path: &Path) -> Result<bool, ConfigError> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(dir) = path.parent()
            && !dir.exists()
        {
            fs::create_dir_all(dir).map_err(|e| ConfigError::DirectoryCreationError {
                path: dir.to_path_buf(),
                message: e.to_string(),
            })?;
        }
        fs::write(path, SAMPLE_CONFIG).map_err(|e| ConfigError::FileReadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(true)
    }
}

fn missing(field: &str, env_var: &str) -> ConfigError {
    ConfigError::MissingRequired {
        field: field.to_string(),
        env_var: env_var.to_string(),
    }
}

fn at_least_one(
    prop: Option<ParsedProperty<u64>>,
    field: &str,
    env_var: &str,
) -> Result<u64, ConfigError> {
    let prop = prop.ok_or_else(|| missing(field, env_var))?;
    let value = *prop;
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!("must be at least 1 (from {})", prop.describe_source(env_var)),
        });
    }
    Ok(value)
}

/// Accept a bare organization name or an organization URL.
fn normalize_organization(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let invalid = |message: String| ConfigError::InvalidValue {
        field: "organization".to_string(),
        message,
    };

    if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
        if trimmed.is_empty() {
            return Err(missing("organization", "ADO_MCP_ORGANIZATION"));
        }
        if trimmed.contains('/') {
            return Err(invalid(format!("'{}' is not an organization name", trimmed)));
        }
        return Ok(trimmed.to_string());
    }

    let url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    if let Some(org) = url
        .host_str()
        .and_then(|host| host.strip_suffix(".visualstudio.com"))
    {
        return Ok(org.to_string());
    }
    url.path_segments()
        .and_then(|mut segments| segments.next())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .ok_or_else(|| invalid(format!("no organization in '{}'", trimmed)))
}

const SAMPLE_CONFIG: &str = r#"# ado-mcp configuration file
# Location: $XDG_CONFIG_HOME/ado-mcp/config.toml (defaults to ~/.config/ado-mcp/config.toml)
# Every value can also be set through an ADO_MCP_* environment variable or a CLI flag.

# Azure DevOps organization name or URL (required)
# organization = "your-organization"

# Default project when a tool call does not pass one (optional)
# project = "your-project"

# Personal Access Token (required; prefer the ADO_MCP_PAT environment variable)
# pat = "your-pat-token"

# Override every service host root, e.g. for Azure DevOps Server (optional)
# base_url = "https://ado.example.com/tfs"

# REST API version (defaults to "7.1")
api_version = "7.1"

# Per-request timeout in seconds (defaults to 30)
timeout_secs = 30

# Retries for throttled or transient failures (defaults to 3)
max_retries = 3
retry_base_delay_ms = 500
retry_max_delay_ms = 30000

# Maximum number of in-flight requests (defaults to 10)
max_concurrent_requests = 10

# Tool groups to expose (defaults to all)
# domains = ["boards", "repos", "pipelines", "artifacts", "search", "wiki", "testplans", "projectsettings"]

# Hide every tool that creates, updates or deletes (defaults to false)
read_only = false
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::file_serial;
    use std::env;
    use tempfile::TempDir;

    const ENV_VARS: [&str; 12] = [
        "ADO_MCP_ORGANIZATION",
        "ADO_MCP_PROJECT",
        "ADO_MCP_PAT",
        "ADO_MCP_BASE_URL",
        "ADO_MCP_API_VERSION",
        "ADO_MCP_TIMEOUT_SECS",
        "ADO_MCP_MAX_RETRIES",
        "ADO_MCP_RETRY_BASE_DELAY_MS",
        "ADO_MCP_RETRY_MAX_DELAY_MS",
        "ADO_MCP_MAX_CONCURRENT_REQUESTS",
        "ADO_MCP_DOMAINS",
        "ADO_MCP_READ_ONLY",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            unsafe {
                env::remove_var(var);
            }
        }
    }

    fn minimal() -> Config {
        Config {
            organization: Some(ParsedProperty::Env("contoso".to_string(), "contoso".to_string())),
            pat: Some(ParsedProperty::Env("secret".to_string(), String::new())),
            ..Config::default()
        }
    }

    /// # Config Default Values
    ///
    /// Tests the built-in defaults.
    ///
    /// ## Test Scenario
    /// - Creates a default Config
    ///
    /// ## Expected Outcome
    /// - Required fields are unset, tunables carry their documented defaults
    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.organization, None);
        assert_eq!(config.pat, None);
        assert_eq!(config.api_version, Some(ParsedProperty::Default("7.1".to_string())));
        assert_eq!(config.timeout_secs, Some(ParsedProperty::Default(30)));
        assert_eq!(config.max_concurrent_requests, Some(ParsedProperty::Default(10)));
        assert_eq!(config.domains.as_deref().map(Vec::len), Some(8));
        assert_eq!(config.read_only, Some(ParsedProperty::Default(false)));
    }

    #[test]
    fn test_config_debug_hides_pat() {
        let rendered = format!("{:?}", minimal());
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("pat: Some(\"env\")"));
    }

    /// # Load Config from Environment Variables
    ///
    /// Tests reading `ADO_MCP_*` variables.
    ///
    /// ## Test Scenario
    /// - Sets organization, PAT, timeout, domains and read-only variables
    /// - Leaves project blank
    ///
    /// ## Expected Outcome
    /// - Values are parsed and tagged as env, blank values are ignored
    #[test]
    #[file_serial(env_tests)]
    fn test_load_from_env() {
        clear_env();
        unsafe {
            env::set_var("ADO_MCP_ORGANIZATION", "contoso");
            env::set_var("ADO_MCP_PROJECT", "  ");
            env::set_var("ADO_MCP_PAT", "secret");
            env::set_var("ADO_MCP_TIMEOUT_SECS", "45");
            env::set_var("ADO_MCP_DOMAINS", "boards, Repos,test-plans");
            env::set_var("ADO_MCP_READ_ONLY", "true");
        }

        let config = Config::load_from_env().unwrap();
        clear_env();

        assert_eq!(
            config.organization,
            Some(ParsedProperty::Env("contoso".to_string(), "contoso".to_string()))
        );
        assert_eq!(config.project, None);
        assert_eq!(config.timeout_secs.as_deref(), Some(&45));
        assert_eq!(
            config.domains.as_deref(),
            Some(&vec![Domain::Boards, Domain::Repos, Domain::TestPlans])
        );
        assert_eq!(config.read_only.as_ref().map(|p| p.source_name()), Some("env"));
        // PAT text is never kept as the "original" value.
        assert_eq!(config.pat.as_ref().and_then(|p| p.original()), Some(""));
    }

    #[test]
    #[file_serial(env_tests)]
    fn test_load_from_env_invalid_values() {
        clear_env();
        unsafe {
            env::set_var("ADO_MCP_MAX_RETRIES", "many");
        }
        let err = Config::load_from_env().unwrap_err();
        clear_env();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "max_retries"));

        unsafe {
            env::set_var("ADO_MCP_DOMAINS", "boards,calendar");
        }
        let err = Config::load_from_env().unwrap_err();
        clear_env();
        assert!(err.to_string().contains("calendar"));
    }

    /// # Load Config from File
    ///
    /// Tests reading the XDG config file.
    ///
    /// ## Test Scenario
    /// - Writes a config.toml under a temporary XDG_CONFIG_HOME
    ///
    /// ## Expected Outcome
    /// - Values are tagged with the file path and parsed into their types
    #[test]
    #[file_serial(env_tests)]
    fn test_load_from_file_valid_toml() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let config_dir = temp_dir.path().join("ado-mcp");
        fs::create_dir_all(&config_dir).unwrap();
        let config_path = config_dir.join("config.toml");
        fs::write(
            &config_path,
            r#"
organization = "file-org"
project = "Fabrikam"
max_retries = 5
domains = ["wiki", "search"]
read_only = true
"#,
        )
        .unwrap();

        let original_xdg = env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", temp_dir.path());
        }
        let result = Config::load_from_file();
        unsafe {
            match original_xdg {
                Some(value) => env::set_var("XDG_CONFIG_HOME", value),
                None => env::remove_var("XDG_CONFIG_HOME"),
            }
        }

        let config = result.unwrap();
        assert_eq!(
            config.organization,
            Some(ParsedProperty::File(
                "file-org".to_string(),
                config_path.clone(),
                "file-org".to_string()
            ))
        );
        assert_eq!(config.max_retries.as_deref(), Some(&5));
        assert_eq!(config.domains.as_deref(), Some(&vec![Domain::Wiki, Domain::Search]));
        assert_eq!(config.read_only.as_deref(), Some(&true));
        assert_eq!(config.timeout_secs, None);
    }

    #[test]
    fn test_load_from_path_errors() {
        let temp_dir = TempDir::new().unwrap();
        let missing_path = temp_dir.path().join("absent.toml");
        let config = Config::load_from_path(&missing_path).unwrap();
        assert!(config.organization.is_none());

        let bad = temp_dir.path().join("bad.toml");
        fs::write(&bad, "organisation = \"typo\"\n").unwrap();
        let err = Config::load_from_path(&bad).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    /// # Merge Precedence
    ///
    /// Tests that later sources override earlier ones field by field.
    ///
    /// ## Test Scenario
    /// - Merges a file config and an env config with overlapping fields
    ///
    /// ## Expected Outcome
    /// - Overlapping fields come from env, the rest fall through
    #[test]
    fn test_config_merge_other_takes_precedence() {
        let path = PathBuf::from("/tmp/config.toml");
        let file = Config {
            organization: Some(file_prop("file-org".to_string(), &path)),
            project: Some(file_prop("FileProject".to_string(), &path)),
            ..Config::empty()
        };
        let env = Config {
            organization: Some(ParsedProperty::Env("env-org".to_string(), "env-org".to_string())),
            ..Config::empty()
        };

        let merged = Config::default().merge(file).merge(env);
        assert_eq!(merged.organization.as_deref().map(String::as_str), Some("env-org"));
        assert_eq!(merged.project.as_ref().map(|p| p.source_name()), Some("file"));
        assert_eq!(merged.timeout_secs.as_ref().map(|p| p.source_name()), Some("default"));
    }

    #[test]
    fn test_from_args() {
        let args = ConnectionArgs {
            organization: Some("cli-org".to_string()),
            domains: Some(vec!["all".to_string()]),
            read_only: true,
            ..Default::default()
        };
        let config = Config::from_args(&args).unwrap();
        assert_eq!(config.organization.as_ref().map(|p| p.source_name()), Some("cli"));
        assert_eq!(config.domains.as_deref().map(Vec::len), Some(8));
        assert_eq!(config.read_only.as_deref(), Some(&true));

        let config = Config::from_args(&ConnectionArgs::default()).unwrap();
        assert!(config.read_only.is_none());
    }

    /// # Resolve Required Fields
    ///
    /// Tests validation of organization and PAT.
    ///
    /// ## Test Scenario
    /// - Resolves configs missing each required field, then a complete one
    ///
    /// ## Expected Outcome
    /// - Missing fields report MissingRequired with their env var
    /// - A complete config yields connection settings with the PAT wrapped
    #[test]
    fn test_resolve_required_fields() {
        let err = Config::default().resolve().unwrap_err();
        assert!(
            matches!(err, ConfigError::MissingRequired { ref env_var, .. } if env_var == "ADO_MCP_ORGANIZATION")
        );

        let no_pat = Config {
            pat: None,
            ..minimal()
        };
        let err = no_pat.resolve().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref field, .. } if field == "pat"));

        let resolved = minimal().resolve().unwrap();
        assert_eq!(resolved.organization, "contoso");
        assert_eq!(resolved.pat.expose_secret(), "secret");
        assert_eq!(resolved.project, None);
        assert_eq!(resolved.timeout, Duration::from_secs(30));
        assert_eq!(resolved.retry.max_retries, 3);
        assert!(!resolved.read_only);

        let settings = resolved.connection_settings();
        assert_eq!(settings.max_concurrent_requests, 10);
        assert_eq!(settings.api_version, "7.1");
    }

    #[test]
    fn test_resolve_rejects_bad_values() {
        let config = Config {
            timeout_secs: Some(ParsedProperty::Env(0, "0".to_string())),
            ..minimal()
        };
        let err = config.resolve().unwrap_err();
        assert!(err.to_string().contains("ADO_MCP_TIMEOUT_SECS"));

        let config = Config {
            retry_base_delay_ms: Some(ParsedProperty::Default(5_000)),
            retry_max_delay_ms: Some(ParsedProperty::Default(1_000)),
            ..minimal()
        };
        assert!(config.resolve().is_err());

        let config = Config {
            base_url: Some(ParsedProperty::Cli("not a url".to_string(), "--base-url".to_string())),
            ..minimal()
        };
        assert!(matches!(
            config.resolve().unwrap_err(),
            ConfigError::InvalidValue { ref field, .. } if field == "base_url"
        ));
    }

    /// # Organization Normalization
    ///
    /// Tests accepting organization URLs in place of names.
    ///
    /// ## Test Scenario
    /// - Normalizes a bare name, a dev.azure.com URL and a visualstudio.com URL
    ///
    /// ## Expected Outcome
    /// - All yield the organization name, paths without one are rejected
    #[test]
    fn test_normalize_organization() {
        assert_eq!(normalize_organization(" contoso ").unwrap(), "contoso");
        assert_eq!(
            normalize_organization("https://dev.azure.com/contoso/").unwrap(),
            "contoso"
        );
        assert_eq!(
            normalize_organization("https://contoso.visualstudio.com").unwrap(),
            "contoso"
        );
        assert!(normalize_organization("https://dev.azure.com").is_err());
        assert!(normalize_organization("contoso/Fabrikam").is_err());
    }

    #[test]
    fn test_domain_parsing() {
        assert_eq!("Project_Settings".parse::<Domain>().unwrap(), Domain::ProjectSettings);
        assert_eq!("TESTPLANS".parse::<Domain>().unwrap(), Domain::TestPlans);
        assert!("calendar".parse::<Domain>().is_err());
        assert_eq!(
            Domain::parse_list(&["wiki,boards", "wiki"]).unwrap(),
            vec![Domain::Wiki, Domain::Boards]
        );
        assert!(Domain::parse_list(&[" , "]).is_err());
    }

    #[test]
    fn test_create_sample_config_never_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ado-mcp").join("config.toml");

        assert!(Config::create_sample_config_at(&path).unwrap());
        let sample = fs::read_to_string(&path).unwrap();
        assert!(sample.contains("ADO_MCP_PAT"));
        // The sample parses back into a valid file config.
        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.timeout_secs.as_deref(), Some(&30));

        fs::write(&path, "project = \"Mine\"\n").unwrap();
        assert!(!Config::create_sample_config_at(&path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "project = \"Mine\"\n");
    }
}
