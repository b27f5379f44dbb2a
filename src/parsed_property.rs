use std::{fmt::Display, ops::Deref, path::PathBuf};

/// A configuration value together with where it came from.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ParsedProperty<T> {
    /// Command line flag (parsed_value, flag_text)
    Cli(T, String),
    /// Environment variable (parsed_value, env_var_value)
    Env(T, String),
    /// Configuration file (parsed_value, file, toml_value_string)
    File(T, PathBuf, String),
    /// Built-in default
    Default(T),
}

impl<T> ParsedProperty<T> {
    pub fn value(&self) -> &T {
        match self {
            ParsedProperty::Cli(value, _)
            | ParsedProperty::Env(value, _)
            | ParsedProperty::File(value, _, _)
            | ParsedProperty::Default(value) => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            ParsedProperty::Cli(value, _)
            | ParsedProperty::Env(value, _)
            | ParsedProperty::File(value, _, _)
            | ParsedProperty::Default(value) => value,
        }
    }

    pub fn source_name(&self) -> &'static str {
        match self {
            ParsedProperty::Cli(_, _) => "cli",
            ParsedProperty::Env(_, _) => "env",
            ParsedProperty::File(_, _, _) => "file",
            ParsedProperty::Default(_) => "default",
        }
    }

    /// The raw text the value was parsed from; defaults have none.
    pub fn original(&self) -> Option<&str> {
        match self {
            ParsedProperty::Cli(_, original)
            | ParsedProperty::Env(_, original)
            | ParsedProperty::File(_, _, original) => Some(original),
            ParsedProperty::Default(_) => None,
        }
    }

    /// Human-readable origin for error messages, e.g. `env (ADO_MCP_PAT)`.
    pub fn describe_source(&self, env_var: &str) -> String {
        match self {
            ParsedProperty::Cli(_, flag) => format!("cli ({})", flag),
            ParsedProperty::Env(_, _) => format!("env ({})", env_var),
            ParsedProperty::File(_, path, _) => format!("file ({})", path.display()),
            ParsedProperty::Default(_) => "default".to_string(),
        }
    }

    /// Transform the value while keeping its source.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ParsedProperty<U> {
        match self {
            ParsedProperty::Cli(value, original) => ParsedProperty::Cli(f(value), original),
            ParsedProperty::Env(value, original) => ParsedProperty::Env(f(value), original),
            ParsedProperty::File(value, path, original) => {
                ParsedProperty::File(f(value), path, original)
            }
            ParsedProperty::Default(value) => ParsedProperty::Default(f(value)),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            ParsedProperty::Default(_) => 0,
            ParsedProperty::File(_, _, _) => 1,
            ParsedProperty::Env(_, _) => 2,
            ParsedProperty::Cli(_, _) => 3,
        }
    }

    /// Pick whichever of two candidates has the higher-precedence source.
    ///
    /// Ties keep `self`.
    pub fn prefer(self, other: Self) -> Self {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }
}

impl<T> Deref for ParsedProperty<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.value()
    }
}

impl<T: Display> Display for ParsedProperty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value().fmt(f)
    }
}

impl<T: AsRef<str>> AsRef<str> for ParsedProperty<T> {
    fn as_ref(&self) -> &str {
        self.value().as_ref()
    }
}

impl<T> From<T> for ParsedProperty<T> {
    fn from(value: T) -> Self {
        ParsedProperty::Default(value)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    /// # ParsedProperty Source Tracking
    ///
    /// Tests value, source name and original text for every source.
    ///
    /// ## Test Scenario
    /// - Builds one property per source holding the same organization
    ///
    /// ## Expected Outcome
    /// - Values match, source names differ, defaults have no original text
    #[test]
    fn test_parsed_property_sources() {
        let cli = ParsedProperty::Cli("contoso".to_string(), "--organization".to_string());
        let env = ParsedProperty::Env("contoso".to_string(), "contoso".to_string());
        let file = ParsedProperty::File(
            "contoso".to_string(),
            PathBuf::from("/etc/ado-mcp/config.toml"),
            "organization = \"contoso\"".to_string(),
        );
        let default: ParsedProperty<String> = "contoso".to_string().into();

        for prop in [&cli, &env, &file, &default] {
            assert_eq!(&**prop, "contoso");
        }
        assert_eq!(cli.source_name(), "cli");
        assert_eq!(env.source_name(), "env");
        assert_eq!(file.source_name(), "file");
        assert_eq!(default.source_name(), "default");
        assert_eq!(env.original(), Some("contoso"));
        assert_eq!(default.original(), None);
    }

    /// # Precedence
    ///
    /// Tests that `prefer` follows cli > env > file > default.
    ///
    /// ## Test Scenario
    /// - Combines properties from different sources in both orders
    ///
    /// ## Expected Outcome
    /// - The higher-ranked source always wins, ties keep the receiver
    #[test]
    fn test_parsed_property_prefer() {
        let file = ParsedProperty::File(5u32, PathBuf::from("c.toml"), "5".to_string());
        let env = ParsedProperty::Env(7u32, "7".to_string());
        let default = ParsedProperty::Default(3u32);

        assert_eq!(*default.clone().prefer(file.clone()), 5);
        assert_eq!(*file.clone().prefer(default.clone()), 5);
        assert_eq!(*file.clone().prefer(env.clone()), 7);
        assert_eq!(*ParsedProperty::Cli(9u32, "--x".to_string()).prefer(env), 9);
        assert_eq!(*ParsedProperty::Default(1u32).prefer(ParsedProperty::Default(2)), 1);
    }

    #[test]
    fn test_parsed_property_map_keeps_source() {
        let env = ParsedProperty::Env("12".to_string(), "12".to_string());
        let mapped = env.map(|s| s.len());
        assert_eq!(*mapped, 2);
        assert_eq!(mapped.source_name(), "env");
        assert_eq!(mapped.describe_source("ADO_MCP_TIMEOUT"), "env (ADO_MCP_TIMEOUT)");
    }
}
