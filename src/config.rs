//! Application settings.
//!
//! Read from a TOML file, then overridden by `DRIVE_SHEET_*` environment
//! variables:
//!
//! ```toml
//! app_id = "00000000-0000-0000-0000-000000000000"
//! scopes = ["User.Read", "Files.Read"]    # or "User.Read;Files.Read"
//! tenant = "common"
//! graph_url = "https://graph.microsoft.com/beta"
//! ```
use crate::graph::client::DEFAULT_GRAPH_URL;
use glob::Pattern;
use serde::Deserialize;
use serde::Deserializer;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Settings file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "appsettings.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read settings file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing setting '{0}'")]
    Missing(&'static str),

    #[error("Invalid file pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),
}

/// Top-level settings structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Application (client) id registered with the identity provider
    pub app_id: String,
    /// Delegated permission scopes requested at sign-in
    #[serde(deserialize_with = "deserialize_scopes")]
    pub scopes: Vec<String>,
    /// Directory tenant; `common` accepts personal and work accounts
    pub tenant: String,
    /// Identity provider root
    pub authority: String,
    /// Drive API root
    pub graph_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Glob selecting spreadsheet files among the drive's root items
    pub file_pattern: String,
    /// Minimum width of each rendered cell
    pub column_width: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            scopes: Vec::new(),
            tenant: "common".to_owned(),
            authority: "https://login.microsoftonline.com".to_owned(),
            graph_url: DEFAULT_GRAPH_URL.to_owned(),
            timeout_secs: 30,
            file_pattern: "*.xlsx".to_owned(),
            column_width: 15,
        }
    }
}

/// Accepts either a TOML array or one `;`-separated string.
fn deserialize_scopes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scopes {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Scopes::deserialize(deserializer)? {
        Scopes::List(scopes) => scopes,
        Scopes::Joined(scopes) => split_scopes(&scopes),
    })
}

fn split_scopes(scopes: &str) -> Vec<String> {
    scopes
        .split([';', ' '])
        .map(str::trim)
        .filter(|scope| !scope.is_empty())
        .map(str::to_owned)
        .collect()
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Loads settings from `path`, or from [`DEFAULT_CONFIG_FILE`] when it exists,
    /// applies environment overrides and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// [`Settings::load`] with environment variables read through `lookup`.
    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = path.map(Path::to_path_buf).or_else(|| {
            Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|path| path.exists())
        });
        let mut settings = match path {
            Some(path) => {
                let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                    path: path.to_owned(),
                    source,
                })?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        settings.apply_env(lookup);
        settings.validate()?;
        Ok(settings)
    }

    /// Overrides fields from `DRIVE_SHEET_APP_ID`, `DRIVE_SHEET_SCOPES`,
    /// `DRIVE_SHEET_TENANT` and `DRIVE_SHEET_GRAPH_URL`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(app_id) = lookup("DRIVE_SHEET_APP_ID") {
            self.app_id = app_id;
        }
        if let Some(scopes) = lookup("DRIVE_SHEET_SCOPES") {
            self.scopes = split_scopes(&scopes);
        }
        if let Some(tenant) = lookup("DRIVE_SHEET_TENANT") {
            self.tenant = tenant;
        }
        if let Some(graph_url) = lookup("DRIVE_SHEET_GRAPH_URL") {
            self.graph_url = graph_url;
        }
    }

    /// Fails when sign-in cannot be attempted with these settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_id.trim().is_empty() {
            return Err(ConfigError::Missing("app_id"));
        }
        if self.scopes.is_empty() {
            return Err(ConfigError::Missing("scopes"));
        }
        self.file_pattern()?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn file_pattern(&self) -> Result<Pattern, ConfigError> {
        Ok(Pattern::new(&self.file_pattern)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn settings_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.tenant, "common");
        assert_eq!(settings.column_width, 15);
        assert_eq!(settings.timeout(), Duration::from_secs(30));
        assert!(matches!(settings.validate(), Err(ConfigError::Missing("app_id"))));
    }

    #[test]
    fn settings_scopes_as_list_or_joined() {
        let settings = Settings::from_toml_str(
            r#"
            app_id = "app"
            scopes = ["User.Read", "Files.Read"]
            "#,
        )
        .unwrap();
        assert_eq!(settings.scopes, vec!["User.Read", "Files.Read"]);

        let settings = Settings::from_toml_str(
            r#"
            app_id = "app"
            scopes = "User.Read;Files.Read.All; offline_access"
            column_width = 20
            "#,
        )
        .unwrap();
        assert_eq!(settings.scopes, vec!["User.Read", "Files.Read.All", "offline_access"]);
        assert_eq!(settings.column_width, 20);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn settings_missing_scopes() {
        let settings = Settings::from_toml_str(r#"app_id = "app""#).unwrap();
        assert!(matches!(settings.validate(), Err(ConfigError::Missing("scopes"))));
    }

    #[test]
    fn settings_invalid_pattern() {
        let settings = Settings::from_toml_str(
            r#"
            app_id = "app"
            scopes = "User.Read"
            file_pattern = "[xlsx"
            "#,
        )
        .unwrap();
        assert!(matches!(settings.validate(), Err(ConfigError::InvalidPattern(_))));
    }

    #[test]
    fn settings_invalid_toml() {
        assert!(matches!(
            Settings::from_toml_str("app_id = "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn settings_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("DRIVE_SHEET_APP_ID", "from-env"),
            ("DRIVE_SHEET_SCOPES", "User.Read;Files.Read"),
            ("DRIVE_SHEET_TENANT", "contoso.onmicrosoft.com"),
        ]
        .into_iter()
        .collect();
        let mut settings = Settings::default();
        settings.apply_env(|key| env.get(key).map(|value| value.to_string()));
        assert_eq!(settings.app_id, "from-env");
        assert_eq!(settings.scopes, vec!["User.Read", "Files.Read"]);
        assert_eq!(settings.tenant, "contoso.onmicrosoft.com");
        assert_eq!(settings.graph_url, DEFAULT_GRAPH_URL);
    }

    #[test]
    fn settings_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "app_id = \"file-app\"\nscopes = \"Files.Read\"").unwrap();
        let settings = Settings::load_with_env(Some(file.path()), |_| None).unwrap();
        assert_eq!(settings.app_id, "file-app");
        assert_eq!(settings.scopes, vec!["Files.Read"]);
    }

    #[test]
    fn settings_load_env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "app_id = \"file-app\"\nscopes = \"Files.Read\"").unwrap();
        let settings = Settings::load_with_env(Some(file.path()), |key| {
            (key == "DRIVE_SHEET_SCOPES").then(|| "User.Read;Files.Read.All".to_owned())
        })
        .unwrap();
        assert_eq!(settings.app_id, "file-app");
        assert_eq!(settings.scopes, vec!["User.Read", "Files.Read.All"]);
    }

    #[test]
    fn settings_load_missing_file() {
        let result = Settings::load_with_env(Some(Path::new("definitely/not/here.toml")), |_| None);
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
