//! Configuration management for the CLI
//!
//! This module handles loading and merging configuration from:
//! - Default values
//! - Configuration files (TOML/YAML/JSON)
//! - Environment variables (`ABIWARE_*`, optionally from a `.env` file)

use crate::cli::{ConfigFormat, OutputFormat};
use crate::error::{Error, Result};
use abiware_core::http::Url;
use abiware_core::{AllowList, ConnectorSettings, Credentials, DEFAULT_TIMEOUT_SECS};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variables that override file values
pub const ENV_VARS: [&str; 6] = [
    "ABIWARE_AUTH_SERVER_URL",
    "ABIWARE_API_BASE_URL",
    "ABIWARE_CLIENT_ID",
    "ABIWARE_USERNAME",
    "ABIWARE_PASSWORD",
    "ABIWARE_TIMEOUT_SECS",
];

const PROJECT_CONFIG_FILES: [&str; 4] = [
    ".abiware.toml",
    ".abiware.yaml",
    ".abiware.yml",
    ".abiware.json",
];

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Platform endpoints and credentials
    pub connector: ConnectorConfig,

    /// Who may call the connector
    pub access: AccessConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Connection settings for the authentication server and the platform API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    pub auth_server_url: String,
    pub api_base_url: String,
    pub client_id: String,
    pub username: String,
    pub password: String,
    /// Timeout applied to both outbound calls
    pub timeout_secs: u64,
}

/// Access policy settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Principals allowed to call the connector. Empty allows everyone.
    pub allowed_principals: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format
    pub format: String,

    /// Use colored output by default
    pub color: bool,

    /// Show progress indicators
    pub progress: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directives, used when no `-v` is given
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: Option<String>,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            auth_server_url: String::new(),
            api_base_url: String::new(),
            client_id: String::new(),
            username: String::new(),
            password: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "human".to_string(),
            color: true,
            progress: true,
        }
    }
}

impl OutputConfig {
    /// Parsed output format
    pub fn output_format(&self) -> Result<OutputFormat> {
        OutputFormat::from_str(self.format.trim(), true)
            .map_err(|_| Error::config(format!("Unknown output format '{}'", self.format)))
    }
}

impl Config {
    /// Configuration written by `config init`
    pub fn template() -> Self {
        Self {
            connector: ConnectorConfig {
                auth_server_url:
                    "https://auth.example.org/realms/urbanisme/protocol/openid-connect/token"
                        .to_string(),
                api_base_url: "https://abiware.example.org/api/".to_string(),
                client_id: "passerelle".to_string(),
                username: "connector@example.org".to_string(),
                password: "change-me".to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            },
            ..Self::default()
        }
    }

    /// Load configuration from a file, choosing the format by extension.
    /// Files without a known extension are read as TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let invalid = |expected: &str, source: anyhow::Error| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            source,
        };

        match ConfigFormat::from_path(path) {
            ConfigFormat::Yaml => {
                serde_yaml::from_str(&content).map_err(|e| invalid("YAML", e.into()))
            }
            ConfigFormat::Json => {
                serde_json::from_str(&content).map_err(|e| invalid("JSON", e.into()))
            }
            ConfigFormat::Toml => toml::from_str(&content).map_err(|e| invalid("TOML", e.into())),
        }
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        match Self::default_config_paths().into_iter().find(|p| p.exists()) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from `file` or the default locations, then apply environment
    /// overrides
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::load()?,
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Project file in the current directory, if any
    pub fn find_project_config() -> Option<PathBuf> {
        PROJECT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
    }

    /// `<config dir>/abiware/config.toml`
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("abiware").join("config.toml"))
    }

    /// Default configuration file paths to check, in order
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = PROJECT_CONFIG_FILES.iter().map(PathBuf::from).collect();
        paths.extend(Self::user_config_path());
        paths
    }

    /// Apply `ABIWARE_*` environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`. Unset or blank variables are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let connector = &mut self.connector;

        if let Some(v) = get("ABIWARE_AUTH_SERVER_URL") {
            connector.auth_server_url = v;
        }
        if let Some(v) = get("ABIWARE_API_BASE_URL") {
            connector.api_base_url = v;
        }
        if let Some(v) = get("ABIWARE_CLIENT_ID") {
            connector.client_id = v;
        }
        if let Some(v) = get("ABIWARE_USERNAME") {
            connector.username = v;
        }
        if let Some(v) = get("ABIWARE_PASSWORD") {
            connector.password = v;
        }
        if let Some(v) = get("ABIWARE_TIMEOUT_SECS") {
            connector.timeout_secs = v.trim().parse().map_err(|_| {
                Error::config(format!("ABIWARE_TIMEOUT_SECS must be a whole number of seconds, got '{}'", v))
            })?;
        }
        Ok(())
    }

    /// Check every connector setting and report all problems at once
    pub fn validate(&self) -> Result<()> {
        let connector = &self.connector;
        let mut problems = Vec::new();

        let required = [
            ("connector.auth_server_url", &connector.auth_server_url),
            ("connector.api_base_url", &connector.api_base_url),
            ("connector.client_id", &connector.client_id),
            ("connector.username", &connector.username),
            ("connector.password", &connector.password),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                problems.push(format!("{} is required", name));
            }
        }

        for (name, value) in [
            ("connector.auth_server_url", &connector.auth_server_url),
            ("connector.api_base_url", &connector.api_base_url),
        ] {
            if value.trim().is_empty() {
                continue;
            }
            match Url::parse(value.trim()) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                Ok(url) => problems.push(format!(
                    "{} must use http or https, got '{}'",
                    name,
                    url.scheme()
                )),
                Err(e) => problems.push(format!("{} is not a valid URL: {}", name, e)),
            }
        }

        if connector.timeout_secs == 0 {
            problems.push("connector.timeout_secs must be greater than zero".to_string());
        }

        if let Err(e) = self.output.output_format() {
            problems.push(e.to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::config(problems.join("; ")))
        }
    }

    /// Validated connector settings
    pub fn to_settings(&self) -> Result<ConnectorSettings> {
        self.validate()?;
        let connector = &self.connector;

        Ok(ConnectorSettings::new(
            Credentials::new(
                connector.auth_server_url.trim(),
                connector.client_id.trim(),
                connector.username.clone(),
                connector.password.clone(),
            ),
            connector.api_base_url.trim(),
        )
        .with_timeout(Duration::from_secs(connector.timeout_secs)))
    }

    /// Access policy from the `[access]` section
    pub fn access_policy(&self) -> AllowList {
        AllowList::new(
            self.access
                .allowed_principals
                .iter()
                .map(|p| p.trim())
                .filter(|p| !p.is_empty()),
        )
    }

    /// Copy safe to display: the password is masked
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if !config.connector.password.is_empty() {
            config.connector.password = "***".to_string();
        }
        config
    }

    /// Serialize in `format`
    pub fn to_string_as(&self, format: ConfigFormat) -> Result<String> {
        Ok(match format {
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Yaml => serde_yaml::to_string(self)?,
        })
    }

    /// Save configuration to a file, format chosen by extension
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_string_as(ConfigFormat::from_path(path))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

impl ConfigFormat {
    /// Format implied by a file extension, TOML when unknown
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            Some("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}
