//! Configuration loading for the hand-off TUI.
//!
//! All fields are required unless explicitly marked optional.

use crate::nav::Portal;
use handoff_client::ClientConfig;
use handoff_core::{OperatorIdentity, RecordKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// How often the dashboard list is re-fetched while it is on screen.
pub const DEFAULT_DASHBOARD_POLL_MS: u64 = 30_000;

/// Themes the renderer knows about.
pub const SUPPORTED_THEMES: &[&str] = &["slate", "high-contrast"];

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TuiConfig {
    pub api_base_url: String,
    /// Backend used by the admin and agent portals; defaults to
    /// `api_base_url`.
    #[serde(default)]
    pub operator_api_base_url: Option<String>,
    pub request_timeout_ms: u64,
    pub refresh_interval_ms: u64,
    #[serde(default = "default_dashboard_poll_ms")]
    pub dashboard_poll_ms: u64,
    /// A leading `~` is expanded to the home directory on load.
    pub persistence_path: PathBuf,
    pub log_path: PathBuf,
    pub record_kind: RecordKind,
    #[serde(default)]
    pub operator: Option<OperatorConfig>,
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperatorConfig {
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThemeConfig {
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or HANDOFF_TUI_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl TuiConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = arg_value("--config")
            .map(PathBuf::from)
            .or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(contents)?;
        config.persistence_path = expand_home(&config.persistence_path);
        config.log_path = expand_home(&config.log_path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url("api_base_url", &self.api_base_url)?;
        if let Some(url) = &self.operator_api_base_url {
            validate_url("operator_api_base_url", url)?;
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "refresh_interval_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.dashboard_poll_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dashboard_poll_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.persistence_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "persistence_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.log_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "log_path",
                reason: "must not be empty".to_string(),
            });
        }
        if let Some(operator) = &self.operator {
            if !operator.email.contains('@') {
                return Err(ConfigError::InvalidValue {
                    field: "operator.email",
                    reason: "must be an email address".to_string(),
                });
            }
        }
        let theme = self.theme.name.trim().to_ascii_lowercase();
        if !SUPPORTED_THEMES.contains(&theme.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "theme.name",
                reason: format!("must be one of {}", SUPPORTED_THEMES.join(", ")),
            });
        }
        Ok(())
    }

    /// Backend settings for `portal`: the chat portal talks to
    /// `api_base_url`, the operator portals to `operator_api_base_url`.
    pub fn client_config(&self, portal: Portal) -> ClientConfig {
        let base_url = match portal {
            Portal::Chat => self.api_base_url.clone(),
            Portal::Admin | Portal::Agent => self
                .operator_api_base_url
                .clone()
                .unwrap_or_else(|| self.api_base_url.clone()),
        };
        ClientConfig {
            base_url,
            request_timeout_ms: self.request_timeout_ms,
        }
    }

    pub fn identity(&self) -> Option<OperatorIdentity> {
        self.operator.as_ref().map(|op| OperatorIdentity {
            email: op.email.clone(),
            full_name: op.full_name.clone(),
        })
    }
}

fn default_dashboard_poll_ms() -> u64 {
    DEFAULT_DASHBOARD_POLL_MS
}

/// Expand a leading `~` to the user's home directory. Other paths, and
/// every path when no home directory is known, are returned unchanged.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

fn validate_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "must start with http:// or https://".to_string(),
        });
    }
    Ok(())
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("HANDOFF_TUI_CONFIG").ok().map(PathBuf::from)
}

/// Value following `flag` on the command line.
pub fn arg_value(flag: &str) -> Option<String> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == flag {
            return args.next();
        }
    }
    None
}
