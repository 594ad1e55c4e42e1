//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::figma::client::{AuthMode, DEFAULT_BASE_URL};

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Figma API access.
    #[serde(default)]
    pub figma: FigmaConfig,

    /// Server behaviour.
    #[serde(default)]
    pub server: ServerConfig,

    /// Tool output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// Credentials are not checked here because they may still be supplied
    /// on the command line; see [`FigmaConfig::auth_mode`].
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.figma.timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                message: "figma.timeout_secs must be greater than 0".to_string(),
            });
        }

        if let Err(e) = reqwest::Url::parse(&self.figma.base_url) {
            return Err(ConfigError::ValidationError {
                message: format!("figma.base_url '{}' is invalid: {e}", self.figma.base_url),
            });
        }

        Ok(())
    }
}

/// Figma API configuration.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FigmaConfig {
    /// Personal access token.
    #[serde(default)]
    pub api_key: String,

    /// OAuth access token.
    #[serde(default)]
    pub oauth_token: String,

    /// Authenticate with `oauth_token` instead of `api_key`.
    #[serde(default)]
    pub use_oauth: bool,

    /// Base URL of the REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl FigmaConfig {
    /// Selects the authentication mode.
    ///
    /// `use_oauth` picks the mode; the matching credential must be non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredentials`] if the selected mode has no
    /// credential.
    pub fn auth_mode(&self) -> Result<AuthMode, ConfigError> {
        if self.use_oauth {
            let token = self.oauth_token.trim();
            if token.is_empty() {
                return Err(ConfigError::MissingCredentials {
                    message: "OAuth mode is selected but no OAuth token is set".to_string(),
                });
            }
            Ok(AuthMode::OAuth(token.to_string()))
        } else {
            let key = self.api_key.trim();
            if key.is_empty() {
                return Err(ConfigError::MissingCredentials {
                    message: "no Figma API key is set (use --figma-api-key or FIGMA_API_KEY)"
                        .to_string(),
                });
            }
            Ok(AuthMode::ApiKey(key.to_string()))
        }
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FigmaConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            oauth_token: String::new(),
            use_oauth: false,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for FigmaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FigmaConfig")
            .field("api_key", &redacted(&self.api_key))
            .field("oauth_token", &redacted(&self.oauth_token))
            .field("use_oauth", &self.use_oauth)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

const fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_timeout_secs() -> u64 {
    60
}

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Register tools under development names (`get_figma_data-dev`).
    #[serde(default)]
    pub dev_mode: bool,
}

/// Text encoding of tool results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Block-style YAML.
    #[default]
    Yaml,
    /// Pretty-printed JSON.
    Json,
}

/// Tool output configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Encoding used for tool results.
    #[serde(default)]
    pub format: OutputFormat,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
