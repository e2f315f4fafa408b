//! Configuration management for moodchat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{MoodchatError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for moodchat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Reply stream settings
    #[serde(default)]
    pub stream: StreamConfig,

    /// Where the bearer credential comes from
    #[serde(default)]
    pub auth: AuthConfig,

    /// Default user id for commands that take `--user-id`
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the journal backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for session directory requests (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// TCP connect timeout for every request (seconds)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_seconds: default_request_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

/// Reply stream configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Path of the message-send endpoint, relative to `api.base_url`
    #[serde(default = "default_stream_path")]
    pub path: String,

    /// Longest silence between two chunks before the reply is failed
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
}

fn default_stream_path() -> String {
    "/api/chat/message/stream".to_string()
}

fn default_idle_timeout() -> u64 {
    60
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            path: default_stream_path(),
            idle_timeout_seconds: default_idle_timeout(),
        }
    }
}

impl StreamConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }
}

/// Credential source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthSource {
    /// Send requests without a bearer token
    None,
    /// Read the token from an environment variable
    Env,
    /// Read the persisted auth store written by the login flow
    #[default]
    File,
    /// Read the token from the OS keyring
    Keyring,
}

impl std::str::FromStr for AuthSource {
    type Err = MoodchatError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "env" => Ok(Self::Env),
            "file" => Ok(Self::File),
            "keyring" => Ok(Self::Keyring),
            other => Err(MoodchatError::Config(format!("unknown auth source: {other}"))),
        }
    }
}

/// Credential provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub source: AuthSource,

    /// Variable read when `source: env`
    #[serde(default = "default_token_env_var")]
    pub env_var: String,

    /// Auth store read when `source: file`; defaults to the platform data dir
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Keyring service name when `source: keyring`
    #[serde(default = "default_keyring_service")]
    pub keyring_service: String,

    /// Keyring account name when `source: keyring`
    #[serde(default = "default_keyring_user")]
    pub keyring_user: String,
}

fn default_token_env_var() -> String {
    "MOODCHAT_TOKEN".to_string()
}

fn default_keyring_service() -> String {
    "moodchat".to_string()
}

fn default_keyring_user() -> String {
    "default".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            source: AuthSource::default(),
            env_var: default_token_env_var(),
            file_path: None,
            keyring_service: default_keyring_service(),
            keyring_user: default_keyring_user(),
        }
    }
}

impl AuthConfig {
    /// Configured auth file, or `<data dir>/auth.json`.
    pub fn resolved_file_path(&self) -> Option<PathBuf> {
        self.file_path.clone().or_else(|| {
            directories::ProjectDirs::from("", "", "moodchat")
                .map(|dirs| dirs.data_dir().join("auth.json"))
        })
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

/// Default config location: `<config dir>/config.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "moodchat")
        .map(|dirs| dirs.config_dir().join("config.yaml"))
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: Option<&Path>, cli: &crate::cli::Cli) -> Result<Self> {
        let path = path.map(Path::to_path_buf).or_else(default_config_path);

        let mut config = match path {
            Some(ref p) if p.exists() => Self::from_file(p)?,
            Some(ref p) => {
                tracing::warn!("Config file not found at {}, using defaults", p.display());
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MoodchatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| MoodchatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("MOODCHAT_API_BASE_URL") {
            tracing::debug!(base_url = %base_url, "Env override: MOODCHAT_API_BASE_URL");
            self.api.base_url = base_url;
        }

        if let Ok(path) = std::env::var("MOODCHAT_STREAM_PATH") {
            self.stream.path = path;
        }

        if let Ok(timeout) = std::env::var("MOODCHAT_REQUEST_TIMEOUT_SECONDS") {
            match timeout.parse() {
                Ok(v) => self.api.request_timeout_seconds = v,
                Err(_) => tracing::warn!("Invalid MOODCHAT_REQUEST_TIMEOUT_SECONDS: {}", timeout),
            }
        }

        if let Ok(timeout) = std::env::var("MOODCHAT_IDLE_TIMEOUT_SECONDS") {
            match timeout.parse() {
                Ok(v) => self.stream.idle_timeout_seconds = v,
                Err(_) => tracing::warn!("Invalid MOODCHAT_IDLE_TIMEOUT_SECONDS: {}", timeout),
            }
        }

        if let Ok(source) = std::env::var("MOODCHAT_AUTH_SOURCE") {
            match source.parse() {
                Ok(v) => self.auth.source = v,
                Err(e) => tracing::warn!("Invalid MOODCHAT_AUTH_SOURCE: {}", e),
            }
        }

        if let Ok(file) = std::env::var("MOODCHAT_AUTH_FILE") {
            self.auth.file_path = Some(PathBuf::from(file));
        }

        if let Ok(user_id) = std::env::var("MOODCHAT_USER_ID") {
            self.user_id = Some(user_id);
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(base_url) = &cli.api_base_url {
            self.api.base_url = base_url.clone();
        }
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if the base URL does not parse, a timeout is zero, or
    /// the stream path is not absolute
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api.base_url).map_err(|e| {
            MoodchatError::Config(format!("Invalid api.base_url {}: {}", self.api.base_url, e))
        })?;

        if self.api.request_timeout_seconds == 0 || self.api.connect_timeout_seconds == 0 {
            return Err(MoodchatError::Config("api timeouts must be greater than 0".into()).into());
        }

        if self.stream.idle_timeout_seconds == 0 {
            return Err(
                MoodchatError::Config("stream.idle_timeout_seconds must be greater than 0".into())
                    .into(),
            );
        }

        if !self.stream.path.starts_with('/') {
            return Err(MoodchatError::Config(format!(
                "stream.path must start with '/': {}",
                self.stream.path
            ))
            .into());
        }

        if self.auth.source == AuthSource::Env && self.auth.env_var.trim().is_empty() {
            return Err(MoodchatError::Config("auth.env_var must not be empty".into()).into());
        }

        if self.auth.source == AuthSource::Keyring
            && (self.auth.keyring_service.trim().is_empty()
                || self.auth.keyring_user.trim().is_empty())
        {
            return Err(MoodchatError::Config(
                "auth.keyring_service and auth.keyring_user must not be empty".into(),
            )
            .into());
        }

        Ok(())
    }
}
