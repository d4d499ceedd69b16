//! TOML Configuration File Support
//!
//! Centralized configuration loading for the task tracker, from a TOML file
//! at `~/.config/task-tracker/tracker.toml`.
//!
//! # Configuration Priority
//!
//! Values are applied in this order (highest first):
//! 1. CLI arguments ([`ConfigOverrides`])
//! 2. Environment variables (`TRACKER_*`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [backend]
//! url = "https://xyzcompany.supabase.co"
//! anon_key = "eyJhbGciOi..."
//! tasks_table = "tasks"
//! request_timeout_secs = 30
//!
//! [session]
//! persist = true
//! path = "/home/me/.local/share/task-tracker/session.json"
//!
//! [tasks]
//! sort = "priority_then_created"
//!
//! [preferences]
//! path = "/home/me/.config/task-tracker/preferences.toml"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gateway::{SessionStore, SupabaseConfig};
use crate::preferences::FilePreferenceStore;
use crate::tasks::{SortPolicy, TaskListConfig, TASKS_TABLE};

/// Environment variable for the backend project URL
pub const ENV_URL: &str = "TRACKER_SUPABASE_URL";
/// Environment variable for the backend anon key
pub const ENV_KEY: &str = "TRACKER_SUPABASE_KEY";
/// Environment variable for the tasks collection name
pub const ENV_TASKS_TABLE: &str = "TRACKER_TASKS_TABLE";
/// Environment variable for the list ordering
pub const ENV_SORT: &str = "TRACKER_SORT";
/// Environment variable for the session file
pub const ENV_SESSION_PATH: &str = "TRACKER_SESSION_PATH";
/// Environment variable for the preference file
pub const ENV_PREFERENCES_PATH: &str = "TRACKER_PREFERENCES_PATH";
/// Environment variable for the request timeout in seconds
pub const ENV_REQUEST_TIMEOUT: &str = "TRACKER_REQUEST_TIMEOUT";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid or missing configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Where the configuration's highest-priority value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[backend]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendToml {
    /// Project URL
    pub url: Option<String>,
    /// Public anon key
    pub anon_key: Option<String>,
    /// Tasks collection name
    pub tasks_table: Option<String>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: Option<u64>,
}

/// `[session]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionToml {
    /// Session file location
    pub path: Option<PathBuf>,
    /// Whether to persist the session at all
    pub persist: Option<bool>,
}

/// `[tasks]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksToml {
    /// List ordering
    pub sort: Option<SortPolicy>,
}

/// `[preferences]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesToml {
    /// Preference file location
    pub path: Option<PathBuf>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerToml {
    /// Backend connection
    pub backend: BackendToml,
    /// Session persistence
    pub session: SessionToml,
    /// Task list behaviour
    pub tasks: TasksToml,
    /// Local preferences
    pub preferences: PreferencesToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved configuration
#[derive(Clone, Debug)]
pub struct TrackerConfig {
    /// Backend project URL
    pub url: Option<String>,
    /// Backend anon key
    pub anon_key: Option<String>,
    /// Tasks collection name
    pub tasks_table: String,
    /// Per-request timeout
    pub request_timeout: Option<Duration>,
    /// Whether the session is persisted between runs
    pub persist_session: bool,
    /// Session file location
    pub session_path: Option<PathBuf>,
    /// List ordering
    pub sort: SortPolicy,
    /// Preference file location
    pub preferences_path: Option<PathBuf>,
    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,
    source: ConfigSource,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            tasks_table: TASKS_TABLE.to_string(),
            request_timeout: None,
            persist_session: true,
            session_path: SessionStore::default_path(),
            sort: SortPolicy::default(),
            preferences_path: FilePreferenceStore::default_path(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl TrackerConfig {
    /// Configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest-priority source that contributed a value
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Backend client settings
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] when the URL or key is not set.
    pub fn supabase(&self) -> Result<SupabaseConfig, ConfigError> {
        let url = self
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "backend url is not set (use [backend] url or {ENV_URL})"
                ))
            })?;
        let key = self
            .anon_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "backend anon key is not set (use [backend] anon_key or {ENV_KEY})"
                ))
            })?;

        let mut config = SupabaseConfig::new(url, key);
        if let Some(timeout) = self.request_timeout {
            config = config.with_timeout(timeout);
        }
        if self.persist_session {
            if let Some(path) = &self.session_path {
                config = config.with_session_path(path);
            }
        }
        Ok(config)
    }

    /// Task list controller settings
    #[must_use]
    pub fn task_list(&self) -> TaskListConfig {
        TaskListConfig {
            table: self.tasks_table.clone(),
            sort: self.sort,
        }
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/task-tracker/tracker.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("task-tracker").join("tracker.toml"))
}

/// Load configuration from the default file and the environment
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be read or parsed.
/// A missing config file is not an error (defaults are used).
pub async fn load_config() -> Result<TrackerConfig, ConfigError> {
    load_config_from_path(default_config_path()).await
}

/// Load configuration from a specific path and the environment
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub async fn load_config_from_path(path: Option<PathBuf>) -> Result<TrackerConfig, ConfigError> {
    let mut config = TrackerConfig::default();

    if let Some(config_path) = path {
        match tokio::fs::read_to_string(&config_path).await {
            Ok(content) => {
                let toml_config: TrackerToml = toml::from_str(&content)?;
                apply_toml_config(&mut config, &toml_config);
                config.source = ConfigSource::File;
                tracing::info!(path = %config_path.display(), "Loaded configuration from file");
                config.config_file_path = Some(config_path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    path = %config_path.display(),
                    "Config file not found, using defaults"
                );
            }
            Err(source) => {
                return Err(ConfigError::ReadError {
                    path: config_path,
                    source,
                })
            }
        }
    }

    apply_env_config(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut TrackerConfig, toml: &TrackerToml) {
    if toml.backend.url.is_some() {
        config.url = toml.backend.url.clone();
    }
    if toml.backend.anon_key.is_some() {
        config.anon_key = toml.backend.anon_key.clone();
    }
    if let Some(table) = &toml.backend.tasks_table {
        config.tasks_table = table.clone();
    }
    if let Some(secs) = toml.backend.request_timeout_secs {
        config.request_timeout = Some(Duration::from_secs(secs));
    }

    if let Some(persist) = toml.session.persist {
        config.persist_session = persist;
    }
    if toml.session.path.is_some() {
        config.session_path = toml.session.path.clone();
    }

    if let Some(sort) = toml.tasks.sort {
        config.sort = sort;
    }

    if toml.preferences.path.is_some() {
        config.preferences_path = toml.preferences.path.clone();
    }
}

/// Apply environment overrides, reading variables through `var`
///
/// Unparseable values are logged and ignored.
fn apply_env_config(config: &mut TrackerConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(url) = var(ENV_URL) {
        config.url = Some(url);
        config.source = ConfigSource::Env;
    }
    if let Some(key) = var(ENV_KEY) {
        config.anon_key = Some(key);
        config.source = ConfigSource::Env;
    }
    if let Some(table) = var(ENV_TASKS_TABLE) {
        config.tasks_table = table;
        config.source = ConfigSource::Env;
    }
    if let Some(sort) = var(ENV_SORT) {
        match SortPolicy::parse(&sort) {
            Some(policy) => {
                config.sort = policy;
                config.source = ConfigSource::Env;
            }
            None => tracing::warn!(value = %sort, "Ignoring unknown {ENV_SORT}"),
        }
    }
    if let Some(path) = var(ENV_SESSION_PATH) {
        config.session_path = Some(PathBuf::from(path));
        config.source = ConfigSource::Env;
    }
    if let Some(path) = var(ENV_PREFERENCES_PATH) {
        config.preferences_path = Some(PathBuf::from(path));
        config.source = ConfigSource::Env;
    }
    if let Some(timeout) = var(ENV_REQUEST_TIMEOUT) {
        match timeout.parse::<u64>() {
            Ok(secs) => {
                config.request_timeout = Some(Duration::from_secs(secs));
                config.source = ConfigSource::Env;
            }
            Err(_) => tracing::warn!(value = %timeout, "Ignoring invalid {ENV_REQUEST_TIMEOUT}"),
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Command-line overrides, applied after [`load_config`]
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Backend URL override
    pub url: Option<String>,
    /// Anon key override
    pub anon_key: Option<String>,
    /// Sort policy override
    pub sort: Option<SortPolicy>,
}

impl ConfigOverrides {
    /// Create an empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set backend URL override
    #[must_use]
    pub fn with_url(mut self, url: String) -> Self {
        self.url = Some(url);
        self
    }

    /// Set anon key override
    #[must_use]
    pub fn with_anon_key(mut self, key: String) -> Self {
        self.anon_key = Some(key);
        self
    }

    /// Set sort policy override
    #[must_use]
    pub fn with_sort(mut self, sort: SortPolicy) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut TrackerConfig) {
        if self.url.is_some() || self.anon_key.is_some() || self.sort.is_some() {
            config.source = ConfigSource::Cli;
        }
        if let Some(url) = &self.url {
            config.url = Some(url.clone());
        }
        if let Some(key) = &self.anon_key {
            config.anon_key = Some(key.clone());
        }
        if let Some(sort) = self.sort {
            config.sort = sort;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = TrackerConfig::default();
        assert_eq!(config.tasks_table, "tasks");
        assert_eq!(config.sort, SortPolicy::PriorityThenCreated);
        assert!(config.persist_session);
        assert!(config.request_timeout.is_none());
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = default_config_path() {
            assert!(p.to_string_lossy().contains("task-tracker"));
            assert!(p.to_string_lossy().ends_with("tracker.toml"));
        }
    }

    #[tokio::test]
    async fn test_parse_valid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.toml");
        tokio::fs::write(
            &path,
            r#"
[backend]
url = "https://example.supabase.co"
anon_key = "anon"
tasks_table = "todo_items"
request_timeout_secs = 15

[session]
persist = false

[tasks]
sort = "unordered"
"#,
        )
        .await
        .unwrap();

        let config = load_config_from_path(Some(path.clone())).await.unwrap();
        assert_eq!(config.url.as_deref(), Some("https://example.supabase.co"));
        assert_eq!(config.tasks_table, "todo_items");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(15)));
        assert!(!config.persist_session);
        assert_eq!(config.sort, SortPolicy::Unordered);
        assert_eq!(config.config_file_path, Some(path));
    }

    #[tokio::test]
    async fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from_path(Some(dir.path().join("absent.toml")))
            .await
            .unwrap();
        assert!(config.config_file_path.is_none());
        assert_eq!(config.tasks_table, "tasks");
    }

    #[tokio::test]
    async fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.toml");
        tokio::fs::write(&path, "[backend\nurl = ").await.unwrap();

        let err = load_config_from_path(Some(path)).await.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = TrackerConfig::default();
        apply_toml_config(
            &mut config,
            &TrackerToml {
                backend: BackendToml {
                    url: Some("https://file.example".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            },
        );

        apply_env_config(
            &mut config,
            env(&[
                (ENV_URL, "https://env.example"),
                (ENV_SORT, "none"),
                (ENV_REQUEST_TIMEOUT, "soon"),
            ]),
        );

        assert_eq!(config.url.as_deref(), Some("https://env.example"));
        assert_eq!(config.sort, SortPolicy::Unordered);
        assert!(config.request_timeout.is_none());
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = TrackerConfig::default();
        ConfigOverrides::new()
            .with_url("https://cli.example".to_string())
            .with_anon_key("cli-key".to_string())
            .apply(&mut config);

        assert_eq!(config.source(), ConfigSource::Cli);
        let supabase = config.supabase().unwrap();
        assert_eq!(supabase.url, "https://cli.example");
        assert_eq!(supabase.anon_key, "cli-key");
    }

    #[test]
    fn test_supabase_requires_url_and_key() {
        let mut config = TrackerConfig::default();
        assert!(matches!(
            config.supabase(),
            Err(ConfigError::ValidationError(_))
        ));

        config.url = Some("https://x.example".to_string());
        config.anon_key = Some("  ".to_string());
        assert!(config.supabase().is_err());
    }

    #[test]
    fn test_session_path_respects_persist_flag() {
        let mut config = TrackerConfig {
            url: Some("https://x.example".to_string()),
            anon_key: Some("k".to_string()),
            session_path: Some(PathBuf::from("/tmp/session.json")),
            ..Default::default()
        };
        assert_eq!(
            config.supabase().unwrap().session_path,
            Some(PathBuf::from("/tmp/session.json"))
        );

        config.persist_session = false;
        assert!(config.supabase().unwrap().session_path.is_none());
    }
}
