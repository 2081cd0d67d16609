//! Run configuration for the sourcemap upload pipeline.
//!
//! Configuration sources (highest priority first):
//! 1. Explicit overrides (CLI flags, which also read ROLLBAR_* env vars)
//! 2. Config file (.rollbar-sourcemaps.yaml, or an explicit path)
//! 3. Defaults
//!
//! Config file discovery:
//! - Searches the start directory and its parents for .rollbar-sourcemaps.yaml
//! - `output_dir` in a config file is relative to the config file's directory

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default sourcemap ingestion endpoint
pub const DEFAULT_ROLLBAR_ENDPOINT: &str = "https://api.rollbar.com/api/1/sourcemap";

/// Default prefix prepended to each original file path
pub const DEFAULT_BASE: &str = "/";

/// Default build output directory
pub const DEFAULT_OUTPUT_DIR: &str = "dist";

/// File name searched for during config discovery
pub const CONFIG_FILE_NAME: &str = ".rollbar-sourcemaps.yaml";

/// Errors raised while resolving a run configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required option: {0}")]
    MissingField(&'static str),

    #[error("Invalid Rollbar endpoint (expected an http(s) URL): {0}")]
    InvalidEndpoint(String),

    #[error("timeout_seconds must be greater than 0")]
    InvalidTimeout,
}

/// Immutable options for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunConfig {
    /// Rollbar project access token (post_server_item scope)
    pub access_token: String,

    /// Release/build identifier the sourcemaps belong to
    pub version: String,

    /// Public base URL the minified assets are served from
    pub base_url: String,

    /// Suppress per-file success notices
    pub silent: bool,

    pub rollbar_endpoint: String,

    /// Prefix prepended to each original file path
    pub base: String,

    /// Root of the build artifacts
    pub output_dir: PathBuf,

    /// Log upload failures instead of failing the run
    pub ignore_upload_errors: bool,

    /// Locate and build payloads without uploading
    pub dry_run: bool,

    /// HTTP client timeout; none means the transport default
    pub timeout_seconds: Option<u64>,
}

impl RunConfig {
    /// Create a configuration with every optional setting defaulted
    pub fn new(
        access_token: impl Into<String>,
        version: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            version: version.into(),
            base_url: base_url.into(),
            silent: false,
            rollbar_endpoint: DEFAULT_ROLLBAR_ENDPOINT.to_string(),
            base: DEFAULT_BASE.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            ignore_upload_errors: true,
            dry_run: false,
            timeout_seconds: None,
        }
    }

    /// Check required options and the endpoint shape
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token.trim().is_empty() {
            return Err(ConfigError::MissingField("access_token"));
        }
        if self.version.trim().is_empty() {
            return Err(ConfigError::MissingField("version"));
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField("base_url"));
        }
        if !(self.rollbar_endpoint.starts_with("https://")
            || self.rollbar_endpoint.starts_with("http://"))
        {
            return Err(ConfigError::InvalidEndpoint(self.rollbar_endpoint.clone()));
        }
        if self.timeout_seconds == Some(0) {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }

    /// Copy of this configuration safe to print
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if !config.access_token.is_empty() {
            config.access_token = "********".to_string();
        }
        config
    }
}

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub access_token: Option<String>,
    pub version: Option<String>,
    pub base_url: Option<String>,
    pub silent: Option<bool>,
    pub rollbar_endpoint: Option<String>,
    pub base: Option<String>,
    pub output_dir: Option<String>,
    pub ignore_upload_errors: Option<bool>,
    pub dry_run: Option<bool>,
    pub timeout_seconds: Option<u64>,
}

impl ConfigFile {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}

/// Values supplied by the caller that win over the config file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub access_token: Option<String>,
    pub version: Option<String>,
    pub base_url: Option<String>,
    pub silent: Option<bool>,
    pub rollbar_endpoint: Option<String>,
    pub base: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub ignore_upload_errors: Option<bool>,
    pub dry_run: Option<bool>,
    pub timeout_seconds: Option<u64>,
}

/// Find config file by searching `start` and its parents
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.is_file() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    ConfigFile::from_yaml(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Merge overrides, a parsed config file and defaults into a validated config.
///
/// `file_dir` is the directory of the config file, used for relative paths.
pub fn resolve(
    file: Option<(ConfigFile, PathBuf)>,
    overrides: ConfigOverrides,
) -> Result<RunConfig, ConfigError> {
    let (file, file_dir) = file.unwrap_or_default();

    let mut config = RunConfig::new(
        overrides.access_token.or(file.access_token).unwrap_or_default(),
        overrides.version.or(file.version).unwrap_or_default(),
        overrides.base_url.or(file.base_url).unwrap_or_default(),
    );

    if let Some(silent) = overrides.silent.or(file.silent) {
        config.silent = silent;
    }
    if let Some(endpoint) = overrides.rollbar_endpoint.or(file.rollbar_endpoint) {
        config.rollbar_endpoint = endpoint;
    }
    if let Some(base) = overrides.base.or(file.base) {
        config.base = base;
    }
    if let Some(dir) = overrides.output_dir {
        config.output_dir = dir;
    } else if let Some(ref dir) = file.output_dir {
        config.output_dir = resolve_path(&file_dir, dir);
    }
    if let Some(ignore) = overrides.ignore_upload_errors.or(file.ignore_upload_errors) {
        config.ignore_upload_errors = ignore;
    }
    if let Some(dry_run) = overrides.dry_run.or(file.dry_run) {
        config.dry_run = dry_run;
    }
    config.timeout_seconds = overrides.timeout_seconds.or(file.timeout_seconds);

    config.validate()?;
    Ok(config)
}

/// Load configuration from all sources.
///
/// Uses `explicit` as the config file when given, otherwise searches from
/// the current directory.
pub fn load_config(explicit: Option<&Path>, overrides: ConfigOverrides) -> Result<RunConfig> {
    let config_path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(&std::env::current_dir()?),
    };

    let file = match config_path {
        Some(ref path) => {
            let parsed = load_config_file(path)?;
            let dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
            Some((parsed, dir))
        }
        None => None,
    };

    resolve(file, overrides).context("Invalid sourcemap upload configuration")
}
