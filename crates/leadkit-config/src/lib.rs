//! Shared configuration for leadkit tools.
//!
//! TOML profiles layered with `LEADKIT_` environment overrides, session
//! persistence backends, and translation to `leadkit_core::DashboardConfig`.
//! The CLI adds flag-aware wrappers on top.

mod storage;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use leadkit_core::{DEFAULT_API_URL, DashboardConfig, TlsMode};

pub use storage::{KeyringStorage, session_storage};

/// Profile used when neither the config nor a flag names one.
pub const DEFAULT_PROFILE: &str = "default";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level contents of `config.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some(DEFAULT_PROFILE.into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: the explicit one, else the configured
    /// default, else `"default"`.
    pub fn profile_name(&self, requested: Option<&str>) -> String {
        requested
            .or(self.default_profile.as_deref())
            .unwrap_or(DEFAULT_PROFILE)
            .to_owned()
    }

    /// Look a profile up. The default profile exists implicitly with
    /// built-in values until it is written to the file.
    pub fn profile(&self, name: &str) -> Result<Profile, ConfigError> {
        match self.profiles.get(name) {
            Some(profile) => Ok(profile.clone()),
            None if name == DEFAULT_PROFILE => Ok(Profile::default()),
            None => Err(ConfigError::UnknownProfile { name: name.into() }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// Where a profile keeps its login between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// Owner-only JSON file under the platform data directory.
    #[default]
    File,
    /// System keyring entry per key.
    Keyring,
}

/// A named backend profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Backend root (e.g. "http://localhost:5002").
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub session: SessionBackend,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Skip certificate verification.
    pub insecure: Option<bool>,

    /// Override `defaults.timeout`.
    pub timeout: Option<u64>,

    /// Extra attempts for reads that failed transiently.
    pub read_retries: Option<u32>,

    /// Seconds after which cached data is refetched even without a
    /// change.
    pub max_age: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            session: SessionBackend::File,
            ca_cert: None,
            insecure: None,
            timeout: None,
            read_retries: None,
            max_age: None,
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "leadkit", "leadkit")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Session file for `profile` when it uses [`SessionBackend::File`].
pub fn session_path(profile: &str) -> PathBuf {
    let base = project_dirs().map_or_else(dirs_fallback, |dirs| dirs.data_dir().to_path_buf());
    base.join("sessions").join(format!("{profile}.json"))
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("leadkit");
    p
}

// ── Loading / saving ────────────────────────────────────────────────

/// Load the full config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then the TOML file at `path` (if any), then `LEADKIT_*`
/// variables. Nested keys use a double underscore
/// (`LEADKIT_DEFAULTS__OUTPUT=json`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(
            Env::prefixed("LEADKIT_")
                .ignore(&["password", "config", "log"])
                .split("__"),
        );

    Ok(figment.extract()?)
}

/// Serialize config to TOML and write it to the canonical path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `DashboardConfig` from a profile, with `defaults` filling the
/// gaps. No CLI flag overrides.
pub fn profile_to_dashboard_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<DashboardConfig, ConfigError> {
    let url: url::Url = profile
        .api_url
        .parse()
        .map_err(|e| ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("invalid URL '{}': {e}", profile.api_url),
        })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("expected http or https, got '{}'", url.scheme()),
        });
    }

    let mut config = DashboardConfig::new(url);
    config.tls = if profile.insecure.unwrap_or(false) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    if let Some(retries) = profile.read_retries {
        config.read_retries = retries;
    }
    config.max_age = profile.max_age.map(Duration::from_secs);

    Ok(config)
}
