//! Shared configuration for the IOLITE CLI.
//!
//! TOML profiles, credential resolution (env + plaintext), and
//! translation to `iolite_core::HubConfig`. The CLI adds flag-aware
//! wrappers on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use iolite_core::{DEFAULT_HOST, HubConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("unknown profile '{profile}'")]
    UnknownProfile { profile: String },

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

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Named gateway profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            profiles: HashMap::new(),
        }
    }
}

/// A named gateway profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Gateway host; defaults to the public remote gateway.
    pub host: Option<String>,

    /// HTTP Basic username from pairing.
    pub username: Option<String>,

    /// HTTP Basic password from pairing (plaintext — prefer the
    /// `IOLITE_PASSWORD` env var).
    pub password: Option<String>,

    /// OAuth pairing code from the QR payload.
    pub code: Option<String>,

    /// Device name announced during the token exchange.
    pub device_name: Option<String>,

    /// Directory for the cached OAuth token. Defaults to the platform
    /// data dir.
    pub token_cache: Option<PathBuf>,

    /// Keep discovered state across discovery runs.
    #[serde(default)]
    pub retain_between_sessions: bool,
}

impl Config {
    /// Look up a profile by explicit name, falling back to
    /// `default_profile`.
    pub fn profile<'a>(&'a self, name: Option<&'a str>) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get(name)
            .map(|profile| (name, profile))
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("de", "iolite", "iolite").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default directory for the cached OAuth token.
pub fn token_cache_dir() -> PathBuf {
    ProjectDirs::from("de", "iolite", "iolite")
        .map_or_else(dirs_fallback, |dirs| dirs.data_dir().to_path_buf())
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("iolite");
    p
}

// ── Config loading / saving ─────────────────────────────────────────

/// Load the Config from an explicit file + environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("IOLITE_CONFIG_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load the full Config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config, returning a default if the file doesn't exist. An
/// explicit `path` overrides the canonical location.
pub fn load_config_or_default(path: Option<&Path>) -> Config {
    match path {
        Some(path) => load_config_from(path).unwrap_or_default(),
        None => load_config().unwrap_or_default(),
    }
}

/// Serialize config to TOML and write it. An explicit `path` overrides
/// the canonical location.
pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<(), ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve Basic auth credentials: env vars win over the profile.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<(String, SecretString), ConfigError> {
    let username = std::env::var("IOLITE_USERNAME")
        .ok()
        .or_else(|| profile.username.clone())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;

    if let Ok(pw) = std::env::var("IOLITE_PASSWORD") {
        return Ok((username, SecretString::from(pw)));
    }

    if let Some(ref pw) = profile.password {
        return Ok((username, SecretString::from(pw.clone())));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve the pairing code: `IOLITE_CODE` wins over the profile.
pub fn resolve_code(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    std::env::var("IOLITE_CODE")
        .ok()
        .or_else(|| profile.code.clone())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Build a `HubConfig` from a profile and a freshly obtained SID.
pub fn profile_to_hub_config(
    profile: &Profile,
    profile_name: &str,
    sid: String,
) -> Result<HubConfig, ConfigError> {
    let (username, password) = resolve_credentials(profile, profile_name)?;
    let host = profile.host.clone().unwrap_or_else(|| DEFAULT_HOST.into());

    Ok(HubConfig::new(host, username, password, sid)
        .retain_between_sessions(profile.retain_between_sessions))
}

// ── Tests ───────────────────────────────────────────────────────────
