//! Configuration for the bldr-state tooling.
//!
//! TOML file + `BLDR_STATE_*` environment layering, session-token
//! resolution (env var, cookie file, plaintext), and translation to
//! `bldr_state_core::StoreConfig`. The CLI adds flag-aware wrappers on top.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use indexmap::IndexMap;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use bldr_state_core::{CookieHeader, NoSession, SessionSource, StaticToken, StoreConfig};

/// Prefix for environment overrides, e.g. `BLDR_STATE_APP__NAME=Builder`.
///
/// `__` separates nesting levels. Keys are lowercased on the way in, so
/// `BLDR_STATE_FEATURE_FLAGS__newNav=true` sets the flag `newnav`;
/// mixed-case flag names belong in the file.
pub const ENV_PREFIX: &str = "BLDR_STATE_";

const OUTPUT_FORMATS: &[&str] = &["table", "json", "json-compact", "yaml", "plain"];
const COLOR_MODES: &[&str] = &["auto", "always", "never"];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

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
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub app: App,

    /// Flags seeded into `featureFlags.current`.
    #[serde(default)]
    pub feature_flags: IndexMap<String, bool>,

    #[serde(default)]
    pub session: Session,

    /// Output defaults for the CLI.
    #[serde(default)]
    pub defaults: Defaults,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct App {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_layout")]
    pub layout: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            layout: default_layout(),
        }
    }
}

/// Where the initial session token comes from.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Session {
    /// Plaintext token (prefer `token_env` or `cookie_file`).
    pub token: Option<String>,

    /// Environment variable name containing the token.
    pub token_env: Option<String>,

    /// File holding a `Cookie:` header value.
    pub cookie_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_app_name() -> String {
    StoreConfig::default().app_name
}
fn default_layout() -> String {
    StoreConfig::default().layout
}
fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

impl Config {
    /// Reject values the CLI and store cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app.layout.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "app.layout".into(),
                reason: "must not be empty".into(),
            });
        }
        check_choice("defaults.output", &self.defaults.output, OUTPUT_FORMATS)?;
        check_choice("defaults.color", &self.defaults.color, COLOR_MODES)?;
        if let Some(name) = self.feature_flags.keys().find(|name| name.contains('.')) {
            return Err(ConfigError::Validation {
                field: "feature_flags".into(),
                reason: format!("flag name '{name}' must not contain '.'"),
            });
        }
        Ok(())
    }
}

fn check_choice(field: &str, value: &str, allowed: &[&str]) -> Result<(), ConfigError> {
    if allowed.contains(&value) {
        return Ok(());
    }
    Err(ConfigError::Validation {
        field: field.into(),
        reason: format!("expected one of {}, got '{value}'", allowed.join(", ")),
    })
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("sh", "habitat", "bldr-state").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("bldr-state");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file path + environment. A missing file is
/// treated as empty.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Session resolution ──────────────────────────────────────────────

/// Resolve the session source from the `[session]` chain:
///
/// 1. `token_env` → env var lookup
/// 2. `cookie_file` → parsed as a `Cookie:` header
/// 3. plaintext `token`
/// 4. no session
pub fn resolve_session(cfg: &Config) -> Result<Box<dyn SessionSource>, ConfigError> {
    let session = &cfg.session;

    if let Some(ref env_name) = session.token_env {
        if let Ok(val) = std::env::var(env_name) {
            if !val.is_empty() {
                debug!(env = %env_name, "session token from environment");
                return Ok(Box::new(StaticToken(SecretString::from(val))));
            }
        }
    }

    if let Some(ref path) = session.cookie_file {
        let header = CookieHeader::new(std::fs::read_to_string(path)?);
        if header.session_token().is_some() {
            debug!(path = %path.display(), "session token from cookie file");
            return Ok(Box::new(header));
        }
    }

    if let Some(ref token) = session.token {
        if !token.is_empty() {
            return Ok(Box::new(StaticToken(SecretString::from(token.clone()))));
        }
    }

    Ok(Box::new(NoSession))
}

/// Translate the `[app]` and `[feature_flags]` sections for the store.
pub fn to_store_config(cfg: &Config) -> StoreConfig {
    StoreConfig {
        app_name: cfg.app.name.clone(),
        layout: cfg.app.layout.clone(),
        feature_flags: cfg.feature_flags.clone(),
    }
}
