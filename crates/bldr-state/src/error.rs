//! CLI error types with miette diagnostics.
//!
//! Maps `StateError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use bldr_state_config::ConfigError;
use bldr_state_core::{SchemaError, StateError};

/// Process exit codes (0 is success).
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const INVALID_PATH: i32 = 4;
    pub const TYPE_MISMATCH: i32 = 5;
    pub const CONFIG: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── State addressing ─────────────────────────────────────────────
    #[error("Invalid path '{path}': {reason}")]
    #[diagnostic(
        code(bldr_state::invalid_path),
        help("Run: bldr-state schema   to list every declared path")
    )]
    InvalidPath { path: String, reason: String },

    #[error("Type mismatch at '{path}': expected {expected}, found {found}")]
    #[diagnostic(
        code(bldr_state::type_mismatch),
        help(
            "Run: bldr-state schema {path}   to see the declared kind.\n\
             Quote JSON strings in assignments, e.g. {path}='\"text\"'"
        )
    )]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("Unsupported value: {reason}")]
    #[diagnostic(code(bldr_state::unsupported_value))]
    UnsupportedValue { reason: String },

    #[error("Schema declaration is invalid")]
    #[diagnostic(code(bldr_state::schema))]
    Schema(#[source] SchemaError),

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(bldr_state::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error")]
    #[diagnostic(
        code(bldr_state::config),
        help("Run: bldr-state config path   to locate the file being read")
    )]
    Config(#[source] ConfigError),

    #[error("Configuration file already exists at {path}")]
    #[diagnostic(
        code(bldr_state::config_exists),
        help("Use --force (-f) to overwrite it.")
    )]
    ConfigExists { path: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(bldr_state::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(bldr_state::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to render TOML: {0}")]
    #[diagnostic(code(bldr_state::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidPath { .. } => exit_code::INVALID_PATH,
            Self::TypeMismatch { .. } => exit_code::TYPE_MISMATCH,
            Self::UnsupportedValue { .. } | Self::Validation { .. } => exit_code::USAGE,
            Self::Config(_) | Self::ConfigExists { .. } => exit_code::CONFIG,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Library error → CliError mapping ─────────────────────────────────

impl From<StateError> for CliError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::InvalidPath { path, reason } => CliError::InvalidPath { path, reason },
            StateError::TypeMismatch {
                path,
                expected,
                found,
            } => CliError::TypeMismatch {
                path,
                expected,
                found,
            },
            StateError::UnsupportedValue { reason } => CliError::UnsupportedValue { reason },
            StateError::Schema(source) => CliError::Schema(source),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}
