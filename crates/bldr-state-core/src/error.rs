// ── Core error types ──
//
// Errors raised while declaring a schema or addressing a tree by path.
// Log streams never fail: a push after completion is dropped, not raised.

use thiserror::Error;

use crate::value::Kind;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    // ── Addressing errors ────────────────────────────────────────────
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    // ── Value errors ─────────────────────────────────────────────────
    #[error("Unsupported value: {reason}")]
    UnsupportedValue { reason: String },

    // ── Schema errors ────────────────────────────────────────────────
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl StateError {
    pub(crate) fn invalid_path(path: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn mismatch(path: impl ToString, expected: Kind, found: Option<Kind>) -> Self {
        Self::TypeMismatch {
            path: path.to_string(),
            expected: expected.to_string(),
            found: found.map_or_else(|| "null".to_owned(), |k| k.to_string()),
        }
    }

    /// True for schema/path addressing failures.
    pub fn is_invalid_path(&self) -> bool {
        matches!(self, Self::InvalidPath { .. })
    }
}

/// Problems found while validating a schema declaration table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Malformed schema path '{path}'")]
    InvalidPath { path: String },

    #[error("Field '{path}' is declared more than once")]
    Duplicate { path: String },

    #[error("Field '{path}' conflicts with '{other}': a leaf cannot also be a record")]
    Conflict { path: String, other: String },

    #[error("Default for '{path}' does not match declared kind {expected}")]
    DefaultMismatch { path: String, expected: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_renders_null_for_missing_kind() {
        let err = StateError::mismatch("router.route", Kind::Str, None);
        assert_eq!(
            err.to_string(),
            "Type mismatch at 'router.route': expected string, found null"
        );
    }

    #[test]
    fn schema_errors_convert_transparently() {
        let err: StateError = SchemaError::Duplicate { path: "a.b".into() }.into();
        assert_eq!(err.to_string(), "Field 'a.b' is declared more than once");
        assert!(!err.is_invalid_path());
    }
}
