// ── Declarative state schema ──
//
// A flat table of `path -> field spec`, validated once at construction.
// Records are implied by the paths: every proper prefix of a declared
// leaf is a record, and nothing may be both.

mod builder_web;

use indexmap::{IndexMap, IndexSet};

use crate::error::{SchemaError, StateError};
use crate::path::KeyPath;
use crate::stream::LogStream;
use crate::value::{Kind, Value};

pub use builder_web::SESSION_TOKEN_PATH;

/// One row of a schema declaration table, before validation.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub path: String,
    pub kind: Kind,
    pub optional: bool,
    pub default: Value,
    pub sensitive: bool,
}

impl FieldDecl {
    /// A required field with an explicit default.
    pub fn new(path: impl Into<String>, kind: Kind, default: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            kind,
            optional: false,
            default: default.into(),
            sensitive: false,
        }
    }

    /// An optional field, unset by default.
    pub fn optional(path: impl Into<String>, kind: Kind) -> Self {
        Self {
            path: path.into(),
            kind,
            optional: true,
            default: Value::Null,
            sensitive: false,
        }
    }

    /// Mark the field as holding a credential; renderers should mask it.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

/// Validated declaration of a single leaf field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub kind: Kind,
    pub optional: bool,
    pub default: Value,
    pub sensitive: bool,
}

impl FieldSpec {
    /// The value a fresh tree holds for this field.
    ///
    /// Stream fields get a new, empty `LogStream` each time so that two
    /// trees built from one schema never share a log.
    pub fn initial_value(&self) -> Value {
        match self.default {
            Value::Stream(_) => Value::Stream(LogStream::new()),
            ref other => other.clone(),
        }
    }

    /// Whether `value` may be stored in this field.
    pub fn accepts(&self, value: &Value) -> bool {
        value
            .kind()
            .map_or(self.optional, |kind| kind == self.kind)
    }

    pub(crate) fn check(&self, path: &KeyPath, value: &Value) -> Result<(), StateError> {
        if self.accepts(value) {
            Ok(())
        } else {
            Err(StateError::mismatch(path, self.kind, value.kind()))
        }
    }
}

/// What a path resolves to in the schema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Location<'a> {
    Field(&'a FieldSpec),
    Record,
}

/// The static set of valid paths, their kinds, and their defaults.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: IndexMap<KeyPath, FieldSpec>,
    records: IndexSet<KeyPath>,
}

impl Schema {
    /// Validate a declaration table.
    pub fn from_decls(decls: impl IntoIterator<Item = FieldDecl>) -> Result<Self, SchemaError> {
        let mut fields: IndexMap<KeyPath, FieldSpec> = IndexMap::new();
        let mut records: IndexSet<KeyPath> = IndexSet::new();

        for decl in decls {
            let path = KeyPath::parse(&decl.path).map_err(|_| SchemaError::InvalidPath {
                path: decl.path.clone(),
            })?;

            if fields.contains_key(&path) {
                return Err(SchemaError::Duplicate {
                    path: path.to_string(),
                });
            }
            if records.contains(&path) {
                let other = fields
                    .keys()
                    .find(|f| f.starts_with(&path))
                    .map(ToString::to_string)
                    .unwrap_or_default();
                return Err(SchemaError::Conflict {
                    path: path.to_string(),
                    other,
                });
            }
            for ancestor in path.ancestors() {
                if fields.contains_key(&ancestor) {
                    return Err(SchemaError::Conflict {
                        path: path.to_string(),
                        other: ancestor.to_string(),
                    });
                }
                records.insert(ancestor);
            }

            let default_ok = match decl.default.kind() {
                None => decl.optional,
                Some(kind) => kind == decl.kind,
            };
            if !default_ok {
                return Err(SchemaError::DefaultMismatch {
                    path: path.to_string(),
                    expected: decl.kind.to_string(),
                });
            }

            fields.insert(
                path,
                FieldSpec {
                    kind: decl.kind,
                    optional: decl.optional,
                    default: decl.default,
                    sensitive: decl.sensitive,
                },
            );
        }

        tracing::debug!(
            fields = fields.len(),
            records = records.len(),
            "schema validated"
        );
        Ok(Self { fields, records })
    }

    /// Resolve a path to a field or record. Undeclared paths are errors.
    pub fn lookup(&self, path: &KeyPath) -> Result<Location<'_>, StateError> {
        if let Some(spec) = self.fields.get(path) {
            return Ok(Location::Field(spec));
        }
        if self.records.contains(path) {
            return Ok(Location::Record);
        }
        Err(StateError::invalid_path(path, "not declared in schema"))
    }

    pub fn field(&self, path: &KeyPath) -> Option<&FieldSpec> {
        self.fields.get(path)
    }

    pub fn is_record(&self, path: &KeyPath) -> bool {
        self.records.contains(path)
    }

    /// All leaf declarations in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&KeyPath, &FieldSpec)> {
        self.fields.iter()
    }

    /// Leaf declarations at or beneath `prefix`.
    pub fn fields_under<'a>(
        &'a self,
        prefix: &'a KeyPath,
    ) -> impl Iterator<Item = (&'a KeyPath, &'a FieldSpec)> + 'a {
        self.fields.iter().filter(move |(p, _)| p.starts_with(prefix))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn path(s: &str) -> KeyPath {
        KeyPath::parse(s).unwrap()
    }

    #[test]
    fn records_are_implied_by_leaves() {
        let schema = Schema::from_decls([
            FieldDecl::new("router.route", Kind::Str, ""),
            FieldDecl::new("users.current.isSignedIn", Kind::Bool, false),
        ])
        .unwrap();

        assert!(schema.is_record(&path("users")));
        assert!(schema.is_record(&path("users.current")));
        assert_eq!(schema.lookup(&path("router")).unwrap(), Location::Record);
        assert!(matches!(
            schema.lookup(&path("router.route")).unwrap(),
            Location::Field(spec) if spec.kind == Kind::Str
        ));
        assert!(schema.lookup(&path("router.nope")).unwrap_err().is_invalid_path());
    }

    #[test]
    fn duplicate_paths_are_rejected() {
        let err = Schema::from_decls([
            FieldDecl::new("ui.layout", Kind::Str, "default"),
            FieldDecl::new("ui.layout", Kind::Str, "wide"),
        ])
        .unwrap_err();
        assert_eq!(err, SchemaError::Duplicate { path: "ui.layout".into() });
    }

    #[test]
    fn leaf_record_overlap_is_rejected_in_either_order() {
        let err = Schema::from_decls([
            FieldDecl::new("a.b", Kind::Bool, true),
            FieldDecl::new("a.b.c", Kind::Bool, true),
        ])
        .unwrap_err();
        assert!(matches!(err, SchemaError::Conflict { ref other, .. } if other == "a.b"));

        let err = Schema::from_decls([
            FieldDecl::new("a.b.c", Kind::Bool, true),
            FieldDecl::new("a.b", Kind::Bool, true),
        ])
        .unwrap_err();
        assert!(matches!(err, SchemaError::Conflict { ref other, .. } if other == "a.b.c"));
    }

    #[test]
    fn defaults_must_match_kind() {
        let err = Schema::from_decls([FieldDecl::new("a.count", Kind::Int, "zero")]).unwrap_err();
        assert!(matches!(err, SchemaError::DefaultMismatch { .. }));

        let err =
            Schema::from_decls([FieldDecl::new("a.name", Kind::Str, Value::Null)]).unwrap_err();
        assert!(matches!(err, SchemaError::DefaultMismatch { .. }));

        assert!(Schema::from_decls([FieldDecl::optional("a.name", Kind::Str)]).is_ok());
    }

    #[test]
    fn malformed_declaration_paths_are_rejected() {
        let err = Schema::from_decls([FieldDecl::new("a..b", Kind::Int, 0)]).unwrap_err();
        assert_eq!(err, SchemaError::InvalidPath { path: "a..b".into() });
    }

    #[test]
    fn optional_fields_accept_null_only_when_optional() {
        let required = FieldSpec {
            kind: Kind::Str,
            optional: false,
            default: Value::from(""),
            sensitive: false,
        };
        let optional = FieldSpec {
            optional: true,
            default: Value::Null,
            ..required.clone()
        };
        assert!(!required.accepts(&Value::Null));
        assert!(optional.accepts(&Value::Null));
        assert!(optional.accepts(&Value::from("x")));
        assert!(!optional.accepts(&Value::from(1)));
    }

    #[test]
    fn stream_defaults_are_fresh_per_instance() {
        let spec = FieldSpec {
            kind: Kind::Stream,
            optional: false,
            default: Value::Stream(LogStream::new()),
            sensitive: false,
        };
        let (Value::Stream(a), Value::Stream(b)) = (spec.initial_value(), spec.initial_value())
        else {
            panic!("expected streams");
        };
        assert!(!a.same_stream(&b));
    }

    #[test]
    fn fields_under_filters_by_prefix() {
        let schema = Schema::from_decls([
            FieldDecl::new("router.route", Kind::Str, ""),
            FieldDecl::new("router.redirectRoute", Kind::Str, ""),
            FieldDecl::new("ui.layout", Kind::Str, "default"),
        ])
        .unwrap();
        let prefix = path("router");
        let names: Vec<String> = schema
            .fields_under(&prefix)
            .map(|(p, _)| p.to_string())
            .collect();
        assert_eq!(names, ["router.route", "router.redirectRoute"]);
    }
}
