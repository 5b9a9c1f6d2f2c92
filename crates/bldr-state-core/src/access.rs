// ── Path accessor ──
//
// Read side of the state tree: positional resolution of key paths against
// the schema, with schema defaults standing in for anything absent.

use indexmap::IndexMap;

use crate::error::StateError;
use crate::path::{IntoKeyPath, KeyPath};
use crate::schema::{FieldSpec, Location};
use crate::stream::LogStream;
use crate::tree::{Node, StateTree};
use crate::value::{Kind, Value};

/// Path of the feature-flag map.
pub const FEATURE_FLAGS_PATH: &str = "featureFlags.current";

/// Path of the selected build's log stream.
pub const BUILD_LOG_PATH: &str = "builds.selected.log.content";

impl StateTree {
    /// Read the value at `path`.
    ///
    /// Leaf paths return the stored value (or the schema default if the
    /// leaf is absent). Record paths return a `Map` of the whole sub-record.
    pub fn get(&self, path: impl IntoKeyPath) -> Result<Value, StateError> {
        let path = path.into_key_path()?;
        match self.schema().lookup(&path)? {
            Location::Field(spec) => Ok(self.leaf_or_default(&path, spec)),
            Location::Record => Ok(self.record_value(&path)),
        }
    }

    /// Read a `bool` field. `None` means the optional field is unset.
    pub fn get_bool(&self, path: impl IntoKeyPath) -> Result<Option<bool>, StateError> {
        self.typed(path, Kind::Bool, Value::as_bool)
    }

    /// Read an `int` field. `None` means the optional field is unset.
    pub fn get_int(&self, path: impl IntoKeyPath) -> Result<Option<i64>, StateError> {
        self.typed(path, Kind::Int, Value::as_int)
    }

    /// Read a `string` field. `None` means the optional field is unset.
    pub fn get_str(&self, path: impl IntoKeyPath) -> Result<Option<String>, StateError> {
        self.typed(path, Kind::Str, |v| v.as_str().map(str::to_owned))
    }

    /// Read a `stream` field.
    pub fn get_stream(&self, path: impl IntoKeyPath) -> Result<Option<LogStream>, StateError> {
        self.typed(path, Kind::Stream, |v| v.as_stream().cloned())
    }

    /// Whether the named feature flag is switched on. Missing or
    /// non-boolean flags read as off.
    pub fn feature_enabled(&self, name: &str) -> bool {
        self.get(FEATURE_FLAGS_PATH)
            .ok()
            .as_ref()
            .and_then(Value::as_map)
            .and_then(|flags| flags.get(name))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    // ── Internal helpers ─────────────────────────────────────────────

    fn typed<T>(
        &self,
        path: impl IntoKeyPath,
        kind: Kind,
        extract: impl Fn(&Value) -> Option<T>,
    ) -> Result<Option<T>, StateError> {
        let path = path.into_key_path()?;
        match self.schema().lookup(&path)? {
            Location::Field(spec) if spec.kind == kind => {
                Ok(extract(&self.leaf_or_default(&path, spec)))
            }
            Location::Field(spec) => Err(StateError::mismatch(&path, kind, Some(spec.kind))),
            Location::Record => Err(StateError::TypeMismatch {
                path: path.to_string(),
                expected: kind.to_string(),
                found: "record".into(),
            }),
        }
    }

    fn leaf_or_default(&self, path: &KeyPath, spec: &FieldSpec) -> Value {
        match self.node(path) {
            Some(Node::Leaf(value)) => value.clone(),
            _ => spec.initial_value(),
        }
    }

    fn record_value(&self, prefix: &KeyPath) -> Value {
        let depth = prefix.len();
        let mut out: IndexMap<String, Value> = IndexMap::new();
        for (path, spec) in self.schema().fields_under(prefix) {
            let value = self.leaf_or_default(path, spec);
            place(&mut out, &path.segments()[depth..], value);
        }
        Value::Map(out)
    }
}

fn place(map: &mut IndexMap<String, Value>, segments: &[String], value: Value) {
    match segments {
        [] => {}
        [leaf] => {
            map.insert(leaf.clone(), value);
        }
        [head, rest @ ..] => {
            let child = map
                .entry(head.clone())
                .or_insert_with(|| Value::Map(IndexMap::new()));
            if let Value::Map(inner) = child {
                place(inner, rest, value);
            }
        }
    }
}
