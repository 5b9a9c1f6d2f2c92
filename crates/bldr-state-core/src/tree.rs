// ── Immutable state tree ──
//
// Nested records of leaf values. Every update copies the records along the
// changed path and shares everything else through `Arc`.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::StateError;
use crate::path::{IntoKeyPath, KeyPath};
use crate::schema::{Location, Schema};
use crate::value::{Kind, Value};

pub(crate) type Record = IndexMap<String, Node>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Leaf(Value),
    Record(Arc<Record>),
}

/// The immutable root of all application state.
///
/// Cloning is cheap. Updates return a new tree and leave `self` untouched.
#[derive(Clone)]
pub struct StateTree {
    schema: Arc<Schema>,
    root: Arc<Record>,
}

impl StateTree {
    /// Build a tree holding every schema default.
    pub fn initial(schema: Arc<Schema>) -> Self {
        let mut root = Record::new();
        for (path, spec) in schema.fields() {
            insert(&mut root, path.segments(), spec.initial_value());
        }
        Self {
            schema,
            root: Arc::new(root),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Return a new tree with the field at `path` replaced by `value`.
    ///
    /// A record path takes a `Map` whose keys name children of that record;
    /// each child is replaced in turn. The whole update fails if any part does.
    pub fn with_field(
        &self,
        path: impl IntoKeyPath,
        value: impl Into<Value>,
    ) -> Result<Self, StateError> {
        let path = path.into_key_path()?;
        self.set(&path, value.into())
    }

    /// Apply several updates; either all of them land or none do.
    pub fn with_fields<P, V, I>(&self, updates: I) -> Result<Self, StateError>
    where
        P: IntoKeyPath,
        V: Into<Value>,
        I: IntoIterator<Item = (P, V)>,
    {
        updates
            .into_iter()
            .try_fold(self.clone(), |tree, (path, value)| tree.with_field(path, value))
    }

    /// Restore schema defaults for a field or every field of a record.
    pub fn reset(&self, path: impl IntoKeyPath) -> Result<Self, StateError> {
        let path = path.into_key_path()?;
        let mut root = Arc::clone(&self.root);
        match self.schema.lookup(&path)? {
            Location::Field(spec) => {
                insert(Arc::make_mut(&mut root), path.segments(), spec.initial_value());
            }
            Location::Record => {
                let target = Arc::make_mut(&mut root);
                for (field, spec) in self.schema.fields_under(&path) {
                    insert(target, field.segments(), spec.initial_value());
                }
            }
        }
        Ok(self.with_root(root))
    }

    /// True if `other` holds the very same record (not a copy) at `path`.
    pub fn shares(&self, other: &StateTree, path: impl IntoKeyPath) -> Result<bool, StateError> {
        let path = path.into_key_path()?;
        Ok(match (self.node(&path), other.node(&path)) {
            (Some(Node::Record(a)), Some(Node::Record(b))) => Arc::ptr_eq(a, b),
            _ => false,
        })
    }

    // ── Internal helpers ─────────────────────────────────────────────

    fn set(&self, path: &KeyPath, value: Value) -> Result<Self, StateError> {
        match self.schema.lookup(path)? {
            Location::Field(spec) => {
                spec.check(path, &value)?;
                let mut root = Arc::clone(&self.root);
                insert(Arc::make_mut(&mut root), path.segments(), value);
                tracing::trace!(%path, "field replaced");
                Ok(self.with_root(root))
            }
            Location::Record => match value {
                Value::Map(children) => {
                    children
                        .into_iter()
                        .try_fold(self.clone(), |tree, (key, child)| {
                            let child_path = path.child(key)?;
                            tree.set(&child_path, child)
                        })
                }
                other => Err(StateError::TypeMismatch {
                    path: path.to_string(),
                    expected: format!("record ({})", Kind::Map),
                    found: other
                        .kind()
                        .map_or_else(|| "null".to_owned(), |k| k.to_string()),
                }),
            },
        }
    }

    fn with_root(&self, root: Arc<Record>) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            root,
        }
    }

    pub(crate) fn node(&self, path: &KeyPath) -> Option<&Node> {
        let (last, parents) = path.segments().split_last()?;
        let mut record: &Record = &self.root;
        for segment in parents {
            match record.get(segment)? {
                Node::Record(child) => record = &**child,
                Node::Leaf(_) => return None,
            }
        }
        record.get(last)
    }
}

/// Write `value` at `segments`, creating (or copying-on-write) the records
/// along the way.
fn insert(record: &mut Record, segments: &[String], value: Value) {
    match segments {
        [] => {}
        [leaf] => {
            record.insert(leaf.clone(), Node::Leaf(value));
        }
        [head, rest @ ..] => {
            let child = record
                .entry(head.clone())
                .or_insert_with(|| Node::Record(Arc::new(Record::new())));
            if let Node::Leaf(_) = child {
                *child = Node::Record(Arc::new(Record::new()));
            }
            if let Node::Record(inner) = child {
                insert(Arc::make_mut(inner), rest, value);
            }
        }
    }
}

impl PartialEq for StateTree {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.root, &other.root) || self.root == other.root
    }
}

impl fmt::Debug for StateTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateTree")
            .field("records", &self.root.keys().collect::<Vec<_>>())
            .field("fields", &self.schema.len())
            .finish()
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Leaf(value) => value.serialize(serializer),
            Self::Record(record) => serialize_record(record, serializer),
        }
    }
}

impl Serialize for StateTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_record(&self.root, serializer)
    }
}

fn serialize_record<S: Serializer>(record: &Record, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(record.len()))?;
    for (key, node) in record {
        map.serialize_entry(key, node)?;
    }
    map.end()
}
