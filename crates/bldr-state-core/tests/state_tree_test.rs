//! End-to-end behavior of the dashboard state tree, its accessors, and
//! the build log stream, exercised through the public API only.
#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use bldr_state_core::{
    BUILD_LOG_PATH, KeyPath, Kind, LogState, LogStream, NoSession, Schema, StateTree, Store,
    StoreConfig, Value,
};
use indexmap::IndexMap;
use pretty_assertions::assert_eq;

// ── Helpers ─────────────────────────────────────────────────────────

fn schema() -> Arc<Schema> {
    Arc::new(Schema::builder_web().unwrap())
}

/// A sample value of the right kind that differs from the default.
fn sample_for(kind: Kind) -> Value {
    match kind {
        Kind::Bool => Value::Bool(true),
        Kind::Int => Value::Int(42),
        Kind::Str => Value::from("changed"),
        Kind::List => Value::List(vec![Value::from("item")]),
        Kind::Map => {
            let mut map = IndexMap::new();
            map.insert("k".to_owned(), Value::Bool(true));
            Value::Map(map)
        }
        Kind::Stream => {
            let stream = LogStream::new();
            stream.push(["line"]);
            Value::Stream(stream)
        }
    }
}

// ── Defaults ────────────────────────────────────────────────────────

#[test]
fn every_schema_path_reads_its_declared_default() {
    let schema = schema();
    let tree = StateTree::initial(Arc::clone(&schema));
    for (path, spec) in schema.fields() {
        assert_eq!(tree.get(path).unwrap(), spec.default, "default at {path}");
    }
}

#[test]
fn signed_out_by_default_with_empty_router() {
    let tree = StateTree::initial(schema());
    assert_eq!(tree.get_bool("users.current.isSignedIn").unwrap(), Some(false));
    for field in ["requestedRoute", "route", "redirectRoute"] {
        assert_eq!(
            tree.get(["router", field]).unwrap(),
            Value::from(""),
            "router.{field}"
        );
    }
    assert_eq!(tree.get("session.token").unwrap(), Value::from(""));
    assert_eq!(tree.get_bool("origins.ui.current.loading").unwrap(), Some(true));
    assert_eq!(
        tree.get_str("origins.current.default_package_visibility")
            .unwrap()
            .as_deref(),
        Some("public")
    );
}

// ── Updates ─────────────────────────────────────────────────────────

#[test]
fn with_field_round_trips_on_every_path_and_leaves_original_alone() {
    let schema = schema();
    let original = StateTree::initial(Arc::clone(&schema));
    for (path, spec) in schema.fields() {
        let value = sample_for(spec.kind);
        let updated = original.with_field(path, value.clone()).unwrap();
        assert_eq!(updated.get(path).unwrap(), value, "updated {path}");
        assert_eq!(original.get(path).unwrap(), spec.default, "original {path}");
    }
}

#[test]
fn undeclared_paths_fail_with_invalid_path() {
    let tree = StateTree::initial(schema());
    for bad in [
        "users.current.isAdmin",
        "router.route.deeper",
        "sessions.token",
        "featureFlags.current.someFlag",
        "orgs.current.availableMemberSearchResults.0",
    ] {
        let err = tree.with_field(bad, true).unwrap_err();
        assert!(err.is_invalid_path(), "{bad} gave {err}");
        assert!(tree.get(bad).unwrap_err().is_invalid_path());
    }
}

#[test]
fn sign_in_scenario_keeps_old_snapshot() {
    let tree = StateTree::initial(schema());
    let path = KeyPath::try_from(&["users", "current", "isSignedIn"][..]).unwrap();

    let signed_in = tree.with_field(&path, true).unwrap();

    assert_eq!(signed_in.get(&path).unwrap(), Value::Bool(true));
    assert_eq!(tree.get(&path).unwrap(), Value::Bool(false));
}

// ── Build log ───────────────────────────────────────────────────────

#[test]
fn build_log_lifecycle_through_the_store() {
    let store = Store::builder_web(&StoreConfig::default(), &NoSession).unwrap();
    let log = store.build_log().unwrap();

    let seen: Arc<Mutex<Vec<Vec<String>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    log.subscribe(move |snap| sink.lock().unwrap().push(snap.lines.to_vec()));

    assert!(log.push(["a"]));
    assert!(log.push(["a", "b"]));
    assert!(log.mark_complete());
    assert!(!log.push(["c"]));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.last().unwrap(), &["a".to_owned(), "b".to_owned()]);
    assert!(!seen.iter().any(|lines| lines.contains(&"c".to_owned())));
    assert_eq!(log.state(), LogState::Complete);

    // The tree still holds the same stream; it renders as its lines.
    let rendered = store.get(BUILD_LOG_PATH).unwrap().to_json();
    assert_eq!(rendered, serde_json::json!(["a", "b"]));
}
