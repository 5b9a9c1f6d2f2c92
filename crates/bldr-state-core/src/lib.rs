//! Immutable application state for the Builder dashboard.
//!
//! This crate owns the state model consumed by the web UI's rendering layer:
//!
//! - **[`Schema`]**: a declarative table of every valid key path with its
//!   kind and default, validated once at construction.
//!   [`Schema::builder_web()`] declares the dashboard's sessions, GitHub
//!   integration, builds, orgs, origins, packages, projects, router, UI
//!   layout, users, and feature flags.
//!
//! - **[`StateTree`]**: the immutable root. [`StateTree::initial`] builds
//!   the default tree; [`StateTree::with_field`] returns a new tree with one
//!   field replaced and shares every untouched record through `Arc`.
//!   [`StateTree::get`] resolves paths positionally, falling back to schema
//!   defaults.
//!
//! - **[`LogStream`]**: live build-log content. A latest-value cell with
//!   ordered, synchronous subscribers and an `Empty -> Streaming -> Complete`
//!   lifecycle; pushes after completion are ignored.
//!
//! - **[`Store`]**: the explicitly owned holder of the current tree and the
//!   single update entry point. Every transition notifies observers
//!   ([`Store::subscribe`]) and async watchers ([`Store::watch`]).
//!
//! - **[`SessionSource`]**: where the initial session token comes from
//!   (cookie header, static token, or none).

pub mod access;
pub mod config;
pub mod error;
pub mod path;
pub mod schema;
pub mod session;
pub mod store;
pub mod stream;
pub mod tree;
pub mod value;

// ── Primary re-exports ──────────────────────────────────────────────
pub use access::{BUILD_LOG_PATH, FEATURE_FLAGS_PATH};
pub use config::StoreConfig;
pub use error::{SchemaError, StateError};
pub use path::{IntoKeyPath, KeyPath};
pub use schema::{FieldDecl, FieldSpec, Location, SESSION_TOKEN_PATH, Schema};
pub use session::{CookieHeader, NoSession, SESSION_COOKIE, SessionSource, StaticToken};
pub use store::Store;
pub use stream::{
    Handler, LogSnapshot, LogState, LogStream, SnapshotStream, SnapshotWatchStream,
    SubscriptionId,
};
pub use tree::StateTree;
pub use value::{Kind, Value};
