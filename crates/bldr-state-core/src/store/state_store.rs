// ── Central state store ──
//
// Holds the current tree in a `watch` channel and broadcasts every
// transition to synchronous observers and async watchers alike.
// Transitions are serialized; observers see them in the order they were
// applied, and an update made from an observer waits its turn.

use std::sync::{Arc, Mutex, PoisonError};

use secrecy::ExposeSecret;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::access::BUILD_LOG_PATH;
use crate::config::StoreConfig;
use crate::error::StateError;
use crate::path::IntoKeyPath;
use crate::schema::{SESSION_TOKEN_PATH, Schema};
use crate::session::SessionSource;
use crate::stream::{LogStream, Observers, SnapshotStream, SubscriptionId};
use crate::tree::StateTree;
use crate::value::Value;

/// Owner of the application state.
///
/// There is no global instance: construct one and pass it to every
/// consumer. Reads are snapshot clones; writes go through `update`,
/// `update_many`, or `reset`, each of which notifies observers once.
pub struct Store {
    schema: Arc<Schema>,
    state: watch::Sender<StateTree>,
    observers: Observers<StateTree>,
    writer: Mutex<()>,
}

impl Store {
    /// Build the initial tree, seed it from `config`, and read the session
    /// token from `session` (once).
    pub fn new(
        schema: Arc<Schema>,
        config: &StoreConfig,
        session: &dyn SessionSource,
    ) -> Result<Self, StateError> {
        let mut tree = StateTree::initial(Arc::clone(&schema)).with_fields(config.seed())?;

        if let Some(token) = session.session_token() {
            tree = tree.with_field(SESSION_TOKEN_PATH, token.expose_secret())?;
            debug!("session token seeded from session source");
        }

        let (state, _) = watch::channel(tree);
        info!(
            fields = schema.len(),
            flags = config.feature_flags.len(),
            "state store initialized"
        );

        Ok(Self {
            schema,
            state,
            observers: Observers::new(),
            writer: Mutex::new(()),
        })
    }

    /// A store over the Builder dashboard schema.
    pub fn builder_web(
        config: &StoreConfig,
        session: &dyn SessionSource,
    ) -> Result<Self, StateError> {
        Self::new(Arc::new(Schema::builder_web()?), config, session)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// The current tree (cheap `Arc` clone).
    pub fn snapshot(&self) -> StateTree {
        self.state.borrow().clone()
    }

    pub fn get(&self, path: impl IntoKeyPath) -> Result<Value, StateError> {
        self.state.borrow().get(path)
    }

    pub fn feature_enabled(&self, name: &str) -> bool {
        self.state.borrow().feature_enabled(name)
    }

    /// The log stream of the currently selected build.
    pub fn build_log(&self) -> Result<LogStream, StateError> {
        self.state
            .borrow()
            .get_stream(BUILD_LOG_PATH)?
            .ok_or_else(|| StateError::invalid_path(BUILD_LOG_PATH, "no log stream present"))
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Replace one field and notify observers.
    pub fn update(
        &self,
        path: impl IntoKeyPath,
        value: impl Into<Value>,
    ) -> Result<StateTree, StateError> {
        let path = path.into_key_path()?;
        let label = path.to_string();
        self.transition(&label, |tree| tree.with_field(path, value))
    }

    /// Replace several fields as one transition (one notification).
    pub fn update_many<P, V, I>(&self, updates: I) -> Result<StateTree, StateError>
    where
        P: IntoKeyPath,
        V: Into<Value>,
        I: IntoIterator<Item = (P, V)>,
    {
        self.transition("batch", |tree| tree.with_fields(updates))
    }

    /// Restore schema defaults at `path` and notify observers.
    pub fn reset(&self, path: impl IntoKeyPath) -> Result<StateTree, StateError> {
        let path = path.into_key_path()?;
        let label = format!("reset {path}");
        self.transition(&label, |tree| tree.reset(path))
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Call `handler` with every new tree, in subscription order.
    pub fn subscribe(
        &self,
        handler: impl Fn(&StateTree) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.observers.subscribe(Arc::new(handler))
    }

    /// Call `handler` with the value at `path` now, and again whenever a
    /// transition changes it.
    pub fn subscribe_path(
        &self,
        path: impl IntoKeyPath,
        handler: impl Fn(&Value) + Send + Sync + 'static,
    ) -> Result<SubscriptionId, StateError> {
        let path = path.into_key_path()?;
        let current = self.get(&path)?;
        handler(&current);

        let last = Mutex::new(current);
        Ok(self.subscribe(move |tree| {
            let Ok(value) = tree.get(&path) else {
                return;
            };
            {
                let mut last = last.lock().unwrap_or_else(PoisonError::into_inner);
                if *last == value {
                    return;
                }
                *last = value.clone();
            }
            handler(&value);
        }))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Async view of state changes.
    pub fn watch(&self) -> SnapshotStream<StateTree> {
        SnapshotStream::new(self.state.subscribe())
    }

    fn transition(
        &self,
        label: &str,
        apply: impl FnOnce(&StateTree) -> Result<StateTree, StateError>,
    ) -> Result<StateTree, StateError> {
        let next = {
            let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
            let next = apply(&self.snapshot()).inspect_err(|err| {
                debug!(transition = label, error = %err, "transition rejected");
            })?;
            self.state.send_replace(next.clone());
            self.observers.enqueue(next.clone());
            next
        };
        let delivered = self.observers.drain();
        debug!(transition = label, delivered, "state changed");
        Ok(next)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::SecretString;

    use super::*;
    use crate::session::{CookieHeader, NoSession, StaticToken};

    fn store() -> Store {
        Store::builder_web(&StoreConfig::default(), &NoSession).unwrap()
    }

    #[test]
    fn config_and_session_seed_the_tree() {
        let mut config = StoreConfig {
            app_name: "Builder".into(),
            layout: "sign-in".into(),
            ..StoreConfig::default()
        };
        config.feature_flags.insert("events".into(), true);
        let session = CookieHeader::new("bldrSessionToken=s3cret");

        let store = Store::builder_web(&config, &session).unwrap();
        assert_eq!(store.get("app.name").unwrap(), Value::from("Builder"));
        assert_eq!(store.get("ui.layout").unwrap(), Value::from("sign-in"));
        assert_eq!(store.get(SESSION_TOKEN_PATH).unwrap(), Value::from("s3cret"));
        assert!(store.feature_enabled("events"));
        assert!(!store.feature_enabled("other"));
    }

    #[test]
    fn static_token_is_read_once_at_construction() {
        let store = Store::builder_web(
            &StoreConfig::default(),
            &StaticToken(SecretString::from("abc".to_owned())),
        )
        .unwrap();
        assert_eq!(store.get(SESSION_TOKEN_PATH).unwrap(), Value::from("abc"));
    }

    #[test]
    fn updates_replace_the_snapshot_and_keep_old_ones_intact() {
        let store = store();
        let before = store.snapshot();
        let after = store.update("users.current.isSignedIn", true).unwrap();

        assert_eq!(before.get_bool("users.current.isSignedIn").unwrap(), Some(false));
        assert_eq!(after.get_bool("users.current.isSignedIn").unwrap(), Some(true));
        assert_eq!(store.snapshot(), after);
    }

    #[test]
    fn observers_get_one_notification_per_transition() {
        let store = store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(move |tree| {
            sink.lock()
                .unwrap()
                .push(tree.get_str("router.route").unwrap().unwrap());
        });

        store.update("router.route", "/a").unwrap();
        store
            .update_many([("router.route", "/b"), ("router.redirectRoute", "/c")])
            .unwrap();
        store.reset("router").unwrap();

        assert_eq!(*seen.lock().unwrap(), ["/a", "/b", ""]);
    }

    #[test]
    fn failed_transitions_change_nothing_and_notify_nobody() {
        let store = store();
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        store.subscribe(move |_| *sink.lock().unwrap() += 1);

        let before = store.snapshot();
        assert!(store.update("router.nowhere", "/x").unwrap_err().is_invalid_path());
        assert!(
            store
                .update_many([
                    ("router.route", Value::from("/ok")),
                    ("router.redirectRoute", Value::from(7)),
                ])
                .is_err()
        );

        assert_eq!(*count.lock().unwrap(), 0);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn unsubscribed_observers_stop_hearing() {
        let store = store();
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        let id = store.subscribe(move |_| *sink.lock().unwrap() += 1);

        store.update("ui.layout", "full").unwrap();
        assert!(store.unsubscribe(id));
        store.update("ui.layout", "default").unwrap();

        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn path_subscriptions_fire_only_on_change() {
        let store = store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store
            .subscribe_path("router.route", move |v| {
                sink.lock().unwrap().push(v.as_str().unwrap().to_owned());
            })
            .unwrap();

        store.update("router.route", "/pkgs").unwrap();
        store.update("ui.layout", "wide").unwrap();
        store.update("router.route", "/pkgs").unwrap();
        store.update("router.route", "/origins").unwrap();

        assert_eq!(*seen.lock().unwrap(), ["", "/pkgs", "/origins"]);
    }

    #[test]
    fn path_subscriptions_reject_unknown_paths() {
        let store = store();
        assert!(store.subscribe_path("nope", |_| {}).is_err());
    }

    #[test]
    fn resetting_the_selected_build_replaces_its_log() {
        let store = store();
        let log = store.build_log().unwrap();
        log.push(["old build"]);

        store.reset("builds.selected").unwrap();
        let fresh = store.build_log().unwrap();
        assert!(!fresh.same_stream(&log));
        assert!(fresh.latest().lines.is_empty());
    }

    #[tokio::test]
    async fn watchers_see_transitions() {
        let store = store();
        let mut watch = store.watch();
        store.update("users.current.username", "smith").unwrap();

        let tree = watch.changed().await.unwrap();
        assert_eq!(
            tree.get_str("users.current.username").unwrap().as_deref(),
            Some("smith")
        );
    }

    #[test]
    fn updates_from_an_observer_are_delivered_after_the_current_tree() {
        let store = Arc::new(store());
        let inner = Arc::clone(&store);
        store.subscribe(move |tree| {
            if tree.get_str("router.requestedRoute").unwrap().as_deref() == Some("/a")
                && tree.get_str("router.route").unwrap().as_deref() == Some("")
            {
                inner.update("router.route", "/a").unwrap();
            }
        });
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(move |tree| {
            sink.lock()
                .unwrap()
                .push(tree.get_str("router.route").unwrap().unwrap());
        });

        store.update("router.requestedRoute", "/a").unwrap();

        assert_eq!(*seen.lock().unwrap(), ["", "/a"]);
        assert_eq!(store.get("router.route").unwrap(), Value::from("/a"));
    }

    #[test]
    fn concurrent_updates_are_never_lost() {
        const FIELDS: [&str; 4] = [
            "router.route",
            "router.requestedRoute",
            "router.redirectRoute",
            "users.current.username",
        ];
        let store = Arc::new(store());
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        store.subscribe(move |_| *sink.lock().unwrap() += 1);

        let workers: Vec<_> = FIELDS
            .iter()
            .map(|&field| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        store.update(field, format!("{field}-{i}")).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        for field in FIELDS {
            assert_eq!(store.get(field).unwrap(), Value::from(format!("{field}-24")));
        }
        assert_eq!(*count.lock().unwrap(), 100);
    }
}
