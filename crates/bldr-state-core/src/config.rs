// ── Store seeding configuration ──
//
// Values the host application supplies when building a store. The core
// never reads files or the environment itself; `bldr-state-config` builds
// this from TOML + env and hands it in.

use indexmap::IndexMap;

use crate::value::Value;

/// Overrides applied to a fresh tree before the store hands it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Product name shown in the UI chrome (`app.name`).
    pub app_name: String,
    /// Initial page layout (`ui.layout`).
    pub layout: String,
    /// Feature flags seeded into `featureFlags.current`.
    pub feature_flags: IndexMap<String, bool>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            app_name: "Habitat".into(),
            layout: "default".into(),
            feature_flags: IndexMap::new(),
        }
    }
}

impl StoreConfig {
    /// The `(path, value)` updates this config implies, in application order.
    pub(crate) fn seed(&self) -> Vec<(&'static str, Value)> {
        let flags: IndexMap<String, Value> = self
            .feature_flags
            .iter()
            .map(|(name, on)| (name.clone(), Value::Bool(*on)))
            .collect();
        vec![
            ("app.name", Value::from(self.app_name.as_str())),
            ("ui.layout", Value::from(self.layout.as_str())),
            (crate::access::FEATURE_FLAGS_PATH, Value::Map(flags)),
        ]
    }
}
