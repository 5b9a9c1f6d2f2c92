// ── Application state store ──
//
// The single owner of the current StateTree and the only place where
// transitions happen.

mod state_store;

pub use state_store::Store;
