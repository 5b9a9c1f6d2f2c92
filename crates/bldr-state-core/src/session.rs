// ── Session token sources ──
//
// Where the initial session token comes from. The store asks exactly once,
// at construction, and treats the answer as opaque.

use secrecy::{ExposeSecret, SecretString};

/// Name of the cookie the Builder UI keeps its session token in.
pub const SESSION_COOKIE: &str = "bldrSessionToken";

/// Supplies the initial session token.
pub trait SessionSource {
    fn session_token(&self) -> Option<SecretString>;
}

/// No session: the tree starts signed out with an empty token.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSession;

impl SessionSource for NoSession {
    fn session_token(&self) -> Option<SecretString> {
        None
    }
}

/// A token known up front (config file, environment, tests).
#[derive(Debug, Clone)]
pub struct StaticToken(pub SecretString);

impl SessionSource for StaticToken {
    fn session_token(&self) -> Option<SecretString> {
        let token = self.0.expose_secret();
        (!token.is_empty()).then(|| SecretString::from(token.to_owned()))
    }
}

/// A `Cookie:` header value, e.g. `theme=dark; bldrSessionToken=abc123`.
#[derive(Debug, Clone)]
pub struct CookieHeader {
    header: String,
}

impl CookieHeader {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
        }
    }

    /// Look up a cookie by name. Empty values count as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.header
            .split(';')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| key.trim() == name)
            .map(|(_, value)| value.trim().trim_matches('"'))
            .filter(|value| !value.is_empty())
    }
}

impl SessionSource for CookieHeader {
    fn session_token(&self) -> Option<SecretString> {
        self.get(SESSION_COOKIE)
            .map(|token| SecretString::from(token.to_owned()))
    }
}

impl<S: SessionSource + ?Sized> SessionSource for Box<S> {
    fn session_token(&self) -> Option<SecretString> {
        (**self).session_token()
    }
}
