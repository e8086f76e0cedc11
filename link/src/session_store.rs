//! Session id cache shared by every connection of a client.
//!
//! Logging in to an AceQL server costs a round trip and a fresh server-side
//! session. Once a `(server, username, database)` triple has authenticated,
//! its session id is cached so later connects attach to the same session
//! with `get_connection` instead of re-sending the password.
//!
//! The default backend is [`MemorySessionStore`]. Any other storage can be
//! plugged in through the [`SessionStore`] trait.

use std::collections::HashMap;
use std::sync::RwLock;

/// Identity a cached session id is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    pub server_url: String,
    pub username: String,
    pub database: String,
}

impl SessionKey {
    pub fn new(
        server_url: impl Into<String>,
        username: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            username: username.into(),
            database: database.into(),
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}/{}", self.username, self.server_url, self.database)
    }
}

/// Storage backend for cached session ids.
///
/// Implementations are shared across threads, so they take `&self` and
/// handle their own synchronization. Session ids are bearer secrets: never
/// log them at a level above `trace`.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use aceql_link::{SessionKey, SessionStore};
///
/// struct NoCache;
///
/// impl SessionStore for NoCache {
///     fn get(&self, _key: &SessionKey) -> Option<String> { None }
///     fn set(&self, _key: SessionKey, _session_id: String) {}
///     fn remove(&self, _key: &SessionKey) {}
///     fn list(&self) -> Vec<SessionKey> { vec![] }
/// }
/// ```
pub trait SessionStore: Send + Sync {
    /// Cached session id for `key`, if any.
    fn get(&self, key: &SessionKey) -> Option<String>;

    /// Store or overwrite the session id for `key`.
    fn set(&self, key: SessionKey, session_id: String);

    /// Forget `key`. Removing an absent key is not an error.
    fn remove(&self, key: &SessionKey);

    /// Every key currently cached.
    fn list(&self) -> Vec<SessionKey>;

    fn contains(&self, key: &SessionKey) -> bool {
        self.get(key).is_some()
    }
}

/// In-memory session store, the default for every client.
///
/// Entries live as long as the store; nothing is persisted.
///
/// # Example
///
/// ```rust
/// use aceql_link::{MemorySessionStore, SessionKey, SessionStore};
///
/// let store = MemorySessionStore::new();
/// let key = SessionKey::new("http://localhost:9090/aceql", "alice", "sampledb");
///
/// store.set(key.clone(), "s-123".to_string());
/// assert_eq!(store.get(&key).as_deref(), Some("s-123"));
///
/// store.remove(&key);
/// assert!(!store.contains(&key));
/// ```
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionKey, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &SessionKey) -> Option<String> {
        self.sessions.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: SessionKey, session_id: String) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.insert(key, session_id);
        }
    }

    fn remove(&self, key: &SessionKey) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.remove(key);
        }
    }

    fn list(&self) -> Vec<SessionKey> {
        let mut keys: Vec<SessionKey> = self
            .sessions
            .read()
            .map(|s| s.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}
