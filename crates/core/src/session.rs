use std::{
    fmt,
    sync::{Arc, Mutex},
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque token correlating one page load's events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-page cookie storage. Clones share the same jar.
#[derive(Clone, Default)]
pub struct CookieJar {
    entries: Arc<Mutex<Vec<(String, String)>>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().expect("CookieJar poisoned");
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => entries.push((key.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .expect("CookieJar poisoned")
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Value for a `Cookie` request header, `None` when the jar is empty.
    pub fn header(&self) -> Option<String> {
        let entries = self.entries.lock().expect("CookieJar poisoned");
        if entries.is_empty() {
            return None;
        }
        Some(
            entries
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

pub trait SessionIdentity: Send + Sync + 'static {
    fn current(&self) -> Option<SessionId>;
    fn get_or_create(&self) -> SessionId;
}

/// Session identity held in a page cookie.
pub struct CookieSession {
    jar: CookieJar,
    key: String,
}

impl CookieSession {
    /// Page-load path: always writes a fresh identifier, replacing any earlier one.
    pub fn start(jar: CookieJar, key: impl Into<String>) -> Self {
        let session = Self {
            jar,
            key: key.into(),
        };
        let sid = SessionId::random();
        session.jar.set(&session.key, sid.as_str());
        tracing::debug!(key = %session.key, sid = %sid, "session cookie written");
        session
    }
}

impl SessionIdentity for CookieSession {
    fn current(&self) -> Option<SessionId> {
        self.jar.get(&self.key).map(SessionId)
    }

    fn get_or_create(&self) -> SessionId {
        if let Some(sid) = self.current() {
            return sid;
        }
        let sid = SessionId::random();
        self.jar.set(&self.key, sid.as_str());
        sid
    }
}

/// Caller-supplied identifier, for resuming a session recorded earlier.
pub struct FixedSession(SessionId);

impl FixedSession {
    pub fn new(sid: SessionId) -> Self {
        Self(sid)
    }
}

impl SessionIdentity for FixedSession {
    fn current(&self) -> Option<SessionId> {
        Some(self.0.clone())
    }

    fn get_or_create(&self) -> SessionId {
        self.0.clone()
    }
}
