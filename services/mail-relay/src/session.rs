//! Server-side session store
//!
//! Sessions live in process memory, keyed by a random id carried in a signed
//! cookie. A session holds at most two bearer tokens: the user-delegated token
//! from the authorization-code exchange and the application token from the
//! client-credential exchange. Idle sessions are purged lazily on write.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use common::Secret;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

/// Opaque session identifier (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_simple())
    }
}

/// Per-browser state. Fields are only reachable through accessors so the
/// "both tokens present" check has exactly one implementation.
#[derive(Debug, Clone)]
pub struct Session {
    user_access_token: Option<Secret<String>>,
    app_access_token: Option<Secret<String>>,
    last_seen: Instant,
}

/// Both tokens of a fully signed-in session.
#[derive(Debug, Clone)]
pub struct ReadyTokens {
    pub user_access_token: Secret<String>,
    pub app_access_token: Secret<String>,
}

impl Session {
    fn new() -> Self {
        Self {
            user_access_token: None,
            app_access_token: None,
            last_seen: Instant::now(),
        }
    }

    pub fn user_access_token(&self) -> Option<&Secret<String>> {
        self.user_access_token.as_ref()
    }

    pub fn app_access_token(&self) -> Option<&Secret<String>> {
        self.app_access_token.as_ref()
    }

    /// `Some` only when both tokens are present.
    pub fn ready_tokens(&self) -> Option<ReadyTokens> {
        Some(ReadyTokens {
            user_access_token: self.user_access_token()?.clone(),
            app_access_token: self.app_access_token()?.clone(),
        })
    }
}

/// Process-wide session map. Cloning shares the same map.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<SessionId, Session>>>,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            idle_ttl,
        }
    }

    /// Snapshot of a live session, refreshing its idle timer.
    /// Expired sessions are removed and reported as absent.
    pub async fn get(&self, id: &SessionId) -> Option<Session> {
        let mut sessions = self.sessions.lock().await;
        let expired = sessions
            .get(id)
            .is_some_and(|s| s.last_seen.elapsed() >= self.idle_ttl);
        if expired {
            sessions.remove(id);
            debug!(session = %id, "session expired");
            return None;
        }
        let session = sessions.get_mut(id)?;
        session.last_seen = Instant::now();
        Some(session.clone())
    }

    /// Store the user-delegated token, creating the session if needed.
    /// Any application token from an earlier sign-in is dropped, so the
    /// session is only ready again once the next client-credential exchange
    /// succeeds.
    pub async fn set_user_token(&self, id: &SessionId, token: Secret<String>) {
        self.update(id, |s| {
            s.user_access_token = Some(token);
            s.app_access_token = None;
        })
        .await;
    }

    /// Store the application token, creating the session if needed.
    pub async fn set_app_token(&self, id: &SessionId, token: Secret<String>) {
        self.update(id, |s| s.app_access_token = Some(token)).await;
    }

    /// Number of sessions currently held (expired ones included until purged).
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    async fn update(&self, id: &SessionId, apply: impl FnOnce(&mut Session)) {
        let mut sessions = self.sessions.lock().await;
        let ttl = self.idle_ttl;
        sessions.retain(|_, s| s.last_seen.elapsed() < ttl);
        let session = sessions.entry(*id).or_insert_with(Session::new);
        apply(session);
        session.last_seen = Instant::now();
    }
}

/// Read and verify the session id from the signed cookie jar.
pub fn session_id_from_jar(jar: &SignedCookieJar, cookie_name: &str) -> Option<SessionId> {
    jar.get(cookie_name)
        .and_then(|cookie| SessionId::parse(cookie.value()))
}

/// Session cookie for `id`: HttpOnly, SameSite=Lax, whole site, browser-session lifetime.
pub fn session_cookie(cookie_name: &str, id: SessionId) -> Cookie<'static> {
    Cookie::build((cookie_name.to_owned(), id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}
