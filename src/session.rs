use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_cookies::{Cookie, Cookies, cookie::SameSite};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::SessionError,
};

/// SessionData
///
/// The server-trusted state of one client. `page_views` only means something
/// while `user_id` is absent; it is left alone (not reset) once a user logs in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    pub user_id: Option<i64>,
    pub page_views: u32,
}

/// SessionClaims
///
/// Payload of the signed token stored in the session cookie. It only names the
/// server-side slot; the session contents never leave the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Session id: key into the `SessionStore`.
    pub sid: Uuid,
    /// Expiration Time (exp): tokens past this instant start a fresh session.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
}

/// Signs a token for `sid` valid for `ttl`.
pub fn issue_token(sid: Uuid, secret: &str, ttl: Duration) -> Result<String, SessionError> {
    let now = Utc::now();
    let claims = SessionClaims {
        sid,
        iat: now.timestamp() as usize,
        exp: (now + ttl).timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Returns the session id of a well-formed, correctly signed, unexpired token.
pub fn verify_token(token: &str, secret: &str) -> Option<Uuid> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    match decode::<SessionClaims>(token, &decoding_key, &validation) {
        Ok(data) => Some(data.claims.sid),
        Err(e) => {
            tracing::debug!(error = %e, "discarding session token");
            None
        }
    }
}

struct StoredSession {
    data: SessionData,
    expires_at: DateTime<Utc>,
}

/// In-memory session store
///
/// Maps session ids to their data with a sliding expiry: every `save` pushes the
/// deadline out by the TTL. Handlers commit on every request made by a logged-in
/// session, so an active reader stays logged in. Sessions are lost on server restart.
///
/// Only non-empty sessions are kept: a session whose data is back to
/// `SessionData::default()` is indistinguishable from no session and is destroyed.
///
/// Concurrent requests from one client are not serialized here; two anonymous
/// views racing on the same session may record a single increment.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, StoredSession>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the stored data unless the slot is missing or expired.
    pub async fn load(&self, id: Uuid) -> Option<SessionData> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&id)
            .filter(|stored| stored.expires_at > Utc::now())
            .map(|stored| stored.data.clone())
    }

    pub async fn save(&self, id: Uuid, data: SessionData) {
        let expires_at = Utc::now() + self.ttl;
        let mut sessions = self.sessions.write().await;
        sessions.insert(id, StoredSession { data, expires_at });
    }

    pub async fn destroy(&self, id: Uuid) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&id);
    }

    /// Drops every expired slot and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, stored| stored.expires_at > now);
        before - sessions.len()
    }

    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }
}

/// Session Extractor
///
/// The per-request session context. Handlers read and mutate `data` directly and
/// call `commit` to write it back; uncommitted changes are discarded.
///
/// A request without a cookie, or whose token is tampered with or expired, gets a
/// brand new empty session. The cookie is only set once the session is committed.
pub struct Session {
    id: Uuid,
    pub data: SessionData,
    has_cookie: bool,
    store: SessionStore,
    cookies: Cookies,
    config: AppConfig,
}

impl Session {
    /// Persists `data` and (re)issues the cookie, extending the session's lifetime.
    ///
    /// Empty data drops the slot and the cookie instead, so clients that never
    /// keep cookies do not leave entries behind.
    pub async fn commit(self) -> Result<(), SessionError> {
        if self.data == SessionData::default() {
            self.store.destroy(self.id).await;
            if self.has_cookie {
                let mut cookie = Cookie::new(self.config.session_cookie_name.clone(), "");
                cookie.set_path("/");
                self.cookies.remove(cookie);
            }
            return Ok(());
        }

        let token = issue_token(self.id, &self.config.session_secret, self.store.ttl())?;
        self.store.save(self.id, self.data).await;

        let mut cookie = Cookie::new(self.config.session_cookie_name.clone(), token);
        cookie.set_http_only(true);
        cookie.set_path("/");
        cookie.set_same_site(SameSite::Lax);
        if self.config.env == Env::Production {
            cookie.set_secure(true);
        }
        self.cookies.add(cookie);
        Ok(())
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    SessionStore: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = SessionStore::from_ref(state);
        let config = AppConfig::from_ref(state);

        // Requires CookieManagerLayer on the router.
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(|(status, reason)| {
                tracing::error!(reason, "cookie manager unavailable");
                status
            })?;

        let presented = cookies.get(&config.session_cookie_name);
        let has_cookie = presented.is_some();
        let existing =
            presented.and_then(|cookie| verify_token(cookie.value(), &config.session_secret));

        let (id, data) = match existing {
            // A valid token whose slot expired or was purged starts over empty.
            Some(id) => (id, store.load(id).await.unwrap_or_default()),
            None => (Uuid::new_v4(), SessionData::default()),
        };

        Ok(Session {
            id,
            data,
            has_cookie,
            store,
            cookies,
            config,
        })
    }
}
