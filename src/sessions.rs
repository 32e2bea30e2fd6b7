//! In-memory form sessions keyed by a cookie.

use std::time::Duration;

use axum::http::{header, HeaderMap};
use moka::future::Cache;
use serde::Serialize;
use uuid::Uuid;

use crate::design::DesignSession;

pub const SESSION_COOKIE: &str = "bw_session";

/// Session store with idle expiry.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<Uuid, DesignSession>,
}

#[derive(Debug, Serialize)]
pub struct SessionStats {
    pub active_sessions: u64,
    pub capacity: u64,
    pub idle_timeout_secs: u64,
}

impl SessionStore {
    pub fn new(capacity: u64, idle_timeout: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(capacity)
            .time_to_idle(idle_timeout)
            .build();
        Self { sessions }
    }

    /// Existing session for `id`, or a fresh one under a new id.
    pub async fn load(&self, id: Option<Uuid>) -> (Uuid, DesignSession) {
        if let Some(id) = id {
            if let Some(session) = self.sessions.get(&id).await {
                return (id, session);
            }
            tracing::debug!("session {} expired or unknown, starting a new one", id);
        }
        let id = Uuid::new_v4();
        let session = DesignSession::default();
        self.sessions.insert(id, session.clone()).await;
        (id, session)
    }

    pub async fn save(&self, id: Uuid, session: DesignSession) {
        self.sessions.insert(id, session).await;
    }

    pub fn stats(&self) -> SessionStats {
        let policy = self.sessions.policy();
        SessionStats {
            active_sessions: self.sessions.entry_count(),
            capacity: policy.max_capacity().unwrap_or_default(),
            idle_timeout_secs: policy.time_to_idle().map(|d| d.as_secs()).unwrap_or_default(),
        }
    }
}

/// Session id from the request's `Cookie` header, if present and well formed.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
}

/// `Set-Cookie` value for `id`.
pub fn session_cookie(id: Uuid) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}
