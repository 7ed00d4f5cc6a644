//! Session resolution boundary.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

use restgate_core::{SessionId, UserId};

/// Identity a session resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_id: UserId,
    pub groups: HashSet<String>,
}

impl SessionIdentity {
    pub fn new(user_id: UserId, groups: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            user_id,
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The token does not map to a live session.
    #[error("session not found")]
    UnknownSession,

    /// The session store itself failed.
    #[error("session backend error: {0}")]
    Backend(String),
}

/// External collaborator mapping a session token to a user id + group set.
///
/// Implementations are expected to hit a session store (database, cache,
/// sidecar service). The toolkit only ships the in-memory resolver below.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, session_id: &SessionId) -> Result<SessionIdentity, SessionError>;
}

#[async_trait]
impl<R> SessionResolver for Arc<R>
where
    R: SessionResolver + ?Sized,
{
    async fn resolve(&self, session_id: &SessionId) -> Result<SessionIdentity, SessionError> {
        (**self).resolve(session_id).await
    }
}

/// In-memory session resolver.
///
/// Intended for tests/dev. Not a session store: nothing expires.
#[derive(Debug, Default)]
pub struct InMemorySessionResolver {
    sessions: RwLock<HashMap<SessionId, SessionIdentity>>,
}

impl InMemorySessionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session_id: SessionId, identity: SessionIdentity) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.insert(session_id, identity);
        }
    }

    pub fn revoke(&self, session_id: &SessionId) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.remove(session_id);
        }
    }
}

#[async_trait]
impl SessionResolver for InMemorySessionResolver {
    async fn resolve(&self, session_id: &SessionId) -> Result<SessionIdentity, SessionError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| SessionError::Backend("lock poisoned".to_string()))?;

        sessions
            .get(session_id)
            .cloned()
            .ok_or(SessionError::UnknownSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_inserted_sessions() {
        let resolver = InMemorySessionResolver::new();
        resolver.insert(
            SessionId::from("s-1"),
            SessionIdentity::new(UserId::new(7), ["admin"]),
        );

        let identity = resolver.resolve(&SessionId::from("s-1")).await.unwrap();
        assert_eq!(identity.user_id, UserId::new(7));
        assert!(identity.groups.contains("admin"));
    }

    #[tokio::test]
    async fn unknown_session_is_an_error() {
        let resolver = InMemorySessionResolver::new();
        let err = resolver.resolve(&SessionId::from("nope")).await.unwrap_err();
        assert_eq!(err, SessionError::UnknownSession);
    }

    #[tokio::test]
    async fn revoked_sessions_stop_resolving() {
        let resolver = InMemorySessionResolver::new();
        let sid = SessionId::from("s-2");
        resolver.insert(sid.clone(), SessionIdentity::new(UserId::new(1), ["user"]));
        resolver.revoke(&sid);

        assert_eq!(
            resolver.resolve(&sid).await.unwrap_err(),
            SessionError::UnknownSession
        );
    }

    #[tokio::test]
    async fn resolver_works_through_arc_dyn() {
        let resolver: Arc<dyn SessionResolver> = Arc::new(InMemorySessionResolver::new());
        assert!(resolver.resolve(&SessionId::from("missing")).await.is_err());
    }
}
