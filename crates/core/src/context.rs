//! Per-request identity context.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Opaque session token, resolved externally to a user id + groups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for SessionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifier of a user. `0` is the anonymous identity.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    pub const ANONYMOUS: UserId = UserId(0);

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }

    pub fn is_anonymous(&self) -> bool {
        *self == Self::ANONYMOUS
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Request-scoped identity holder.
///
/// Created fresh by the request adapter for every incoming request and
/// threaded explicitly through the handler chain (never a process global,
/// so concurrent requests stay isolated). The adapter always establishes
/// the anonymous identity first; the authorization gate may elevate it
/// once the session resolves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    session_id: Option<SessionId>,
    user_id: UserId,
    groups: HashSet<String>,
}

impl RequestContext {
    /// Fresh anonymous context (uid 0, no groups, no session).
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn groups(&self) -> &HashSet<String> {
        &self.groups
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_anonymous()
    }

    /// Record the session token presented by the request (cookie or kwarg).
    ///
    /// This does not grant any identity; only [`RequestContext::elevate`]
    /// does that, after the session has actually resolved.
    pub fn set_session_id(&mut self, session_id: SessionId) {
        self.session_id = Some(session_id);
    }

    /// Replace the anonymous identity with a resolved one.
    pub fn elevate(&mut self, session_id: SessionId, user_id: UserId, groups: HashSet<String>) {
        self.session_id = Some(session_id);
        self.user_id = user_id;
        self.groups = groups;
    }
}
