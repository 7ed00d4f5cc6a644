//! Decoded request arguments.
//!
//! Handlers receive their inputs as a flat map of named JSON values: body
//! fields merged with the path identifier. The reserved `_session_id` key
//! may carry a session token explicitly instead of the cookie.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::context::SessionId;

/// Reserved kwarg carrying an explicit session token.
pub const SESSION_ID_KEY: &str = "_session_id";

/// Named arguments for a handler invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Kwargs(Map<String, Value>);

impl Kwargs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_object(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Remove and return a value.
    pub fn take(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Remove the reserved `_session_id` kwarg, if it holds a string.
    pub fn take_session_id(&mut self) -> Option<SessionId> {
        match self.0.remove(SESSION_ID_KEY) {
            Some(Value::String(s)) => Some(SessionId::new(s)),
            _ => None,
        }
    }

    /// Convenience accessor for string-valued kwargs.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Per-key rendering with values truncated to `max_chars`, for logging
    /// failing request parameters without dumping whole payloads.
    pub fn truncated(&self, max_chars: usize) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|(k, v)| {
                let rendered = v.to_string();
                (k.clone(), rendered.chars().take(max_chars).collect())
            })
            .collect()
    }
}

impl FromIterator<(String, Value)> for Kwargs {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Kwargs {
    type Item = (String, Value);
    type IntoIter = <Map<String, Value> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn take_session_id_removes_the_reserved_key() {
        let mut kwargs: Kwargs = [("_session_id".to_string(), json!("s-9"))]
            .into_iter()
            .collect();
        assert_eq!(kwargs.take_session_id(), Some(SessionId::from("s-9")));
        assert!(kwargs.is_empty());
    }

    #[test]
    fn take_session_id_ignores_non_string_values() {
        let mut kwargs: Kwargs = [("_session_id".to_string(), json!(42))]
            .into_iter()
            .collect();
        assert_eq!(kwargs.take_session_id(), None);
        // Still consumed: a malformed token must not leak into the handler.
        assert!(kwargs.get(SESSION_ID_KEY).is_none());
    }

    #[test]
    fn truncated_limits_each_value() {
        let mut kwargs = Kwargs::new();
        kwargs.insert("note", json!("x".repeat(200)));
        let dump = kwargs.truncated(50);
        assert_eq!(dump["note"].chars().count(), 50);
    }

    #[test]
    fn truncated_is_char_safe() {
        let mut kwargs = Kwargs::new();
        kwargs.insert("title", json!("héllo wörld"));
        // Must not panic on multi-byte boundaries.
        let dump = kwargs.truncated(3);
        assert_eq!(dump["title"], "\"hé");
    }
}
