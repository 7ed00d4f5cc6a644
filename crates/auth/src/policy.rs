//! Role-intersection policy check.
//!
//! Access is granted when the resolved groups intersect the route's
//! required roles. Pure function: no IO, no panics.

use std::collections::HashSet;

use serde_json::{Map, Value, json};

/// Diagnostic payload for a failed role check.
///
/// Both sides are sorted so the surfaced JSON is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeniedRoles {
    pub groups: Vec<String>,
    pub roles_required: Vec<String>,
}

impl DeniedRoles {
    fn new(groups: &HashSet<String>, required: &HashSet<String>) -> Self {
        let mut groups: Vec<String> = groups.iter().cloned().collect();
        let mut roles_required: Vec<String> = required.iter().cloned().collect();
        groups.sort();
        roles_required.sort();
        Self {
            groups,
            roles_required,
        }
    }

    /// Shape used as the `data` field of the 403 error body.
    pub fn into_data(self) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert("groups".to_string(), json!(self.groups));
        data.insert("roles_required".to_string(), json!(self.roles_required));
        data
    }
}

/// Grant access iff `groups ∩ required` is non-empty.
pub fn check_roles(
    groups: &HashSet<String>,
    required: &HashSet<String>,
) -> Result<(), DeniedRoles> {
    if groups.intersection(required).next().is_some() {
        Ok(())
    } else {
        Err(DeniedRoles::new(groups, required))
    }
}
