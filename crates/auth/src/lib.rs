//! `restgate-auth` — session resolution and role policy.
//!
//! This crate is intentionally decoupled from HTTP and storage: the session
//! store is behind [`SessionResolver`], and the role check is a pure
//! function over group sets.

pub mod policy;
pub mod session;

pub use policy::{DeniedRoles, check_roles};
pub use session::{InMemorySessionResolver, SessionError, SessionIdentity, SessionResolver};
