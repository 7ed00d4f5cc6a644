//! `restgate-core` — shared request-level building blocks.
//!
//! This crate contains the pieces every layer of the publisher agrees on:
//! identity types, the per-request context, the error taxonomy, and the
//! decoded keyword-argument map. No HTTP, no storage.

pub mod context;
pub mod error;
pub mod kwargs;

pub use context::{RequestContext, SessionId, UserId};
pub use error::{ApiError, ApiResult, ErrorBody};
pub use kwargs::{Kwargs, SESSION_ID_KEY};
