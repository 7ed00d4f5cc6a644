//! `restgate-http` — expose async handlers as REST endpoints over axum.
//!
//! If you're new to this workspace, the layering is:
//! - `chain.rs`: the handler interface + cross-cutting wrappers
//!   (authorization gate, transaction wrapper)
//! - `adapter.rs`: HTTP request → context + kwargs → handler → JSON response
//! - `publisher.rs`: URL registration (CRUD conventions + free-form mappings)
//! - `cors.rs`: CORS headers on every published route
//! - `errors.rs`: error → status/body mapping
//! - `encode.rs`: handler-result serialization helpers

pub mod adapter;
pub mod chain;
pub mod cors;
pub mod encode;
pub mod errors;
pub mod publisher;

pub use chain::{ApiHandler, FnHandler, Protected, Transactional, handler_fn};
pub use publisher::{HandlerSpec, HttpPublisher, ResourceHandlers, ResourceId, RestPublisher};
