//! Handler-result serialization helpers.
//!
//! Handlers return `serde_json::Value`; this module converts typed results
//! into that shape. The workspace's serde configuration gives the wire
//! contract for free:
//! - `chrono` dates/datetimes serialize as ISO-8601 strings,
//! - `rust_decimal::Decimal` serializes as a floating-point JSON number
//!   (the `serde-float` feature),
//! - any sequence or set serializes as a JSON array.

use serde::Serialize;
use serde_json::Value;

use restgate_core::{ApiError, ApiResult};

/// Serialize a handler result to a JSON value.
///
/// Serialization failures are unexpected by construction, so they land in
/// the internal tier (correlation id, detail logged server-side).
pub fn to_value<T: Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::from(anyhow::Error::new(e).context("failed to serialize handler result")))
}
