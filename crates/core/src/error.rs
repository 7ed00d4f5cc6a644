//! API error taxonomy and the JSON error body shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Result type used by handlers and the chain wrappers.
pub type ApiResult<T> = Result<T, ApiError>;

/// JSON body returned for handler failures: `{ "msg": ..., "data"?: ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub msg: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

/// Three-tier error taxonomy for published handlers.
///
/// - `AccessDenied`: client authorization failure, surfaced with 403.
/// - `Domain`: a declared application failure, message surfaced with 500.
/// - `Internal`: anything unexpected; the adapter hides the detail behind a
///   correlation id and logs the chain server-side.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("access denied: {msg}")]
    AccessDenied {
        msg: String,
        data: Option<Map<String, Value>>,
    },

    #[error("{msg}")]
    Domain {
        msg: String,
        data: Option<Map<String, Value>>,
    },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn access_denied(msg: impl Into<String>) -> Self {
        Self::AccessDenied {
            msg: msg.into(),
            data: None,
        }
    }

    pub fn access_denied_with_data(msg: impl Into<String>, data: Map<String, Value>) -> Self {
        Self::AccessDenied {
            msg: msg.into(),
            data: Some(data),
        }
    }

    pub fn domain(msg: impl Into<String>) -> Self {
        Self::Domain {
            msg: msg.into(),
            data: None,
        }
    }

    pub fn domain_with_data(msg: impl Into<String>, data: Map<String, Value>) -> Self {
        Self::Domain {
            msg: msg.into(),
            data: Some(data),
        }
    }

    /// Error body for the declared tiers. `Internal` has no body of its own;
    /// the adapter substitutes the correlation-id message.
    pub fn body(&self) -> Option<ErrorBody> {
        match self {
            Self::AccessDenied { msg, data } | Self::Domain { msg, data } => Some(ErrorBody {
                msg: msg.clone(),
                data: data.clone(),
            }),
            Self::Internal(_) => None,
        }
    }
}
