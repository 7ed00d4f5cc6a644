//! Error → HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use restgate_core::{ApiError, ErrorBody, Kwargs};

pub fn json_error(status: StatusCode, body: &ErrorBody) -> Response {
    (status, axum::Json(body)).into_response()
}

/// Map a handler failure to a response.
///
/// Declared tiers surface their own body. Unexpected errors surface only a
/// correlation id; the full chain and a truncated parameter dump are logged
/// server-side under that id.
pub fn error_response(err: ApiError, kwargs: &Kwargs) -> Response {
    match err {
        ApiError::AccessDenied { msg, data } => {
            tracing::warn!(msg = %msg, "access denied");
            json_error(StatusCode::FORBIDDEN, &ErrorBody { msg, data })
        }
        ApiError::Domain { msg, data } => {
            tracing::error!(msg = %msg, "api execution error");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, &ErrorBody { msg, data })
        }
        ApiError::Internal(err) => {
            let error_id = Uuid::new_v4().simple().to_string();
            tracing::error!(
                error_id = %error_id,
                error = ?err,
                "unhandled api execution error"
            );
            tracing::error!(
                error_id = %error_id,
                parameters = ?kwargs.truncated(50),
                "failing request parameters"
            );
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ErrorBody {
                    msg: format!("Server error: {error_id}"),
                    data: None,
                },
            )
        }
    }
}
