//! Request adapter: HTTP request → context + kwargs → handler → response.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json,
    body::to_bytes,
    extract::Request,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;

use restgate_core::{ApiError, Kwargs, RequestContext, SessionId};

use crate::chain::ApiHandler;
use crate::errors::error_response;

/// Upper bound on decoded request bodies (2 MiB).
const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Cookie carrying the session token.
const SESSION_COOKIE: &str = "session_id";

/// Drive one request through a composed handler.
///
/// Establishes the anonymous identity, picks up the (URL-decoded) session
/// cookie, decodes the body into kwargs, merges the path identifier, and
/// maps the handler outcome to a JSON response. OPTIONS never reaches this
/// function; the publisher registers a preflight handler per path.
pub(crate) async fn serve(
    handler: Arc<dyn ApiHandler>,
    id: Option<(Arc<str>, String)>,
    req: Request,
) -> Response {
    let (parts, body) = req.into_parts();

    let mut ctx = RequestContext::anonymous();
    if let Some(session_id) = session_cookie(&parts.headers) {
        ctx.set_session_id(session_id);
    }

    let bytes = match to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(err) => {
            return error_response(
                ApiError::domain(format!("failed to read request body: {err}")),
                &Kwargs::new(),
            );
        }
    };

    let mut kwargs = match decode_kwargs(&parts.headers, &bytes) {
        Ok(kwargs) => kwargs,
        Err(err) => return error_response(err, &Kwargs::new()),
    };

    if let Some((name, value)) = id {
        kwargs.insert(name.as_ref(), Value::String(value));
    }

    // Keep a copy for the parameter dump if the handler blows up.
    let logged = kwargs.clone();

    match handler.call(&mut ctx, kwargs).await {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(err) => error_response(err, &logged),
    }
}

/// Extract and URL-decode the `session_id` cookie.
pub(crate) fn session_cookie(headers: &HeaderMap) -> Option<SessionId> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;

    for pair in raw.split(';') {
        if let Some(value) = pair.trim().strip_prefix("session_id=") {
            let decoded = urlencoding::decode(value).ok()?;
            return Some(SessionId::new(decoded.into_owned()));
        }
    }

    None
}

/// Decode the request body into kwargs.
///
/// Priority mirrors the adapter's contract: a JSON object body (by
/// content type), then raw bytes that parse as a JSON object, then
/// urlencoded form fields. An empty body yields empty kwargs.
pub(crate) fn decode_kwargs(headers: &HeaderMap, bytes: &[u8]) -> Result<Kwargs, ApiError> {
    if bytes.is_empty() {
        return Ok(Kwargs::new());
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type.contains("json") {
        return match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(map)) => Ok(Kwargs::from_object(map)),
            Ok(_) => Err(ApiError::domain("request body must be a JSON object")),
            Err(err) => Err(ApiError::domain(format!("invalid JSON body: {err}"))),
        };
    }

    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(bytes) {
        return Ok(Kwargs::from_object(map));
    }

    match serde_urlencoded::from_bytes::<Vec<(String, String)>>(bytes) {
        Ok(pairs) => Ok(pairs
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect()),
        Err(err) => Err(ApiError::domain(format!("unsupported request body: {err}"))),
    }
}

/// Shared preflight endpoint; the CORS layer decorates the empty response.
pub(crate) async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Extract the declared path identifier from axum's captures.
pub(crate) fn path_id(params: &HashMap<String, String>, name: &str) -> String {
    params.get(name).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn headers_with(content_type: Option<&str>, cookie: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(ct) = content_type {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(ct).unwrap());
        }
        if let Some(c) = cookie {
            headers.insert(header::COOKIE, HeaderValue::from_str(c).unwrap());
        }
        headers
    }

    #[test]
    fn session_cookie_is_url_decoded() {
        let headers = headers_with(None, Some("theme=dark; session_id=abc%20def"));
        assert_eq!(
            session_cookie(&headers),
            Some(SessionId::from("abc def"))
        );
    }

    #[test]
    fn missing_session_cookie_is_none() {
        let headers = headers_with(None, Some("theme=dark"));
        assert_eq!(session_cookie(&headers), None);
        assert_eq!(session_cookie(&HeaderMap::new()), None);
    }

    #[test]
    fn empty_body_decodes_to_empty_kwargs() {
        let kwargs = decode_kwargs(&HeaderMap::new(), b"").unwrap();
        assert!(kwargs.is_empty());
    }

    #[test]
    fn json_object_body_decodes_by_content_type() {
        let headers = headers_with(Some("application/json"), None);
        let kwargs = decode_kwargs(&headers, br#"{"title": "buy milk", "done": false}"#).unwrap();
        assert_eq!(kwargs.get("title"), Some(&json!("buy milk")));
        assert_eq!(kwargs.get("done"), Some(&json!(false)));
    }

    #[test]
    fn non_object_json_body_is_rejected() {
        let headers = headers_with(Some("application/json"), None);
        let err = decode_kwargs(&headers, b"[1, 2, 3]").unwrap_err();
        assert!(matches!(err, ApiError::Domain { .. }));
    }

    #[test]
    fn malformed_json_body_is_rejected() {
        let headers = headers_with(Some("application/json"), None);
        assert!(decode_kwargs(&headers, b"{not json").is_err());
    }

    #[test]
    fn raw_json_object_decodes_without_content_type() {
        let kwargs = decode_kwargs(&HeaderMap::new(), br#"{"id": 9}"#).unwrap();
        assert_eq!(kwargs.get("id"), Some(&json!(9)));
    }

    #[test]
    fn form_body_decodes_as_strings() {
        let headers = headers_with(Some("application/x-www-form-urlencoded"), None);
        let kwargs = decode_kwargs(&headers, b"title=buy+milk&priority=2").unwrap();
        assert_eq!(kwargs.get("title"), Some(&json!("buy milk")));
        assert_eq!(kwargs.get("priority"), Some(&json!("2")));
    }
}
