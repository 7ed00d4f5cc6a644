//! CORS headers for published routes.

use axum::{
    extract::Request,
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};

/// Append CORS headers to every response: wildcard origin, long max-age,
/// the published method set, and an echo of the requested headers.
pub async fn cors_middleware(req: Request, next: Next) -> Response {
    let requested_headers = req
        .headers()
        .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(""));

    let mut resp = next.run(req).await;

    let headers = resp.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static("10368000"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, OPTIONS, PATCH"),
    );
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, requested_headers);

    resp
}
