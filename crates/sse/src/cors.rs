//! Origin guard and CORS middleware.
//!
//! The guard runs first and rejects before anything else happens; the CORS
//! layer then decorates every admitted response and answers preflights.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use policy::{Decision, OriginPolicy};
use tracing::warn;

use crate::error::ErrorResponse;

pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Accept, Mcp-Session-Id";
pub const EXPOSE_HEADERS: &str = "Mcp-Session-Id";

/// Reject requests whose `Origin` the policy does not admit.
pub async fn origin_guard(
    State(policy): State<OriginPolicy>,
    request: Request,
    next: Next,
) -> Response {
    let decision = match request.headers().get(header::ORIGIN) {
        None => policy.check(None),
        Some(value) => match value.to_str() {
            Ok(origin) => policy.check(Some(origin)),
            Err(_) => Decision::Deny {
                reason: "Origin header is not valid text".to_string(),
            },
        },
    };

    match decision {
        Decision::Allow => next.run(request).await,
        Decision::Deny { reason } => {
            warn!(method = %request.method(), path = %request.uri().path(), %reason, "Rejected request");
            ErrorResponse::forbidden_origin(reason).into_response()
        }
    }
}

/// Add CORS headers to every response; answer `OPTIONS` directly.
pub async fn cors(State(policy): State<OriginPolicy>, request: Request, next: Next) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };

    let allow_origin = policy.allow_origin_value(origin.as_deref());
    apply_cors_headers(response.headers_mut(), &allow_origin);
    response
}

fn apply_cors_headers(headers: &mut HeaderMap, allow_origin: &str) {
    if let Ok(value) = HeaderValue::from_str(allow_origin) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(EXPOSE_HEADERS),
    );
    headers.append(header::VARY, HeaderValue::from_static("Origin"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_headers_are_complete() {
        let mut headers = HeaderMap::new();
        apply_cors_headers(&mut headers, "http://127.0.0.1:9999");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://127.0.0.1:9999");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], ALLOW_METHODS);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], ALLOW_HEADERS);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::VARY], "Origin");
    }
}
