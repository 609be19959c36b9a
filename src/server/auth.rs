//! Static-secret bearer gate for mutating endpoints.
//!
//! Callers present `Authorization: Bearer <token>`; the token is compared
//! against the configured internal service secret. This is service-to-
//! service auth inside a trusted deployment, not an end-user credential
//! scheme.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use super::error::ApiError;

/// Extract the bearer token from request headers.
fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Middleware rejecting requests whose bearer token does not match the
/// configured secret.
pub async fn require_bearer(
    State(secret): State<Arc<String>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match bearer_token(&request) {
        Some(token) if token == secret.as_str() => Ok(next.run(request).await),
        _ => Err(ApiError::unauthorized()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_auth(value: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/tts");
        if let Some(v) = value {
            builder = builder.header(AUTHORIZATION, v);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn extracts_bearer_token() {
        let req = request_with_auth(Some("Bearer sekrit"));
        assert_eq!(bearer_token(&req), Some("sekrit"));
    }

    #[test]
    fn rejects_non_bearer_schemes() {
        assert_eq!(bearer_token(&request_with_auth(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&request_with_auth(None)), None);
    }
}
