//! Gateway-synthesized responses.
//!
//! # Responsibilities
//! - Build the JSON error bodies the gateway originates itself
//! - Map upstream client errors to 502 or 504
//!
//! # Design Decisions
//! - Every gateway-originated failure is `{"error": <message>}` with an
//!   appropriate status; upstream bodies are relayed untouched
//! - No stack traces or internal detail ever cross the boundary

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Build a JSON error response with an `error` field.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

pub fn route_not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Route not found")
}

pub fn bad_gateway() -> Response {
    error_response(StatusCode::BAD_GATEWAY, "Bad Gateway")
}

pub fn gateway_timeout() -> Response {
    error_response(StatusCode::GATEWAY_TIMEOUT, "Gateway Timeout")
}

pub fn internal_error() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

/// Map an upstream client error to the status the caller sees.
///
/// Timed-out and reset connections read as 504; every other connection
/// failure, refused connections included, reads as 502.
pub fn classify_upstream_error(err: &(dyn std::error::Error + 'static)) -> StatusCode {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(current) = source {
        if let Some(io) = current.downcast_ref::<std::io::Error>() {
            return match io.kind() {
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::ConnectionReset => {
                    StatusCode::GATEWAY_TIMEOUT
                }
                _ => StatusCode::BAD_GATEWAY,
            };
        }
        source = current.source();
    }
    StatusCode::BAD_GATEWAY
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use std::io;

    #[derive(Debug)]
    struct Wrapper(io::Error);

    impl std::fmt::Display for Wrapper {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "upstream call failed")
        }
    }

    impl std::error::Error for Wrapper {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[tokio::test]
    async fn error_body_has_error_field() {
        let response = route_not_found();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({ "error": "Route not found" }));
    }

    #[test]
    fn refused_connection_reads_as_bad_gateway() {
        let err = Wrapper(io::Error::from(io::ErrorKind::ConnectionRefused));
        assert_eq!(classify_upstream_error(&err), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn reset_connection_reads_as_gateway_timeout() {
        let err = Wrapper(io::Error::from(io::ErrorKind::ConnectionReset));
        assert_eq!(classify_upstream_error(&err), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn opaque_error_defaults_to_bad_gateway() {
        #[derive(Debug)]
        struct Opaque;
        impl std::fmt::Display for Opaque {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "opaque")
            }
        }
        impl std::error::Error for Opaque {}
        assert_eq!(classify_upstream_error(&Opaque), StatusCode::BAD_GATEWAY);
    }
}
