//! Security response headers and client address resolution.
//!
//! # Responsibilities
//! - Add hardening headers to every response, the health check included
//! - Resolve the true client IP, honoring X-Forwarded-For only behind a
//!   trusted proxy
//!
//! # Design Decisions
//! - Headers are registered once, at the outermost layer
//! - Never trust forwarded headers from untrusted sources

use std::net::{IpAddr, SocketAddr};

use axum::{
    body::Body,
    http::{
        header::{self, HeaderName, HeaderValue},
        HeaderMap, Request,
    },
    middleware::Next,
    response::Response,
};

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Middleware adding hardening headers to every response.
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=15552000; includeSubDomains"),
    );
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(
        HeaderName::from_static("x-dns-prefetch-control"),
        HeaderValue::from_static("off"),
    );
    headers.insert(
        HeaderName::from_static("x-download-options"),
        HeaderValue::from_static("noopen"),
    );
    headers.insert(
        HeaderName::from_static("x-permitted-cross-domain-policies"),
        HeaderValue::from_static("none"),
    );
    headers.insert(
        HeaderName::from_static("x-xss-protection"),
        HeaderValue::from_static("0"),
    );
    response
}

/// Resolve the client address for rate limiting.
///
/// Behind a trusted proxy the first `X-Forwarded-For` entry is authoritative;
/// otherwise, or when the header is unusable, the socket peer address is.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr, trust_proxy: bool) -> IpAddr {
    if trust_proxy {
        if let Some(forwarded) = headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            if let Some(first) = forwarded.split(',').next() {
                if let Ok(ip) = first.trim().parse() {
                    return ip;
                }
            }
        }
    }
    peer.ip()
}
