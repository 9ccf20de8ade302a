//! Bearer-token verification.
//!
//! # Responsibilities
//! - Parse the `Authorization: Bearer <token>` header
//! - Verify signature and expiry against the shared HS256 secret
//! - Reject refresh-type tokens used as bearer credentials
//!
//! # Design Decisions
//! - No database lookup at the gateway; downstream services re-verify and
//!   hydrate full user records themselves
//! - Claims are attached to request extensions for the request's duration
//!   and never stored

use axum::http::StatusCode;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims carried by platform tokens. Access tokens carry the full identity;
/// refresh tokens carry only `id` and `type = "refresh"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
}

impl Claims {
    pub fn is_refresh(&self) -> bool {
        self.token_type.as_deref() == Some("refresh")
    }
}

/// Verification failure. Every variant maps to 401; the message is the only
/// detail that crosses the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Cannot use refresh token for authentication")]
    RefreshTokenRejected,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

/// Verifies bearer tokens against the shared signing secret.
pub struct AuthVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthVerifier {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify an `Authorization` header value and return the decoded claims.
    pub fn verify(&self, authorization: Option<&str>) -> Result<Claims, AuthError> {
        let header = authorization.ok_or(AuthError::MissingToken)?;
        let token = header.strip_prefix("Bearer ").ok_or(AuthError::MissingToken)?;

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| AuthError::InvalidToken)?;

        if data.claims.is_refresh() {
            return Err(AuthError::RefreshTokenRejected);
        }

        Ok(data.claims)
    }
}
