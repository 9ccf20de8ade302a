//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (resolve client IP, add hardening headers on the way out)
//!     → rate_limit.rs (check per-IP limits, general then route-specific)
//!     → auth.rs (verify bearer token unless the route is exempt)
//!     → Pass to routing
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - Rate limiting is advisory DoS protection, not a security boundary;
//!   token verification is the security boundary

pub mod auth;
pub mod headers;
pub mod rate_limit;

pub use auth::{AuthError, AuthVerifier, Claims};
pub use rate_limit::{FixedWindowLimiter, RateLimitDecision};
