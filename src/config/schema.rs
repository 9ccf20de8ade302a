//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so a minimal (or empty) config file works.

use serde::{Deserialize, Serialize};

/// Root configuration for the API gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, proxy trust).
    pub listener: ListenerConfig,

    /// Downstream service base URLs.
    pub services: ServicesConfig,

    /// Token verification settings.
    pub auth: AuthConfig,

    /// CORS policy.
    pub cors: CorsConfig,

    /// Rate limiting configuration, one entry per limiter instance.
    pub rate_limit: RateLimitConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:4000").
    pub bind_address: String,

    /// Trust `X-Forwarded-For` from the upstream load balancer when
    /// resolving the client IP. Leave off when clients connect directly.
    pub trust_proxy: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4000".to_string(),
            trust_proxy: false,
        }
    }
}

/// Base URLs of the six downstream services.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServicesConfig {
    pub auth_url: String,
    pub food_url: String,
    pub meals_url: String,
    pub profile_url: String,
    pub notifications_url: String,
    pub analytics_url: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            auth_url: "http://localhost:4001".to_string(),
            food_url: "http://localhost:4002".to_string(),
            meals_url: "http://localhost:4003".to_string(),
            profile_url: "http://localhost:4004".to_string(),
            notifications_url: "http://localhost:4005".to_string(),
            analytics_url: "http://localhost:4006".to_string(),
        }
    }
}

/// Token verification settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared HS256 signing secret. Usually supplied via the `JWT_SECRET`
    /// environment variable rather than the config file.
    pub jwt_secret: String,
}

/// CORS policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origin: an exact origin or "*".
    pub allowed_origin: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: "*".to_string(),
        }
    }
}

/// Configuration for one rate limiter instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimiterConfig {
    /// Window duration in seconds.
    pub window_secs: u64,

    /// Maximum requests per client IP within a live window.
    pub max_requests: u32,

    /// Message returned in the 429 body.
    pub message: String,

    /// Path suffixes that bypass counting entirely for this limiter.
    pub skip_path_suffixes: Vec<String>,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            window_secs: 15 * 60,
            max_requests: 500,
            message: "Too many requests from this IP, please try again later.".to_string(),
            skip_path_suffixes: Vec::new(),
        }
    }
}

/// The three limiter instances. Non-overlapping in purpose: general covers
/// every route, auth and upload apply only to routes that declare them.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub general: LimiterConfig,
    pub auth: LimiterConfig,
    pub upload: LimiterConfig,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            general: LimiterConfig::default(),
            auth: LimiterConfig {
                window_secs: 15 * 60,
                max_requests: 100,
                message: "Too many authentication attempts, please try again later.".to_string(),
                // The current-user endpoint is polled on every page load.
                skip_path_suffixes: vec!["/me".to_string()],
            },
            upload: LimiterConfig {
                window_secs: 60 * 60,
                max_requests: 50,
                message: "Too many uploads, please try again later.".to_string(),
                skip_path_suffixes: Vec::new(),
            },
        }
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Ceiling on a proxied call (connect + response headers) in seconds.
    /// Exceeding it always produces 504, never an indefinite hang.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
