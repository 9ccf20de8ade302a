//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check upstream URLs parse and carry scheme + authority
//! - Validate value ranges (windows > 0, caps > 0)
//! - Reject an empty signing secret
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before the config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use axum::http::Uri;

use crate::config::schema::{GatewayConfig, LimiterConfig};

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidBindAddress(String),
    InvalidUpstreamUrl { service: &'static str, url: String },
    EmptyJwtSecret,
    ZeroWindow { limiter: &'static str },
    ZeroMaxRequests { limiter: &'static str },
    ZeroUpstreamTimeout,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidBindAddress(addr) => {
                write!(f, "listener.bind_address {:?} is not a socket address", addr)
            }
            ValidationError::InvalidUpstreamUrl { service, url } => {
                write!(f, "services.{}_url {:?} is not an absolute http URL", service, url)
            }
            ValidationError::EmptyJwtSecret => {
                write!(f, "auth.jwt_secret is empty (set it or export JWT_SECRET)")
            }
            ValidationError::ZeroWindow { limiter } => {
                write!(f, "rate_limit.{}.window_secs must be greater than zero", limiter)
            }
            ValidationError::ZeroMaxRequests { limiter } => {
                write!(f, "rate_limit.{}.max_requests must be greater than zero", limiter)
            }
            ValidationError::ZeroUpstreamTimeout => {
                write!(f, "timeouts.upstream_secs must be greater than zero")
            }
        }
    }
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let upstreams: [(&'static str, &str); 6] = [
        ("auth", &config.services.auth_url),
        ("food", &config.services.food_url),
        ("meals", &config.services.meals_url),
        ("profile", &config.services.profile_url),
        ("notifications", &config.services.notifications_url),
        ("analytics", &config.services.analytics_url),
    ];
    for (service, url) in upstreams {
        if !is_absolute_http_url(url) {
            errors.push(ValidationError::InvalidUpstreamUrl {
                service,
                url: url.to_string(),
            });
        }
    }

    if config.auth.jwt_secret.is_empty() {
        errors.push(ValidationError::EmptyJwtSecret);
    }

    let limiters: [(&'static str, &LimiterConfig); 3] = [
        ("general", &config.rate_limit.general),
        ("auth", &config.rate_limit.auth),
        ("upload", &config.rate_limit.upload),
    ];
    for (name, limiter) in limiters {
        if limiter.window_secs == 0 {
            errors.push(ValidationError::ZeroWindow { limiter: name });
        }
        if limiter.max_requests == 0 {
            errors.push(ValidationError::ZeroMaxRequests { limiter: name });
        }
    }

    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroUpstreamTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_absolute_http_url(url: &str) -> bool {
    match url.parse::<Uri>() {
        Ok(uri) => {
            uri.scheme_str().map(|s| s == "http" || s == "https").unwrap_or(false)
                && uri.authority().is_some()
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.auth.jwt_secret = "secret".to_string();
        config
    }

    #[test]
    fn default_config_with_secret_is_valid() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn empty_secret_is_rejected() {
        let config = GatewayConfig::default();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::EmptyJwtSecret));
    }

    #[test]
    fn malformed_upstream_url_is_rejected() {
        let mut config = valid_config();
        config.services.meals_url = "localhost:4003".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidUpstreamUrl {
                service: "meals",
                url: "localhost:4003".to_string(),
            }]
        );
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".to_string();
        config.rate_limit.upload.max_requests = 0;
        config.timeouts.upstream_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }
}
