//! Configuration loading from disk and environment.

use std::fmt;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// All semantic problems found in one validation pass.
#[derive(Debug)]
pub struct ValidationFailure(pub Vec<ValidationError>);

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    Validation(ValidationFailure),
}

/// Load and validate configuration from a TOML file.
///
/// `JWT_SECRET` from the environment overrides the file value, so the
/// secret never has to live on disk.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;
    finish(config)
}

/// Build a configuration from defaults and the environment, for deployments
/// that run without a config file.
pub fn load_default() -> Result<GatewayConfig, ConfigError> {
    finish(GatewayConfig::default())
}

fn finish(mut config: GatewayConfig) -> Result<GatewayConfig, ConfigError> {
    apply_env_overrides(&mut config);
    validate_config(&config).map_err(|errors| ConfigError::Validation(ValidationFailure(errors)))?;
    Ok(config)
}

fn apply_env_overrides(config: &mut GatewayConfig) {
    if let Ok(secret) = std::env::var("JWT_SECRET") {
        if !secret.is_empty() {
            config.auth.jwt_secret = secret;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_round_trips_with_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [auth]
            jwt_secret = "file-secret"

            [services]
            meals_url = "http://meals.internal:4003"
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.jwt_secret, "file-secret");
        assert_eq!(config.services.meals_url, "http://meals.internal:4003");
        // Untouched sections keep their defaults.
        assert_eq!(config.services.auth_url, "http://localhost:4001");
        assert_eq!(config.rate_limit.auth.max_requests, 100);
        assert_eq!(config.rate_limit.auth.skip_path_suffixes, vec!["/me"]);
        assert_eq!(config.timeouts.upstream_secs, 30);
    }

    #[test]
    fn validation_failure_lists_every_error() {
        let config: GatewayConfig =
            toml::from_str("[services]\nfood_url = \"nope\"").unwrap();
        let err = finish(config);
        match err {
            Err(ConfigError::Validation(failure)) => {
                let rendered = failure.to_string();
                assert!(rendered.contains("food_url"));
            }
            other => panic!("expected validation failure, got {:?}", other.map(|_| ())),
        }
    }
}
