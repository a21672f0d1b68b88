//! Configuration Builder
//!
//! Fluent builder for UMA client configuration.

use std::time::Duration;

use crate::error::{ConfigurationError, UmaError};
use crate::types::{UmaConfig, UnknownErrorPolicy};

/// UMA configuration builder.
pub struct UmaConfigBuilder {
    config: UmaConfig,
}

impl UmaConfigBuilder {
    /// Create new configuration builder with default values.
    pub fn new() -> Self {
        Self {
            config: UmaConfig::default(),
        }
    }

    /// Set maximum token endpoint round trips per negotiation.
    pub fn max_iterations(mut self, max_iterations: u32) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set handling of unrecognized error codes.
    pub fn unknown_error_policy(mut self, policy: UnknownErrorPolicy) -> Self {
        self.config.unknown_error_policy = policy;
        self
    }

    /// Fail on unrecognized error codes instead of gathering claims.
    pub fn fail_fast(self) -> Self {
        self.unknown_error_policy(UnknownErrorPolicy::FailFast)
    }

    /// Set discovery document cache TTL.
    pub fn metadata_cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.metadata_cache_ttl = ttl;
        self
    }

    /// Set lifetime assumed for tokens issued without `expires_in`.
    pub fn default_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.config.default_token_lifetime = lifetime;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<UmaConfig, UmaError> {
        if self.config.max_iterations == 0 {
            return Err(UmaError::Configuration(ConfigurationError::InvalidConfig {
                message: "max_iterations must be at least 1".to_string(),
            }));
        }

        if self.config.timeout.is_zero() {
            return Err(UmaError::Configuration(ConfigurationError::InvalidConfig {
                message: "timeout must be greater than zero".to_string(),
            }));
        }

        Ok(self.config)
    }
}

impl Default for UmaConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a new UMA configuration builder.
pub fn uma_config() -> UmaConfigBuilder {
    UmaConfigBuilder::new()
}
