//! Configuration Types
//!
//! UMA client configuration and authorization server metadata.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Claim token format / UMA profile for OpenID Connect ID tokens.
pub const ID_TOKEN: &str = "http://openid.net/specs/openid-connect-core-1_0.html#IDToken";

/// Claim token format / UMA profile for verifiable credentials.
pub const VERIFIABLE_CREDENTIAL: &str = "https://www.w3.org/TR/vc-data-model/#json-ld";

/// Default configuration values.
pub const DEFAULT_MAX_ITERATIONS: u32 = 5;
pub const DEFAULT_TIMEOUT_MS: u64 = 30000;
pub const DEFAULT_METADATA_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 300;

/// How the negotiation engine treats error codes it does not recognize.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownErrorPolicy {
    /// Enter claims gathering as if the server sent `need_info`.
    #[default]
    TreatAsNeedInfo,
    /// Fail with a protocol error.
    FailFast,
}

/// UMA client configuration.
#[derive(Clone, Debug)]
pub struct UmaConfig {
    /// Maximum token endpoint round trips per negotiation.
    pub max_iterations: u32,
    /// HTTP timeout.
    pub timeout: Duration,
    /// Handling of unrecognized token endpoint error codes.
    pub unknown_error_policy: UnknownErrorPolicy,
    /// How long discovery documents stay cached.
    pub metadata_cache_ttl: Duration,
    /// Lifetime assumed for tokens issued without `expires_in`.
    pub default_token_lifetime: Duration,
}

impl Default for UmaConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            unknown_error_policy: UnknownErrorPolicy::default(),
            metadata_cache_ttl: Duration::from_secs(DEFAULT_METADATA_CACHE_TTL_SECS),
            default_token_lifetime: Duration::from_secs(DEFAULT_TOKEN_LIFETIME_SECS),
        }
    }
}

/// UMA authorization server discovery document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Metadata {
    /// Issuer identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Url>,
    /// Token endpoint URL.
    pub token_endpoint: Url,
    /// JWKS URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<Url>,
    /// Supported DPoP signing algorithms.
    #[serde(default)]
    pub dpop_signing_alg_values_supported: Vec<String>,
    /// Supported grant types.
    #[serde(default)]
    pub grant_types_supported: Vec<String>,
    /// Supported UMA profiles.
    #[serde(default)]
    pub uma_profiles_supported: Vec<String>,
}

impl Metadata {
    /// Check whether a profile URI is advertised.
    pub fn supports_profile(&self, profile: &str) -> bool {
        self.uma_profiles_supported.iter().any(|p| p == profile)
    }

    pub fn supports_id_token(&self) -> bool {
        self.supports_profile(ID_TOKEN)
    }

    pub fn supports_verifiable_credential(&self) -> bool {
        self.supports_profile(VERIFIABLE_CREDENTIAL)
    }

    /// First server-supported DPoP algorithm the client also supports.
    pub fn select_dpop_algorithm(&self, client_supported: &[String]) -> Option<&str> {
        self.dpop_signing_alg_values_supported
            .iter()
            .find(|alg| client_supported.contains(alg))
            .map(String::as_str)
    }
}
