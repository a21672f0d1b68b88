//! UMA Error Types
//!
//! Error hierarchy for discovery, claims-gathering negotiation and session
//! credential resolution, plus the classifier for authorization server
//! error codes.

use std::time::Duration;
use thiserror::Error;

/// Root error type for UMA integration.
#[derive(Error, Debug)]
pub enum UmaError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Negotiation error: {0}")]
    Negotiation(#[from] NegotiationError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

impl UmaError {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "UMA_CONFIG",
            Self::Negotiation(e) => e.error_code(),
            Self::Network(_) => "UMA_NETWORK",
            Self::Protocol(_) => "UMA_PROTOCOL",
            Self::Session(_) => "UMA_SESSION",
        }
    }

    /// Check if error is retryable.
    ///
    /// Only transport failures qualify. Every negotiation outcome that
    /// reaches the caller is final for the ticket it was issued against.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Check if the error ends a negotiation.
    pub fn is_terminal(&self) -> bool {
        !self.is_retryable()
    }

    /// HTTP status attached to the error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Protocol(e) => e.status(),
            _ => None,
        }
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Invalid challenge for UMA authentication: {message}")]
    InvalidChallenge { message: String },

    #[error("Discovery failed: {message}")]
    DiscoveryFailed { message: String },
}

/// Negotiation outcome error.
#[derive(Error, Debug)]
pub enum NegotiationError {
    #[error("Request denied: {message}")]
    RequestDenied { message: String },

    #[error("Invalid grant: {message}")]
    InvalidGrant { message: String },

    #[error("Invalid scope: {message}")]
    InvalidScope { message: String },

    #[error("Claim gathering stages exceeded configured maximum of {max_iterations}")]
    IterationLimitExceeded { max_iterations: u32 },

    #[error("Claim unavailable for {claim_type}: {message}")]
    ClaimUnavailable { claim_type: String, message: String },
}

impl NegotiationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::RequestDenied { .. } => "UMA_REQUEST_DENIED",
            Self::InvalidGrant { .. } => "UMA_INVALID_GRANT",
            Self::InvalidScope { .. } => "UMA_INVALID_SCOPE",
            Self::IterationLimitExceeded { .. } => "UMA_ITERATION_LIMIT",
            Self::ClaimUnavailable { .. } => "UMA_CLAIM_UNAVAILABLE",
        }
    }
}

/// Network/transport error.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },
}

impl NetworkError {
    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. } | Self::Timeout { .. })
    }
}

/// Protocol/response parsing error.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid JSON in HTTP {status} response: {message}")]
    InvalidJson { status: u16, message: String },

    #[error("Missing required field {field} in HTTP {status} response")]
    MissingField { status: u16, field: String },

    #[error("Unrecognized error code {code} in HTTP {status} response")]
    UnrecognizedError { status: u16, code: String },

    #[error("Unexpected redirect to: {location}")]
    UnexpectedRedirect { location: String },

    #[error("Response too large: {size} bytes")]
    ResponseTooLarge { size: usize },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },
}

impl ProtocolError {
    /// HTTP status of the offending response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::InvalidJson { status, .. }
            | Self::MissingField { status, .. }
            | Self::UnrecognizedError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Session-level error.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Resource URI has no hierarchical authority: {uri}")]
    InvalidResource { uri: String },
}

/// Result type for UMA operations.
pub type UmaResult<T> = Result<T, UmaError>;

/// UMA error codes returned by the token endpoint.
pub const REQUEST_DENIED: &str = "request_denied";
pub const INVALID_GRANT: &str = "invalid_grant";
pub const INVALID_SCOPE: &str = "invalid_scope";
pub const NEED_INFO: &str = "need_info";

/// Error response body from the token endpoint.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub ticket: Option<String>,
    #[serde(default)]
    pub redirect_user: Option<url::Url>,
    #[serde(default)]
    pub required_claims: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// Classification of a token endpoint error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    RequestDenied,
    InvalidGrant,
    InvalidScope,
    NeedInfo,
    Unrecognized,
}

impl ErrorClass {
    /// Classify an error code.
    pub fn from_code(code: &str) -> Self {
        match code {
            REQUEST_DENIED => Self::RequestDenied,
            INVALID_GRANT => Self::InvalidGrant,
            INVALID_SCOPE => Self::InvalidScope,
            NEED_INFO => Self::NeedInfo,
            _ => Self::Unrecognized,
        }
    }

    /// Whether this class ends the negotiation.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::RequestDenied | Self::InvalidGrant | Self::InvalidScope
        )
    }
}

/// Map a terminal error response to its negotiation error.
///
/// Returns `None` for `need_info` and unrecognized codes; the caller decides
/// whether those enter claims gathering.
pub fn map_negotiation_error(response: &ErrorResponse) -> Option<NegotiationError> {
    let description = |fallback: &str| {
        response
            .error_description
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    };

    match ErrorClass::from_code(&response.error) {
        ErrorClass::RequestDenied => Some(NegotiationError::RequestDenied {
            message: description("The client is not authorized for the requested permissions"),
        }),
        ErrorClass::InvalidGrant => Some(NegotiationError::InvalidGrant {
            message: description("Invalid grant provided"),
        }),
        ErrorClass::InvalidScope => Some(NegotiationError::InvalidScope {
            message: description("Invalid scope provided"),
        }),
        ErrorClass::NeedInfo | ErrorClass::Unrecognized => None,
    }
}

/// Parse error response from HTTP body.
pub fn parse_error_response(body: &str) -> Result<ErrorResponse, serde_json::Error> {
    serde_json::from_str(body)
}
