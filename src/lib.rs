//! UMA Integration Module
//!
//! User-Managed Access 2.0 client: claims-gathering negotiation against an
//! authorization server, and session-scoped resolution of the credentials
//! a client presents to protected resources.
//!
//! # Features
//!
//! - UMA discovery (`/.well-known/uma2-configuration`)
//! - `WWW-Authenticate` challenge parsing
//! - Iterative `need_info` negotiation with pluggable claim handlers
//! - ID token to verifiable credential upgrade for under-scoped tokens
//! - Access grant lookup by resource hierarchy
//! - Per-session bearer token cache
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use uma_integration::{uma_config, AnonymousSession, Challenge, ClaimHandlerRegistry, UmaClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = uma_config().max_iterations(3).build()?;
//!     let client = UmaClient::new(config)?;
//!
//!     let session = client.session(
//!         Arc::new(AnonymousSession::new()),
//!         Vec::new(),
//!         ClaimHandlerRegistry::new(),
//!     );
//!
//!     // Value of the resource server's WWW-Authenticate header
//!     let challenges = Challenge::parse_all(r#"UMA as_uri="https://as.example", ticket="t1""#)?;
//!     let resource = url::Url::parse("https://pod.example/data.ttl")?;
//!     let credential = session.authenticate(&challenges[0], &resource).await?;
//!
//!     println!("Authorization: {}", credential.authorization_header());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: UMA data structures and configuration types
//! - `error`: Error hierarchy and token endpoint error classification
//! - `core`: HTTP transport and discovery
//! - `negotiation`: Negotiation engine and claim gathering handlers
//! - `token`: Bearer token cache
//! - `session`: Sessions, grant index, credential upgrade and resolver
//! - `builders`: Fluent builders for configuration
//! - `telemetry`: Structured logging
//! - `client`: High-level UMA client combining all functionality

pub mod builders;
pub mod client;
pub mod core;
pub mod error;
pub mod negotiation;
pub mod session;
pub mod telemetry;
pub mod token;
pub mod types;

// Re-export main client
pub use client::{uma_client, UmaClient};

// Re-export builders
pub use builders::{uma_config, UmaConfigBuilder};

// Re-export errors
pub use error::{
    map_negotiation_error, parse_error_response, ConfigurationError, ErrorClass, ErrorResponse,
    NegotiationError, NetworkError, ProtocolError, SessionError, UmaError, UmaResult,
};

// Re-export types
pub use types::{
    // Config
    Metadata, UmaConfig, UnknownErrorPolicy, ID_TOKEN, VERIFIABLE_CREDENTIAL,
    // Token
    TokenRequest, TokenResponse, UMA_TICKET_GRANT_TYPE,
    // Claims
    ClaimToken, NeedInfo, RequiredClaims,
    // Challenge
    Challenge, UmaChallenge, UMA_SCHEME,
    // Credential
    AccessGrant, Credential,
};

// Re-export core components
pub use crate::core::{
    // Transport
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport,
    ReqwestHttpTransport,
    // Discovery
    DefaultMetadataClient, MetadataClient, MockMetadataClient,
};

// Re-export negotiation
pub use negotiation::{
    claim_resolver_fn, is_compatible, ClaimGatheringHandler, ClaimHandlerRegistry, ClaimResolver,
    MockClaimHandler, NegotiationEngine, SessionClaimHandler, StaticClaimHandler,
};

// Re-export token cache
pub use token::TokenCache;

// Re-export sessions
pub use session::{
    AccessGrantSession, AnonymousSession, CredentialUpgrade, ResourceCredentialIndex, Session,
    SessionResolver,
};

// Re-export telemetry
pub use telemetry::{
    create_in_memory_logger, create_tracing_logger, no_op_logger, InMemoryLogger, LogEntry,
    LogLevel, Logger, NoOpLogger, TracingLogger, UmaLogContext,
};
