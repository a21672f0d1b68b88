//! UMA Client
//!
//! High-level UMA client combining discovery, negotiation and sessions.

use std::sync::Arc;
use url::Url;

use crate::core::{
    create_transport, DefaultMetadataClient, HttpTransport, MetadataClient, ReqwestHttpTransport,
};
use crate::error::UmaError;
use crate::negotiation::{ClaimHandlerRegistry, ClaimResolver, NegotiationEngine};
use crate::session::{AccessGrantSession, CredentialUpgrade, Session, SessionResolver};
use crate::telemetry::{Logger, TracingLogger};
use crate::types::{AccessGrant, Metadata, TokenRequest, TokenResponse, UmaConfig};

/// UMA client.
pub struct UmaClient<T: HttpTransport = ReqwestHttpTransport> {
    config: UmaConfig,
    transport: Arc<T>,
    metadata: Arc<DefaultMetadataClient<T>>,
    engine: Arc<NegotiationEngine<T>>,
    logger: Arc<dyn Logger>,
}

impl UmaClient<ReqwestHttpTransport> {
    /// Create a new UMA client over a reqwest transport.
    pub fn new(config: UmaConfig) -> Result<Self, UmaError> {
        let transport = create_transport(Some(config.timeout))?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: HttpTransport + 'static> UmaClient<T> {
    /// Create a client with a custom transport.
    pub fn with_transport(config: UmaConfig, transport: T) -> Self {
        let transport = Arc::new(transport);
        let logger: Arc<dyn Logger> = Arc::new(TracingLogger);

        let metadata = Arc::new(
            DefaultMetadataClient::with_cache_ttl(transport.clone(), config.metadata_cache_ttl)
                .with_timeout(config.timeout),
        );
        let engine = Arc::new(
            NegotiationEngine::new(transport.clone(), config.clone()).with_logger(logger.clone()),
        );

        Self {
            config,
            transport,
            metadata,
            engine,
            logger,
        }
    }

    /// Replace the logger used by negotiations and sessions.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.engine = Arc::new(
            NegotiationEngine::new(self.transport.clone(), self.config.clone())
                .with_logger(logger.clone()),
        );
        self.logger = logger;
        self
    }

    /// Get the UMA configuration.
    pub fn config(&self) -> &UmaConfig {
        &self.config
    }

    /// Discovery document for an authorization server.
    pub async fn metadata(&self, authorization_server: &Url) -> Result<Metadata, UmaError> {
        self.metadata.fetch(authorization_server).await
    }

    /// Negotiate a token with the configured round limit.
    pub async fn negotiate(
        &self,
        token_endpoint: &Url,
        request: TokenRequest,
        resolver: &dyn ClaimResolver,
    ) -> Result<TokenResponse, UmaError> {
        self.engine.negotiate(token_endpoint, request, resolver).await
    }

    /// Negotiate a token sending at most `max_iterations` requests.
    pub async fn negotiate_with_limit(
        &self,
        token_endpoint: &Url,
        request: TokenRequest,
        resolver: &dyn ClaimResolver,
        max_iterations: u32,
    ) -> Result<TokenResponse, UmaError> {
        self.engine
            .negotiate_with_limit(token_endpoint, request, resolver, max_iterations)
            .await
    }

    /// Open a session over `upstream` holding `grants`.
    ///
    /// Each session gets its own grant index and token cache.
    pub fn session(
        &self,
        upstream: Arc<dyn Session>,
        grants: Vec<AccessGrant>,
        registry: ClaimHandlerRegistry,
    ) -> SessionResolver<T> {
        let metadata: Arc<dyn MetadataClient> = self.metadata.clone();
        SessionResolver::new(
            Arc::new(AccessGrantSession::new(upstream, grants)),
            CredentialUpgrade::new(self.engine.clone(), metadata),
            registry,
            self.logger.clone(),
        )
    }
}

/// Create a UMA client over a reqwest transport.
pub fn uma_client(config: UmaConfig) -> Result<UmaClient, UmaError> {
    UmaClient::new(config)
}
