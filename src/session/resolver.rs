//! Session Resolver
//!
//! Per-session front door: resolves claim credentials through the grant
//! session and turns UMA challenges into cached bearer credentials.

use std::sync::Arc;
use url::Url;

use crate::core::HttpTransport;
use crate::error::{SessionError, UmaResult};
use crate::negotiation::ClaimHandlerRegistry;
use crate::session::{AccessGrantSession, CredentialUpgrade};
use crate::telemetry::{Logger, UmaLogContext};
use crate::token::TokenCache;
use crate::types::{Challenge, Credential};

/// Grant lookups and cache keys need a scheme, host and path to compare.
fn check_resource(resource: &Url) -> UmaResult<()> {
    if resource.cannot_be_a_base() || resource.host_str().is_none() {
        return Err(SessionError::InvalidResource {
            uri: resource.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Resolves and caches credentials for one session.
///
/// The token cache and grant index live and die with the resolver.
pub struct SessionResolver<T: HttpTransport> {
    session: Arc<AccessGrantSession>,
    upgrade: CredentialUpgrade<T>,
    registry: ClaimHandlerRegistry,
    cache: TokenCache,
    logger: Arc<dyn Logger>,
}

impl<T: HttpTransport> SessionResolver<T> {
    pub fn new(
        session: Arc<AccessGrantSession>,
        upgrade: CredentialUpgrade<T>,
        registry: ClaimHandlerRegistry,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            session,
            upgrade,
            registry,
            cache: TokenCache::new(),
            logger,
        }
    }

    pub fn session(&self) -> &Arc<AccessGrantSession> {
        &self.session
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Credential of a capability for a resource.
    pub async fn resolve(&self, capability: &str, resource: &Url) -> UmaResult<Option<Credential>> {
        check_resource(resource)?;
        self.session.resolve(capability, resource).await
    }

    /// Cached bearer credential for a resource, if still valid.
    pub fn from_cache(&self, resource: &Url) -> Option<Credential> {
        self.cache.get(resource)
    }

    /// Bearer credential for a resource that answered with `challenge`.
    ///
    /// A valid cached credential is returned as is; otherwise the challenge
    /// is negotiated and the result cached under the resource.
    pub async fn authenticate(&self, challenge: &Challenge, resource: &Url) -> UmaResult<Credential> {
        check_resource(resource)?;

        let context = UmaLogContext::new()
            .operation("authenticate")
            .resource(resource.as_str())
            .extra("session_id", self.session.id().to_string());

        if let Some(cached) = self.cache.get(resource) {
            self.logger.debug("Using cached credential", &context);
            return Ok(cached);
        }

        let credential = self
            .upgrade
            .upgrade(challenge, &*self.session, resource, &self.registry)
            .await?;

        self.cache.put(resource, credential.clone());
        self.logger.info("Cached negotiated credential", &context);

        Ok(credential)
    }

    /// Forget every negotiated credential, e.g. after a grant is revoked.
    pub fn reset(&self) {
        self.cache.invalidate_all();
        self.logger.info(
            "Session reset",
            &UmaLogContext::new()
                .operation("reset")
                .extra("session_id", self.session.id().to_string()),
        );
    }
}
