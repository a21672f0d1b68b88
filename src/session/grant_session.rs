//! Access Grant Session
//!
//! Answers verifiable-credential requests from locally held access grants
//! and delegates everything else to an upstream session.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

use crate::error::UmaResult;
use crate::session::{ResourceCredentialIndex, Session};
use crate::types::{AccessGrant, Credential, VERIFIABLE_CREDENTIAL};

/// Wrap an access grant as a claim credential.
///
/// The token is the grant's serialized form, base64url encoded without
/// padding. Issuer and expiration come from the grant itself.
pub fn grant_credential(grant: &AccessGrant, principal: Option<Url>) -> Credential {
    Credential::new(
        "",
        grant.issuer.clone(),
        URL_SAFE_NO_PAD.encode(grant.raw.as_bytes()),
        grant.expiration,
    )
    .with_principal(principal)
}

/// Session backed by a fixed set of access grants.
pub struct AccessGrantSession {
    id: Uuid,
    upstream: Arc<dyn Session>,
    index: ResourceCredentialIndex,
}

impl AccessGrantSession {
    /// Create a session over `upstream` holding `grants`.
    pub fn new(upstream: Arc<dyn Session>, grants: impl IntoIterator<Item = AccessGrant>) -> Self {
        let index = ResourceCredentialIndex::new(grants);
        let id = Uuid::new_v4();
        tracing::debug!(session_id = %id, resources = index.len(), "Created access grant session");

        Self {
            id,
            upstream,
            index,
        }
    }

    /// Unique session identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn index(&self) -> &ResourceCredentialIndex {
        &self.index
    }

    pub fn upstream(&self) -> &Arc<dyn Session> {
        &self.upstream
    }

    /// Resolve a credential for a resource.
    ///
    /// Verifiable-credential requests covered by a held grant are answered
    /// with a freshly built credential; nothing here is cached. All other
    /// requests go to the upstream session.
    pub async fn resolve(&self, capability: &str, resource: &Url) -> UmaResult<Option<Credential>> {
        if capability == VERIFIABLE_CREDENTIAL {
            if let Some(grant) = self.index.lookup(resource) {
                tracing::debug!(
                    session_id = %self.id,
                    grant = %grant.identifier,
                    resource = %resource,
                    "Resolved access grant"
                );
                return Ok(Some(grant_credential(grant, self.upstream.principal())));
            }
        }

        self.upstream.credential(capability, resource).await
    }
}

#[async_trait]
impl Session for AccessGrantSession {
    fn principal(&self) -> Option<Url> {
        self.upstream.principal()
    }

    fn supported_schemes(&self) -> Vec<String> {
        self.upstream.supported_schemes()
    }

    async fn credential(&self, capability: &str, resource: &Url) -> UmaResult<Option<Credential>> {
        self.resolve(capability, resource).await
    }

    fn select_thumbprint(&self, algorithms: &[String]) -> Option<String> {
        self.upstream.select_thumbprint(algorithms)
    }
}
