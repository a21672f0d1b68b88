//! Credential Upgrade
//!
//! Exchanges a UMA challenge for a bearer credential in at most two
//! negotiations. The first presents the session's ID token when the
//! authorization server accepts one. If the token that comes back carries
//! no scope, and the server also accepts verifiable credentials, and the
//! session holds one for the resource, a second negotiation presents that
//! credential with the first access token as the RPT.
//!
//! This is a fixed two-step policy, not a general planner over claim types.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::core::{HttpTransport, MetadataClient};
use crate::error::UmaResult;
use crate::negotiation::{ClaimResolver, NegotiationEngine};
use crate::session::Session;
use crate::types::{
    Challenge, ClaimToken, Credential, TokenRequest, TokenResponse, ID_TOKEN,
    VERIFIABLE_CREDENTIAL,
};

/// Two-phase challenge-to-credential exchange.
pub struct CredentialUpgrade<T: HttpTransport> {
    engine: Arc<NegotiationEngine<T>>,
    metadata: Arc<dyn MetadataClient>,
    default_token_lifetime: Duration,
}

impl<T: HttpTransport> CredentialUpgrade<T> {
    pub fn new(engine: Arc<NegotiationEngine<T>>, metadata: Arc<dyn MetadataClient>) -> Self {
        let default_token_lifetime = engine.config().default_token_lifetime;
        Self {
            engine,
            metadata,
            default_token_lifetime,
        }
    }

    /// Answer `challenge` for `resource` on behalf of `session`.
    pub async fn upgrade(
        &self,
        challenge: &Challenge,
        session: &dyn Session,
        resource: &Url,
        resolver: &dyn ClaimResolver,
    ) -> UmaResult<Credential> {
        let uma = challenge.validate_uma()?;
        let metadata = self.metadata.fetch(&uma.authorization_server).await?;

        let id_credential = if metadata.supports_id_token() {
            session.credential(ID_TOKEN, resource).await?
        } else {
            None
        };

        let mut request = TokenRequest::new(uma.ticket.clone());
        if let Some(id_token) = &id_credential {
            request = request.with_claim_token(ClaimToken::new(id_token.token(), ID_TOKEN));
        }

        let first = self
            .engine
            .negotiate(&metadata.token_endpoint, request, resolver)
            .await?;

        let token = if first.has_empty_scope() && metadata.supports_verifiable_credential() {
            match session.credential(VERIFIABLE_CREDENTIAL, resource).await? {
                Some(vc) => {
                    tracing::debug!(
                        authorization_server = %uma.authorization_server,
                        resource = %resource,
                        "Empty scope, retrying with verifiable credential"
                    );
                    let request = TokenRequest::new(uma.ticket.clone())
                        .with_requesting_party_token(first.access_token.clone())
                        .with_claim_token(ClaimToken::new(vc.token(), VERIFIABLE_CREDENTIAL));
                    self.engine
                        .negotiate(&metadata.token_endpoint, request, resolver)
                        .await?
                }
                None => first,
            }
        } else {
            first
        };

        Ok(self.credential(
            &token,
            uma.authorization_server,
            id_credential.as_ref(),
            session,
            &metadata.dpop_signing_alg_values_supported,
        ))
    }

    fn credential(
        &self,
        token: &TokenResponse,
        issuer: Url,
        id_credential: Option<&Credential>,
        session: &dyn Session,
        dpop_algorithms: &[String],
    ) -> Credential {
        let principal = id_credential
            .and_then(|c| c.principal().cloned())
            .or_else(|| session.principal());
        let thumbprint = id_credential
            .and_then(|c| c.proof_thumbprint().map(str::to_string))
            .or_else(|| session.select_thumbprint(dpop_algorithms));

        Credential::from_token_response(token, issuer, Utc::now(), self.default_token_lifetime)
            .with_principal(principal)
            .with_proof_thumbprint(thumbprint)
    }
}
