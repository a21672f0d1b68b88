//! Credential Types
//!
//! Bearer credentials held by a session and the access grants that back
//! them.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::types::TokenResponse;

/// A credential usable against a resource server.
///
/// Sessions never mutate a credential; a newer one replaces it.
#[derive(Clone)]
pub struct Credential {
    scheme: String,
    issuer: Url,
    token: SecretString,
    expiration: DateTime<Utc>,
    principal: Option<Url>,
    proof_thumbprint: Option<String>,
}

impl Credential {
    /// Create new credential.
    pub fn new(
        scheme: impl Into<String>,
        issuer: Url,
        token: impl Into<String>,
        expiration: DateTime<Utc>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            issuer,
            token: SecretString::new(token.into()),
            expiration,
            principal: None,
            proof_thumbprint: None,
        }
    }

    /// Build from a negotiated token response, expiring `expires_in`
    /// seconds from `now`. `default_lifetime` applies when the server sent
    /// no expiry.
    pub fn from_token_response(
        response: &TokenResponse,
        issuer: Url,
        now: DateTime<Utc>,
        default_lifetime: std::time::Duration,
    ) -> Self {
        let lifetime = match response.expires_in {
            Some(secs) => Duration::try_seconds(i64::try_from(secs).unwrap_or(i64::MAX)),
            None => Duration::from_std(default_lifetime).ok(),
        };
        let expiration = lifetime
            .and_then(|l| now.checked_add_signed(l))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self::new(
            response.token_type.clone(),
            issuer,
            response.access_token.clone(),
            expiration,
        )
    }

    pub fn with_principal(mut self, principal: Option<Url>) -> Self {
        self.principal = principal;
        self
    }

    pub fn with_proof_thumbprint(mut self, jkt: Option<String>) -> Self {
        self.proof_thumbprint = jkt;
        self
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn issuer(&self) -> &Url {
        &self.issuer
    }

    /// Token value.
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }

    pub fn expiration(&self) -> DateTime<Utc> {
        self.expiration
    }

    pub fn principal(&self) -> Option<&Url> {
        self.principal.as_ref()
    }

    /// DPoP key thumbprint bound to this credential.
    pub fn proof_thumbprint(&self) -> Option<&str> {
        self.proof_thumbprint.as_deref()
    }

    /// Check whether the credential is still valid at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration > now
    }

    /// Check if credential is expired.
    pub fn is_expired(&self) -> bool {
        !self.is_valid_at(Utc::now())
    }

    /// Format as Authorization header value.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.scheme, self.token.expose_secret())
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("scheme", &self.scheme)
            .field("issuer", &self.issuer.as_str())
            .field("token", &"[REDACTED]")
            .field("expiration", &self.expiration)
            .field("principal", &self.principal.as_ref().map(Url::as_str))
            .field("proof_thumbprint", &self.proof_thumbprint)
            .finish()
    }
}

/// A pre-issued access grant.
///
/// Grants are produced and parsed elsewhere; this crate only reads them.
#[derive(Clone, Debug)]
pub struct AccessGrant {
    /// Grant identifier.
    pub identifier: Url,
    /// Issuing service.
    pub issuer: Url,
    /// Resources the grant covers.
    pub resources: Vec<Url>,
    /// Expiration time.
    pub expiration: DateTime<Utc>,
    /// Agent the grant was issued to.
    pub recipient: Option<Url>,
    /// Agent that issued the grant.
    pub grantor: Option<Url>,
    /// Access modes, e.g. `Read`.
    pub modes: Vec<String>,
    /// Purposes the access is granted for.
    pub purposes: Vec<String>,
    /// Serialized credential as received.
    pub raw: String,
}

impl AccessGrant {
    /// Create a grant with no resources, modes or purposes.
    pub fn new(
        identifier: Url,
        issuer: Url,
        expiration: DateTime<Utc>,
        raw: impl Into<String>,
    ) -> Self {
        Self {
            identifier,
            issuer,
            resources: Vec::new(),
            expiration,
            recipient: None,
            grantor: None,
            modes: Vec::new(),
            purposes: Vec::new(),
            raw: raw.into(),
        }
    }

    /// Add a covered resource.
    pub fn with_resource(mut self, resource: Url) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn with_recipient(mut self, recipient: Url) -> Self {
        self.recipient = Some(recipient);
        self
    }

    pub fn with_grantor(mut self, grantor: Url) -> Self {
        self.grantor = Some(grantor);
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.modes.push(mode.into());
        self
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purposes.push(purpose.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn issuer() -> Url {
        Url::parse("https://as.example").unwrap()
    }

    #[test]
    fn test_from_token_response() {
        let response = TokenResponse {
            access_token: "AT1".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: Some(300),
            scope: None,
            extra: HashMap::new(),
        };
        let now = Utc::now();
        let credential = Credential::from_token_response(
            &response,
            issuer(),
            now,
            std::time::Duration::from_secs(60),
        );

        assert_eq!(credential.scheme(), "Bearer");
        assert_eq!(credential.token(), "AT1");
        assert_eq!(credential.expiration(), now + Duration::seconds(300));
        assert_eq!(credential.authorization_header(), "Bearer AT1");
    }

    #[test]
    fn test_default_lifetime_applies_without_expires_in() {
        let response = TokenResponse {
            access_token: "AT1".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: None,
            scope: None,
            extra: HashMap::new(),
        };
        let now = Utc::now();
        let credential = Credential::from_token_response(
            &response,
            issuer(),
            now,
            std::time::Duration::from_secs(60),
        );
        assert_eq!(credential.expiration(), now + Duration::seconds(60));
    }

    #[test]
    fn test_validity() {
        let now = Utc::now();
        let credential = Credential::new("Bearer", issuer(), "t", now + Duration::seconds(10));
        assert!(credential.is_valid_at(now));
        assert!(!credential.is_valid_at(now + Duration::seconds(10)));
        assert!(!credential.is_expired());
    }

    #[test]
    fn test_debug_redacts_token() {
        let credential = Credential::new("Bearer", issuer(), "super-secret", Utc::now())
            .with_proof_thumbprint(Some("jkt".to_string()));
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("jkt"));
    }
}
