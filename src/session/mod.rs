//! Sessions
//!
//! A session supplies credentials for resources. [`AccessGrantSession`]
//! layers locally held access grants over an upstream session, and
//! [`SessionResolver`] exchanges UMA challenges for bearer credentials and
//! caches them.

pub mod grant_session;
pub mod index;
pub mod resolver;
pub mod upgrade;

use async_trait::async_trait;
use url::Url;

use crate::error::UmaResult;
use crate::types::{Credential, UMA_SCHEME};

pub use grant_session::{grant_credential, AccessGrantSession};
pub use index::{is_ancestor, ResourceCredentialIndex};
pub use resolver::SessionResolver;
pub use upgrade::CredentialUpgrade;

/// Source of credentials for a principal.
#[async_trait]
pub trait Session: Send + Sync {
    /// Principal the session acts for.
    fn principal(&self) -> Option<Url>;

    /// Authentication schemes the session can answer.
    fn supported_schemes(&self) -> Vec<String>;

    /// Credential of the given capability usable for a resource.
    async fn credential(&self, capability: &str, resource: &Url) -> UmaResult<Option<Credential>>;

    /// Proof key thumbprint for one of the given DPoP algorithms.
    fn select_thumbprint(&self, _algorithms: &[String]) -> Option<String> {
        None
    }
}

/// Session with no identity and no credentials.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnonymousSession;

impl AnonymousSession {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Session for AnonymousSession {
    fn principal(&self) -> Option<Url> {
        None
    }

    fn supported_schemes(&self) -> Vec<String> {
        vec![UMA_SCHEME.to_string()]
    }

    async fn credential(&self, _capability: &str, _resource: &Url) -> UmaResult<Option<Credential>> {
        Ok(None)
    }
}
