//! Claim Types
//!
//! Claim tokens and the `need_info` requirements an authorization server
//! sends back when it wants more claims.

use serde_json::{Map, Value};
use url::Url;

use crate::error::ErrorResponse;

/// A client-supplied claim and the format URI describing it.
#[derive(Clone, PartialEq, Eq)]
pub struct ClaimToken {
    token: String,
    format: String,
}

impl ClaimToken {
    pub fn new(token: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            format: format.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Claim token format, sent as `claim_token_format`.
    pub fn format(&self) -> &str {
        &self.format
    }
}

impl std::fmt::Debug for ClaimToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimToken")
            .field("token", &"[REDACTED]")
            .field("format", &self.format)
            .finish()
    }
}

/// One entry of a `required_claims` array.
///
/// Values are read through string and string-set projections; anything of
/// another JSON type reads as absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequiredClaims {
    data: Map<String, Value>,
}

impl RequiredClaims {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    /// Acceptable claim token formats. Empty means any.
    pub fn claim_token_formats(&self) -> Vec<&str> {
        self.values("claim_token_format")
    }

    /// Acceptable issuers. Empty means any.
    pub fn issuers(&self) -> Vec<&str> {
        self.values("issuer")
    }

    pub fn claim_type(&self) -> Option<&str> {
        self.value("claim_type")
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.value("friendly_name")
    }

    pub fn name(&self) -> Option<&str> {
        self.value("name")
    }

    /// Extension property read as a single string.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.value(name)
    }

    /// Extension property read as a string set.
    pub fn properties(&self, name: &str) -> Vec<&str> {
        self.values(name)
    }

    fn value(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    fn values(&self, key: &str) -> Vec<&str> {
        match self.data.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

/// Claims the authorization server needs before it will issue a token.
#[derive(Clone, Debug, PartialEq)]
pub struct NeedInfo {
    ticket: String,
    redirect_user: Option<Url>,
    required_claims: Vec<RequiredClaims>,
}

impl NeedInfo {
    pub fn new(
        ticket: impl Into<String>,
        redirect_user: Option<Url>,
        required_claims: Vec<RequiredClaims>,
    ) -> Self {
        Self {
            ticket: ticket.into(),
            redirect_user,
            required_claims,
        }
    }

    /// Build from an error response. `None` if the response carries no
    /// ticket to continue with.
    pub fn from_error_response(response: &ErrorResponse) -> Option<Self> {
        let ticket = response.ticket.as_deref().filter(|t| !t.is_empty())?;
        let required_claims = response
            .required_claims
            .iter()
            .cloned()
            .map(RequiredClaims::new)
            .collect();

        Some(Self::new(
            ticket,
            response.redirect_user.clone(),
            required_claims,
        ))
    }

    /// Ticket to retry with.
    pub fn ticket(&self) -> &str {
        &self.ticket
    }

    /// Redirect URI for interactive claims gathering.
    pub fn redirect_user(&self) -> Option<&Url> {
        self.redirect_user.as_ref()
    }

    /// Requirements in server order.
    pub fn required_claims(&self) -> &[RequiredClaims] {
        &self.required_claims
    }
}
