//! Token Types
//!
//! UMA token endpoint request and response definitions.

use serde::Deserialize;
use std::collections::HashMap;
use url::form_urlencoded;

use crate::types::ClaimToken;

/// UMA grant type sent with every token request.
pub const UMA_TICKET_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:uma-ticket";

/// Token request for one negotiation round.
///
/// A fresh request is built for every round; nothing mutates a request once
/// it has been sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenRequest {
    ticket: String,
    pct: Option<String>,
    rpt: Option<String>,
    claim_token: Option<ClaimToken>,
    scopes: Vec<String>,
}

impl TokenRequest {
    /// Create a request for a permission ticket.
    pub fn new(ticket: impl Into<String>) -> Self {
        Self {
            ticket: ticket.into(),
            pct: None,
            rpt: None,
            claim_token: None,
            scopes: Vec::new(),
        }
    }

    /// Attach a persisted claim token.
    pub fn with_persisted_claim_token(mut self, pct: impl Into<String>) -> Self {
        self.pct = Some(pct.into());
        self
    }

    /// Attach a requesting party token.
    pub fn with_requesting_party_token(mut self, rpt: impl Into<String>) -> Self {
        self.rpt = Some(rpt.into());
        self
    }

    /// Attach a claim token.
    pub fn with_claim_token(mut self, claim_token: ClaimToken) -> Self {
        self.claim_token = Some(claim_token);
        self
    }

    /// Set requested scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn ticket(&self) -> &str {
        &self.ticket
    }

    pub fn persisted_claim_token(&self) -> Option<&str> {
        self.pct.as_deref()
    }

    pub fn requesting_party_token(&self) -> Option<&str> {
        self.rpt.as_deref()
    }

    pub fn claim_token(&self) -> Option<&ClaimToken> {
        self.claim_token.as_ref()
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Encode as an `application/x-www-form-urlencoded` body.
    pub fn to_form_body(&self) -> String {
        let mut form = form_urlencoded::Serializer::new(String::new());
        form.append_pair("grant_type", UMA_TICKET_GRANT_TYPE);
        form.append_pair("ticket", &self.ticket);

        if let Some(pct) = &self.pct {
            form.append_pair("pct", pct);
        }
        if let Some(rpt) = &self.rpt {
            form.append_pair("rpt", rpt);
        }
        if let Some(claim_token) = &self.claim_token {
            form.append_pair("claim_token", claim_token.token());
            form.append_pair("claim_token_format", claim_token.format());
        }
        if !self.scopes.is_empty() {
            form.append_pair("scope", &self.scopes.join(" "));
        }

        form.finish()
    }
}

/// Successful token endpoint response.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Token type (usually "Bearer").
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Expires in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
    /// Additional fields.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl TokenResponse {
    /// Granted scopes, split on whitespace.
    pub fn scopes(&self) -> Vec<&str> {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// True when the server granted no scope at all.
    pub fn has_empty_scope(&self) -> bool {
        self.scopes().is_empty()
    }
}
