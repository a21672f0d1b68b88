//! Challenge Types
//!
//! `WWW-Authenticate` challenges issued by a resource server, and the UMA
//! view of them.

use std::collections::HashMap;
use std::fmt;
use url::Url;

use crate::error::{ConfigurationError, UmaError};

/// UMA authentication scheme name.
pub const UMA_SCHEME: &str = "UMA";

const AS_URI: &str = "as_uri";
const TICKET: &str = "ticket";

/// An authentication challenge: scheme plus auth-params.
#[derive(Clone, Debug, Default)]
pub struct Challenge {
    scheme: String,
    parameters: HashMap<String, String>,
}

impl Challenge {
    /// Create a challenge with no parameters.
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            parameters: HashMap::new(),
        }
    }

    /// Create an UMA challenge.
    pub fn uma(authorization_server: &Url, ticket: impl Into<String>) -> Self {
        Self::new(UMA_SCHEME)
            .with_parameter(AS_URI, authorization_server.as_str())
            .with_parameter(TICKET, ticket)
    }

    /// Add a parameter. Names are case-insensitive.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn parameters(&self) -> &HashMap<String, String> {
        &self.parameters
    }

    /// Case-insensitive scheme comparison.
    pub fn is_scheme(&self, scheme: &str) -> bool {
        self.scheme.eq_ignore_ascii_case(scheme)
    }

    /// Parse every challenge in a `WWW-Authenticate` header value.
    pub fn parse_all(header: &str) -> Result<Vec<Challenge>, UmaError> {
        ChallengeParser::new(header).parse()
    }

    /// Check that this is a usable UMA challenge and extract its parts.
    pub fn validate_uma(&self) -> Result<UmaChallenge, UmaError> {
        if !self.is_scheme(UMA_SCHEME) {
            return Err(invalid_challenge(format!(
                "unexpected scheme {}",
                self.scheme
            )));
        }

        let as_uri = self
            .parameter(AS_URI)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| invalid_challenge("missing as_uri".to_string()))?;
        let authorization_server = Url::parse(as_uri)
            .map_err(|e| invalid_challenge(format!("as_uri {}: {}", as_uri, e)))?;

        let ticket = self
            .parameter(TICKET)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| invalid_challenge("missing ticket".to_string()))?;

        Ok(UmaChallenge {
            authorization_server,
            ticket: ticket.to_string(),
        })
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.scheme)?;
        let mut names: Vec<&String> = self.parameters.keys().collect();
        names.sort();
        for (i, name) in names.into_iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            let value = self.parameters[name].replace('\\', "\\\\").replace('"', "\\\"");
            write!(f, "{}{}=\"{}\"", sep, name, value)?;
        }
        Ok(())
    }
}

impl PartialEq for Challenge {
    fn eq(&self, other: &Self) -> bool {
        self.is_scheme(&other.scheme) && self.parameters == other.parameters
    }
}

impl Eq for Challenge {}

/// A validated UMA challenge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UmaChallenge {
    pub authorization_server: Url,
    pub ticket: String,
}

fn invalid_challenge(message: String) -> UmaError {
    UmaError::Configuration(ConfigurationError::InvalidChallenge { message })
}

struct ChallengeParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> ChallengeParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse(mut self) -> Result<Vec<Challenge>, UmaError> {
        let mut challenges = Vec::new();
        let mut current: Option<Challenge> = None;

        loop {
            self.skip(|c| c.is_ascii_whitespace() || c == ',');
            if self.peek().is_none() {
                break;
            }

            let token = self.token();
            if token.is_empty() {
                return Err(invalid_challenge(format!(
                    "unexpected character at offset {}",
                    self.pos
                )));
            }
            self.skip(|c| c == ' ' || c == '\t');

            if self.peek() != Some('=') {
                if let Some(done) = current.take() {
                    challenges.push(done);
                }
                current = Some(Challenge::new(token));
                continue;
            }

            self.bump();
            self.skip(|c| c == ' ' || c == '\t');

            // token68 padding, e.g. `Basic dXNlcg==`
            if matches!(self.peek(), None | Some('=') | Some(',')) {
                self.skip(|c| c == '=');
                continue;
            }

            let value = if self.peek() == Some('"') {
                self.quoted_string()?
            } else {
                self.token().to_string()
            };

            match current.take() {
                Some(challenge) => current = Some(challenge.with_parameter(token, value)),
                None => {
                    return Err(invalid_challenge(format!(
                        "parameter {} precedes any scheme",
                        token
                    )))
                }
            }
        }

        if let Some(done) = current {
            challenges.push(done);
        }
        Ok(challenges)
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
    }

    fn token(&mut self) -> &'a str {
        let start = self.pos;
        self.skip(|c| !c.is_ascii_whitespace() && c != '=' && c != ',' && c != '"');
        &self.input[start..self.pos]
    }

    fn quoted_string(&mut self) -> Result<String, UmaError> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(value),
                Some('\\') => match self.bump() {
                    Some(c) => value.push(c),
                    None => break,
                },
                Some(c) => value.push(c),
                None => break,
            }
        }
        Err(invalid_challenge("unterminated quoted string".to_string()))
    }
}
