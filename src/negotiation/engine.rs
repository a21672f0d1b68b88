//! Negotiation Engine
//!
//! Drives the UMA claims-gathering loop against a token endpoint. Each
//! round is one POST; `need_info` responses are handed to a
//! [`ClaimResolver`] and the loop continues with the new ticket until the
//! server issues a token, rejects the request, or the round limit is hit.

use std::sync::Arc;
use url::Url;

use crate::core::{HttpRequest, HttpResponse, HttpTransport};
use crate::error::{
    map_negotiation_error, parse_error_response, ErrorClass, NegotiationError, ProtocolError,
    UmaError, UmaResult,
};
use crate::negotiation::ClaimResolver;
use crate::telemetry::{Logger, TracingLogger, UmaLogContext};
use crate::types::{NeedInfo, TokenRequest, TokenResponse, UmaConfig, UnknownErrorPolicy};

/// Position in the negotiation loop.
enum NegotiationState {
    AwaitingResponse {
        request: TokenRequest,
        round: u32,
    },
    NeedInfoRecovery {
        need_info: NeedInfo,
        scopes: Vec<String>,
        round: u32,
    },
    Success(TokenResponse),
    Failure(UmaError),
}

/// Token endpoint negotiation engine.
///
/// Holds no per-negotiation state, so one engine serves any number of
/// concurrent negotiations.
pub struct NegotiationEngine<T: HttpTransport> {
    transport: Arc<T>,
    config: UmaConfig,
    logger: Arc<dyn Logger>,
}

impl<T: HttpTransport> NegotiationEngine<T> {
    /// Create new engine.
    pub fn new(transport: Arc<T>, config: UmaConfig) -> Self {
        Self {
            transport,
            config,
            logger: Arc::new(TracingLogger),
        }
    }

    /// Replace the logger.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &UmaConfig {
        &self.config
    }

    /// Negotiate with the configured round limit.
    pub async fn negotiate(
        &self,
        token_endpoint: &Url,
        request: TokenRequest,
        resolver: &dyn ClaimResolver,
    ) -> UmaResult<TokenResponse> {
        self.negotiate_with_limit(token_endpoint, request, resolver, self.config.max_iterations)
            .await
    }

    /// Negotiate, sending at most `max_iterations` requests.
    pub async fn negotiate_with_limit(
        &self,
        token_endpoint: &Url,
        request: TokenRequest,
        resolver: &dyn ClaimResolver,
        max_iterations: u32,
    ) -> UmaResult<TokenResponse> {
        let context = UmaLogContext::new()
            .operation("negotiate")
            .authorization_server(token_endpoint.as_str());

        let mut state = NegotiationState::AwaitingResponse { request, round: 1 };

        loop {
            state = match state {
                NegotiationState::AwaitingResponse { round, .. } if round > max_iterations => {
                    NegotiationState::Failure(UmaError::Negotiation(
                        NegotiationError::IterationLimitExceeded { max_iterations },
                    ))
                }
                NegotiationState::AwaitingResponse { request, round } => {
                    self.logger
                        .debug("Sending token request", &context.clone().round(round));
                    self.send_round(token_endpoint, request, round).await
                }
                NegotiationState::NeedInfoRecovery {
                    need_info,
                    scopes,
                    round,
                } => match resolver.resolve(&need_info).await {
                    Ok(Some(claim_token)) => NegotiationState::AwaitingResponse {
                        request: TokenRequest::new(need_info.ticket())
                            .with_claim_token(claim_token)
                            .with_scopes(scopes),
                        round: round.saturating_add(1),
                    },
                    Ok(None) => NegotiationState::Failure(UmaError::Negotiation(
                        NegotiationError::RequestDenied {
                            message: "Unable to negotiate a token: no claim satisfies the authorization server"
                                .to_string(),
                        },
                    )),
                    Err(e) => NegotiationState::Failure(e),
                },
                NegotiationState::Success(response) => {
                    self.logger.info("Token issued", &context);
                    return Ok(response);
                }
                NegotiationState::Failure(error) => {
                    self.logger.warn(
                        "Negotiation failed",
                        &context.clone().extra("error_code", error.error_code()),
                    );
                    return Err(error);
                }
            };
        }
    }

    async fn send_round(
        &self,
        token_endpoint: &Url,
        request: TokenRequest,
        round: u32,
    ) -> NegotiationState {
        let http_request =
            HttpRequest::post_form(token_endpoint.as_str(), request.to_form_body())
                .with_timeout(self.config.timeout);

        match self.transport.send(http_request).await {
            Ok(response) => self.handle_response(response, request.scopes().to_vec(), round),
            Err(e) => NegotiationState::Failure(e),
        }
    }

    fn handle_response(
        &self,
        response: HttpResponse,
        scopes: Vec<String>,
        round: u32,
    ) -> NegotiationState {
        let status = response.status;

        if status == 200 {
            return match serde_json::from_str::<TokenResponse>(&response.body) {
                Ok(token) => NegotiationState::Success(token),
                Err(e) => NegotiationState::Failure(invalid_json(status, e)),
            };
        }

        let error = match parse_error_response(&response.body) {
            Ok(error) => error,
            Err(e) => return NegotiationState::Failure(invalid_json(status, e)),
        };

        if let Some(terminal) = map_negotiation_error(&error) {
            return NegotiationState::Failure(UmaError::Negotiation(terminal));
        }

        if ErrorClass::from_code(&error.error) == ErrorClass::Unrecognized
            && self.config.unknown_error_policy == UnknownErrorPolicy::FailFast
        {
            return NegotiationState::Failure(UmaError::Protocol(
                ProtocolError::UnrecognizedError {
                    status,
                    code: error.error,
                },
            ));
        }

        match NeedInfo::from_error_response(&error) {
            Some(need_info) => NegotiationState::NeedInfoRecovery {
                need_info,
                scopes,
                round,
            },
            None => NegotiationState::Failure(UmaError::Protocol(ProtocolError::MissingField {
                status,
                field: "ticket".to_string(),
            })),
        }
    }
}

fn invalid_json(status: u16, e: serde_json::Error) -> UmaError {
    UmaError::Protocol(ProtocolError::InvalidJson {
        status,
        message: e.to_string(),
    })
}
