//! UMA Negotiation
//!
//! The claims-gathering loop and the handlers that feed it claims.

pub mod engine;
pub mod handlers;

pub use engine::NegotiationEngine;
pub use handlers::{
    claim_resolver_fn, create_mock_claim_handler, is_compatible, ClaimGatheringHandler,
    ClaimHandlerRegistry, ClaimResolver, FnClaimResolver, MockClaimHandler, SessionClaimHandler,
    StaticClaimHandler,
};
