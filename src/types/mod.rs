//! UMA Types
//!
//! Core type definitions for UMA negotiation and session credentials.

pub mod challenge;
pub mod claims;
pub mod config;
pub mod credential;
pub mod token;

pub use challenge::*;
pub use claims::*;
pub use config::*;
pub use credential::*;
pub use token::*;
