//! Token Management
//!
//! Caching of negotiated bearer credentials.

pub mod cache;

pub use cache::{cache_key, TokenCache};
