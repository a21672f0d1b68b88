//! Builders
//!
//! Fluent builder patterns for UMA configuration.

pub mod config;

pub use config::{uma_config, UmaConfigBuilder};
