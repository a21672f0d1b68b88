//! UMA Core Components
//!
//! HTTP transport and authorization server discovery.

pub mod discovery;
pub mod transport;

pub use discovery::*;
pub use transport::*;
