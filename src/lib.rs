//! vtop-relay: pooled-session gateway for the VTOP student portal
//!
//! Authenticates against the portal's captcha-gated login and aggregates
//! per-student data categories, amortizing challenge resolution across
//! requests with a pool of pre-warmed browser sessions.

pub mod config;
pub mod error;

pub mod auth;
pub mod cdp;
pub mod extract;
pub mod portal;
pub mod server;
pub mod session;

// Re-exports
pub use error::{Error, Result};

/// vtop-relay library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
