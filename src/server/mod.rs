//! Request handling
//!
//! The orchestrator owns the per-request sequence (acquire, authenticate,
//! extract, release); the HTTP layer is a thin axum surface over it.

pub mod http;
pub mod orchestrator;

pub use http::router;
pub use orchestrator::Orchestrator;
