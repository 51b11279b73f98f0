//! Authentication workflow
//!
//! Drives a pooled session from challenge-pending to authenticated (or a
//! terminal failure) against a portal that never reports challenge outcomes
//! directly: every solver invocation is followed by a typed observation of
//! the resulting page state.

pub mod resolver;
pub mod workflow;

pub use resolver::{ChallengeResolver, ScriptChallengeResolver};
pub use workflow::{Credentials, LoginProbe, LoginRejection, LoginWorkflow};
