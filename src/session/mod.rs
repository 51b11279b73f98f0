//! Session pooling
//!
//! A session is an isolated browsing context parked on the portal's pre-login
//! surface with its captcha already displayed. The pool keeps a bounded set of
//! them ready so the expensive challenge round-trip stays off the request
//! path.

pub mod pool;
pub mod session;

pub use pool::{PoolSettings, SessionLease, SessionPool};
pub use session::{Session, SessionOrigin, SessionState, IDENTITY_TAGS};
