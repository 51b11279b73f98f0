//! Session entity

use std::sync::Arc;

use rand::Rng;
use uuid::Uuid;

use crate::portal::PortalPage;

/// Client identity strings rotated across sessions to vary the fingerprint
pub const IDENTITY_TAGS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
];

/// Pick an identity tag for a new session
pub fn rotate_identity() -> &'static str {
    let mut rng = rand::thread_rng();
    IDENTITY_TAGS[rng.gen_range(0..IDENTITY_TAGS.len())]
}

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Parked on the pre-login surface with the challenge displayed
    PreWarmed,
    /// A login workflow is driving this session
    Authenticating,
    /// Inside the authenticated content area
    Authenticated,
    /// Login failed; the session needs a reset before reuse
    Failed,
    /// Being returned to the pre-warmed state
    Resetting,
}

/// Which acquisition path created a session
///
/// Pre-warmed sessions carry a fresher challenge and get a tighter captcha
/// retry budget than cold overflow sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrigin {
    Prewarmed,
    Overflow,
}

/// A pooled portal session
///
/// Owned by the pool while idle and moved into exactly one request task while
/// in flight; never shared between tasks.
#[derive(Debug)]
pub struct Session {
    id: String,
    identity_tag: String,
    origin: SessionOrigin,
    state: SessionState,
    page: Arc<dyn PortalPage>,
}

impl Session {
    /// Create a session around a prepared page
    pub fn new(identity_tag: &str, origin: SessionOrigin, page: Arc<dyn PortalPage>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            identity_tag: identity_tag.to_string(),
            origin,
            state: SessionState::PreWarmed,
            page,
        }
    }

    /// Session ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Client identity this session reports
    pub fn identity_tag(&self) -> &str {
        &self.identity_tag
    }

    /// Acquisition path that created this session
    pub fn origin(&self) -> SessionOrigin {
        self.origin
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Transition to a new lifecycle state
    pub fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    /// The page backing this session
    pub fn page(&self) -> Arc<dyn PortalPage> {
        Arc::clone(&self.page)
    }
}
