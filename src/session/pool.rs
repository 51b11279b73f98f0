//! Session pool
//!
//! Keeps a FIFO of pre-warmed sessions and hands them out one request at a
//! time. Acquisition beyond the pool falls back to bounded on-demand creation;
//! past the overflow bound requests are rejected instead of queued. Release
//! always resets and always re-enqueues, whether or not the reset worked.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::session::{rotate_identity, Session, SessionOrigin, SessionState};
use crate::portal::PageFactory;
use crate::{Error, Result};

/// Selector of the captcha input on the pre-login surface
const CHALLENGE_SELECTOR: &str = "#captchaStr";

/// Pool sizing and preparation policy
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Target number of pre-warmed sessions
    pub pool_size: usize,
    /// Overflow sessions allowed beyond the pool before rejecting
    pub max_overflow: usize,
    /// Pre-login page the challenge is served from
    pub prelogin_url: String,
    /// Bounded wait for the challenge to become visible
    pub selector_timeout_ms: u64,
}

impl PoolSettings {
    /// Derive pool settings from the service configuration
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            pool_size: config.pool_size,
            max_overflow: config.max_overflow,
            prelogin_url: config.prelogin_url.clone(),
            selector_timeout_ms: config.selector_timeout_ms,
        }
    }
}

#[derive(Debug, Default)]
struct PoolState {
    idle: VecDeque<Session>,
    in_flight: usize,
}

struct PoolShared {
    factory: Arc<dyn PageFactory>,
    settings: PoolSettings,
    state: Mutex<PoolState>,
}

/// Shared handle to the session pool
#[derive(Clone)]
pub struct SessionPool {
    shared: Arc<PoolShared>,
}

impl SessionPool {
    /// Create an empty pool over a page factory
    pub fn new(factory: Arc<dyn PageFactory>, settings: PoolSettings) -> Self {
        Self {
            shared: Arc::new(PoolShared {
                factory,
                settings,
                state: Mutex::new(PoolState::default()),
            }),
        }
    }

    /// Pre-warm the pool up to its target size
    ///
    /// Individual preparation failures are logged and the slot is dropped; the
    /// pool may legitimately start under target size. If every slot fails the
    /// pool would silently degrade to fully-on-demand operation, so that case
    /// is an error instead.
    pub async fn initialize(&self) -> Result<usize> {
        let target = self.shared.settings.pool_size;
        let mut warmed = 0;

        for slot in 0..target {
            match self.prepare(SessionOrigin::Prewarmed).await {
                Ok(session) => {
                    debug!("Pre-warmed session {} (slot {})", session.id(), slot);
                    self.shared.state.lock().await.idle.push_back(session);
                    warmed += 1;
                }
                Err(e) => {
                    warn!("Session preparation failed for slot {}: {}", slot, e);
                }
            }
        }

        if target > 0 && warmed == 0 {
            return Err(Error::pool_preparation(
                "every pool slot failed to prepare".to_string(),
            ));
        }

        if warmed < target {
            warn!("Pool running under target size: {}/{}", warmed, target);
        } else {
            info!("Pool pre-warmed with {} sessions", warmed);
        }

        Ok(warmed)
    }

    /// Acquire a session, pre-warmed if available, overflow otherwise
    ///
    /// Never blocks waiting for the pool to refill: an empty pool either
    /// creates an overflow session (while the admission bound allows) or fails
    /// fast with [`Error::PoolExhausted`].
    pub async fn acquire(&self) -> Result<SessionLease> {
        {
            let mut state = self.shared.state.lock().await;
            if let Some(session) = state.idle.pop_front() {
                state.in_flight += 1;
                debug!("Acquired pre-warmed session {}", session.id());
                return Ok(SessionLease::new(self.clone(), session));
            }

            let bound = self.shared.settings.pool_size + self.shared.settings.max_overflow;
            if state.in_flight >= bound {
                warn!("Admission bound reached ({} in flight)", state.in_flight);
                return Err(Error::PoolExhausted);
            }

            // Reserve the slot before the slow preparation outside the lock
            state.in_flight += 1;
        }

        match self.prepare(SessionOrigin::Overflow).await {
            Ok(session) => {
                info!("Created overflow session {}", session.id());
                Ok(SessionLease::new(self.clone(), session))
            }
            Err(e) => {
                self.shared.state.lock().await.in_flight -= 1;
                Err(e)
            }
        }
    }

    /// Reset a session and return it to the tail of the pool
    ///
    /// Reset failures are logged, never propagated: a session that could not
    /// be reset fails its own challenge check on next use and is handled by
    /// the login workflow's failure path.
    pub async fn release(&self, mut session: Session) {
        if !session.page().is_active() {
            warn!("Session {} page is no longer active, skipping reset", session.id());
        } else if let Err(e) = self.reset(&mut session).await {
            warn!("Reset of session {} failed: {}", session.id(), e);
        }
        session.set_state(SessionState::PreWarmed);

        let mut state = self.shared.state.lock().await;
        state.in_flight -= 1;
        state.idle.push_back(session);
    }

    /// Return a session to the pre-warmed state
    ///
    /// Safe to call on an already pre-warmed session; it just re-navigates to
    /// the same surface.
    pub async fn reset(&self, session: &mut Session) -> Result<()> {
        session.set_state(SessionState::Resetting);

        let page = session.page();
        page.clear_cookies().await?;
        page.navigate(&self.shared.settings.prelogin_url).await?;
        page.wait_for_visible(CHALLENGE_SELECTOR, self.shared.settings.selector_timeout_ms)
            .await?;

        session.set_state(SessionState::PreWarmed);
        Ok(())
    }

    /// Prepare a fresh session: create a page under a rotated identity,
    /// navigate to the pre-login surface, and wait for the challenge
    async fn prepare(&self, origin: SessionOrigin) -> Result<Session> {
        let identity_tag = rotate_identity();
        let page = self
            .shared
            .factory
            .create_page(identity_tag)
            .await
            .map_err(|e| Error::pool_preparation(e.to_string()))?;

        let prepared = async {
            page.navigate(&self.shared.settings.prelogin_url).await?;
            page.wait_for_visible(CHALLENGE_SELECTOR, self.shared.settings.selector_timeout_ms)
                .await
        }
        .await;

        if let Err(e) = prepared {
            if let Err(close_err) = page.close().await {
                debug!("Failed to close unprepared page: {}", close_err);
            }
            return Err(Error::pool_preparation(e.to_string()));
        }

        Ok(Session::new(identity_tag, origin, page))
    }

    /// Number of idle sessions currently pooled
    pub async fn idle_count(&self) -> usize {
        self.shared.state.lock().await.idle.len()
    }

    /// Number of sessions currently in flight
    pub async fn in_flight_count(&self) -> usize {
        self.shared.state.lock().await.in_flight
    }

    /// Lifecycle states of the idle sessions, head first
    pub async fn idle_states(&self) -> Vec<SessionState> {
        self.shared
            .state
            .lock()
            .await
            .idle
            .iter()
            .map(|s| s.state())
            .collect()
    }
}

/// Scoped session acquisition
///
/// Holds an acquired session for the duration of one request and guarantees
/// it is released exactly once. Prefer the explicit [`SessionLease::release`];
/// if a lease is dropped without it (an error path unwound past the release
/// point), the drop hook releases in a background task instead of leaking.
pub struct SessionLease {
    pool: SessionPool,
    session: Option<Session>,
}

impl SessionLease {
    fn new(pool: SessionPool, session: Session) -> Self {
        Self {
            pool,
            session: Some(session),
        }
    }

    /// The leased session
    pub fn session_mut(&mut self) -> &mut Session {
        self.session
            .as_mut()
            .expect("session present until release")
    }

    /// Reset the session and return it to the pool
    pub async fn release(mut self) {
        if let Some(session) = self.session.take() {
            self.pool.release(session).await;
        }
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            warn!("Session {} released via drop hook", session.id());
            let pool = self.pool.clone();
            tokio::spawn(async move { pool.release(session).await });
        }
    }
}
