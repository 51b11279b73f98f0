//! Login state machine

use std::sync::Arc;

use tracing::{debug, info};

use super::resolver::ChallengeResolver;
use crate::config::Config;
use crate::portal::PortalPage;
use crate::session::{Session, SessionOrigin, SessionState};
use crate::{Error, Result};

const USERNAME_SELECTOR: &str = "#username";
const PASSWORD_SELECTOR: &str = "#password";

/// Textual markers the portal renders on login failure, in check order
const CHALLENGE_INVALID_MARKER: &str = "Invalid Captcha";
const LOGIN_INVALID_MARKER: &str = "Invalid LoginId/Password";
const CREDENTIALS_INVALID_MARKER: &str = "Invalid credentials.";

/// One authentication attempt's credentials
///
/// Held only for the duration of the attempt. The password never appears in
/// Debug output or logs.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new<S: Into<String>>(username: S, password: S) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Which failure marker the portal rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginRejection {
    /// Challenge answer was wrong; retryable
    Challenge,
    /// Login id/password pair rejected; never retryable
    Login,
    /// Credential check rejected; never retryable
    Credentials,
}

/// Typed observation of the page after a resolution attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginProbe {
    /// Location entered the authenticated content area
    Authenticated,
    /// A failure marker is present
    Rejected(LoginRejection),
    /// No marker, not authenticated; the attempt may still be in flight
    Pending,
}

/// Drives one session through credential submission to a terminal state
pub struct LoginWorkflow {
    resolver: Arc<dyn ChallengeResolver>,
    content_url_prefix: String,
    pooled_retries: u32,
    cold_retries: u32,
    retry_pause_ms: u64,
    settle_timeout_ms: u64,
}

impl LoginWorkflow {
    /// Create a workflow with budgets and markers from configuration
    pub fn new(resolver: Arc<dyn ChallengeResolver>, config: &Config) -> Self {
        Self {
            resolver,
            content_url_prefix: config.content_url_prefix.clone(),
            pooled_retries: config.pooled_captcha_retries,
            cold_retries: config.cold_captcha_retries,
            retry_pause_ms: config.retry_pause_ms,
            settle_timeout_ms: config.settle_timeout_ms,
        }
    }

    /// Authenticate the session with the given credentials
    ///
    /// The session is left `Authenticated` on success and `Failed` on any
    /// terminal failure; releasing it back to the pool stays the caller's
    /// responsibility on every path.
    pub async fn login(&self, session: &mut Session, credentials: &Credentials) -> Result<()> {
        session.set_state(SessionState::Authenticating);
        let page = session.page();

        page.fill(USERNAME_SELECTOR, &credentials.username).await?;
        page.fill(PASSWORD_SELECTOR, &credentials.password).await?;

        self.resolver.attempt(page.as_ref()).await?;
        page.wait_for_settle(self.settle_timeout_ms).await;

        let mut probe = self.observe(page.as_ref()).await?;

        if probe == LoginProbe::Rejected(LoginRejection::Challenge) {
            let budget = match session.origin() {
                SessionOrigin::Prewarmed => self.pooled_retries,
                SessionOrigin::Overflow => self.cold_retries,
            };
            debug!(
                "Invalid challenge on session {}, retrying up to {} times",
                session.id(),
                budget
            );

            let mut retries = 0;
            loop {
                if retries >= budget {
                    if probe == LoginProbe::Rejected(LoginRejection::Challenge) {
                        session.set_state(SessionState::Failed);
                        return Err(Error::CaptchaExhausted);
                    }
                    // Marker cleared but login never landed; the location
                    // check below decides
                    break;
                }
                retries += 1;

                self.resolver.attempt(page.as_ref()).await?;
                page.wait_for_settle(self.settle_timeout_ms).await;
                // The solver submits asynchronously; give the page a beat
                tokio::time::sleep(tokio::time::Duration::from_millis(self.retry_pause_ms)).await;

                probe = self.observe(page.as_ref()).await?;
                match probe {
                    // No marker yet either means mid-submission or a dead
                    // challenge; both spend a retry
                    LoginProbe::Rejected(LoginRejection::Challenge) | LoginProbe::Pending => {
                        debug!("Challenge retry {} for session {}", retries, session.id());
                    }
                    _ => break,
                }
            }
        }

        match probe {
            LoginProbe::Authenticated => {
                session.set_state(SessionState::Authenticated);
                info!("Session {} authenticated", session.id());
                Ok(())
            }
            LoginProbe::Rejected(LoginRejection::Login)
            | LoginProbe::Rejected(LoginRejection::Credentials) => {
                session.set_state(SessionState::Failed);
                Err(Error::InvalidCredentials)
            }
            LoginProbe::Rejected(LoginRejection::Challenge) => {
                session.set_state(SessionState::Failed);
                Err(Error::CaptchaExhausted)
            }
            LoginProbe::Pending => {
                session.set_state(SessionState::Failed);
                let url = page.current_url().await?;
                if url.contains("login") {
                    Err(Error::LoginFailed)
                } else {
                    Err(Error::UnknownLoginFailure)
                }
            }
        }
    }

    /// Inspect the page for failure markers or the authenticated area
    ///
    /// Markers are checked in priority order; the location check runs only
    /// when no marker matched.
    pub async fn observe(&self, page: &dyn PortalPage) -> Result<LoginProbe> {
        // Marker scan mirrors the portal's banner text; a transient failure to
        // read the body counts as "no marker", same as an empty page
        let body = page.body_text().await.unwrap_or_default();

        if body.contains(CHALLENGE_INVALID_MARKER) {
            return Ok(LoginProbe::Rejected(LoginRejection::Challenge));
        }
        if body.contains(LOGIN_INVALID_MARKER) {
            return Ok(LoginProbe::Rejected(LoginRejection::Login));
        }
        if body.contains(CREDENTIALS_INVALID_MARKER) {
            return Ok(LoginProbe::Rejected(LoginRejection::Credentials));
        }

        let url = page.current_url().await?;
        if url.starts_with(&self.content_url_prefix) {
            Ok(LoginProbe::Authenticated)
        } else {
            Ok(LoginProbe::Pending)
        }
    }
}
