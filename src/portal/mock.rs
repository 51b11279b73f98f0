//! Mock portal for testing
//!
//! Simulates the portal's pre-login surface, captcha verdicts, and in-page
//! extraction scripts without a browser. The login simulation advances one
//! step per solver invocation, so retry budgets and marker priorities can be
//! exercised deterministically.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::page::{PageFactory, PortalPage};
use crate::cdp::EvaluationResult;
use crate::Error;

/// Pre-login URL the mock portal serves its challenge from
pub const PRELOGIN_URL: &str = "https://vtop.vit.ac.in/vtop/prelogin/setup?flag=VTOP";

/// Authenticated content area prefix
pub const CONTENT_URL: &str = "https://vtop.vit.ac.in/vtop/content";

/// How the mock portal responds to login attempts
#[derive(Debug, Clone)]
pub enum MockLoginBehavior {
    /// Reject with the challenge marker this many times, then authenticate
    SucceedAfter(u32),
    /// Always report the login-invalid marker
    RejectLogin,
    /// Always report the credentials-invalid marker
    RejectCredentials,
    /// Stay on the pre-login surface with no marker at all
    Stall,
    /// Leave the login surface for an unrecognized location
    WanderOff,
}

/// Canned outcome for an extraction script
#[derive(Debug, Clone)]
pub enum ScriptOutcome {
    /// Raw string the script returns
    Value(String),
    /// Script throws
    Fail(String),
}

#[derive(Debug, Default)]
struct MockState {
    url: String,
    body: String,
    fields: HashMap<String, String>,
    visible: HashSet<String>,
    solver_attempts: u32,
    navigations: u32,
    cookie_clears: u32,
    evaluated: Vec<String>,
    closed: bool,
}

/// Scriptable in-memory portal page
#[derive(Debug)]
pub struct MockPortalPage {
    behavior: MockLoginBehavior,
    expected_credentials: Option<(String, String)>,
    script_results: Vec<(String, ScriptOutcome)>,
    solver_marker: Option<String>,
    fail_navigation: bool,
    fail_cookie_clear: bool,
    state: Mutex<MockState>,
}

impl MockPortalPage {
    /// Create a mock page with the given login behavior
    pub fn new(behavior: MockLoginBehavior) -> Self {
        Self {
            behavior,
            expected_credentials: None,
            script_results: Vec::new(),
            solver_marker: Some("captchaStr".to_string()),
            fail_navigation: false,
            fail_cookie_clear: false,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Only these credentials authenticate; others hit the login-invalid marker
    pub fn with_credentials<S: Into<String>>(mut self, username: S, password: S) -> Self {
        self.expected_credentials = Some((username.into(), password.into()));
        self
    }

    /// Register a canned outcome for scripts containing `marker`
    ///
    /// Registering the same marker again replaces the earlier outcome.
    pub fn with_script_result<S: Into<String>>(mut self, marker: S, outcome: ScriptOutcome) -> Self {
        let marker = marker.into();
        if let Some(entry) = self.script_results.iter_mut().find(|(m, _)| *m == marker) {
            entry.1 = outcome;
        } else {
            self.script_results.push((marker, outcome));
        }
        self
    }

    /// Scripts containing `marker` count as solver invocations
    pub fn with_solver_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.solver_marker = Some(marker.into());
        self
    }

    /// Every navigation fails (preparation-failure simulation)
    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    /// Cookie clearing fails (reset-failure simulation)
    pub fn failing_cookie_clear(mut self) -> Self {
        self.fail_cookie_clear = true;
        self
    }

    /// Number of solver invocations observed
    pub fn solver_attempts(&self) -> u32 {
        self.state.lock().unwrap().solver_attempts
    }

    /// Number of navigations performed
    pub fn navigations(&self) -> u32 {
        self.state.lock().unwrap().navigations
    }

    /// Number of cookie-clear calls
    pub fn cookie_clears(&self) -> u32 {
        self.state.lock().unwrap().cookie_clears
    }

    /// Value last filled into a field
    pub fn filled(&self, selector: &str) -> Option<String> {
        self.state.lock().unwrap().fields.get(selector).cloned()
    }

    /// All scripts evaluated against this page
    pub fn evaluated_scripts(&self) -> Vec<String> {
        self.state.lock().unwrap().evaluated.clone()
    }

    /// Force the body text (observation tests)
    pub fn set_body<S: Into<String>>(&self, body: S) {
        self.state.lock().unwrap().body = body.into();
    }

    /// Force the current location (observation tests)
    pub fn set_url<S: Into<String>>(&self, url: S) {
        self.state.lock().unwrap().url = url.into();
    }

    /// Advance the login simulation by one solver invocation
    fn apply_login_attempt(&self) {
        let mut state = self.state.lock().unwrap();
        state.solver_attempts += 1;

        let credentials_ok = match &self.expected_credentials {
            None => true,
            Some((username, password)) => {
                state.fields.get("#username") == Some(username)
                    && state.fields.get("#password") == Some(password)
            }
        };

        match &self.behavior {
            MockLoginBehavior::RejectLogin => {
                state.body = "Invalid LoginId/Password".to_string();
            }
            MockLoginBehavior::RejectCredentials => {
                state.body = "Invalid credentials.".to_string();
            }
            MockLoginBehavior::Stall => {
                state.body = String::new();
            }
            MockLoginBehavior::WanderOff => {
                state.url = "https://vtop.vit.ac.in/vtop/maintenance".to_string();
                state.body = String::new();
            }
            MockLoginBehavior::SucceedAfter(failures) => {
                if !credentials_ok {
                    state.body = "Invalid LoginId/Password".to_string();
                } else if state.solver_attempts > *failures {
                    state.url = format!("{}/", CONTENT_URL);
                    state.body = "Welcome".to_string();
                    state.visible.clear();
                } else {
                    state.body = "Invalid Captcha".to_string();
                }
            }
        }
    }
}

#[async_trait]
impl PortalPage for MockPortalPage {
    async fn navigate(&self, url: &str) -> Result<(), Error> {
        // Suspend like a real navigation would, so concurrent tasks interleave
        tokio::task::yield_now().await;

        if self.fail_navigation {
            return Err(Error::navigation_failed(format!("{}: connection refused", url)));
        }

        let mut state = self.state.lock().unwrap();
        state.navigations += 1;
        state.url = url.to_string();
        state.visible.clear();

        if url.starts_with("https://vtop.vit.ac.in/vtop/prelogin") {
            state.body = "Captcha".to_string();
            for selector in ["#captchaStr", "#username", "#password"] {
                state.visible.insert(selector.to_string());
            }
        } else {
            state.body = String::new();
        }

        Ok(())
    }

    async fn wait_for_visible(&self, selector: &str, timeout_ms: u64) -> Result<(), Error> {
        let visible = self.state.lock().unwrap().visible.contains(selector);
        if visible {
            Ok(())
        } else {
            Err(Error::timeout(format!(
                "Element {} not visible after {}ms",
                selector, timeout_ms
            )))
        }
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), Error> {
        self.state
            .lock()
            .unwrap()
            .fields
            .insert(selector.to_string(), value.to_string());
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<EvaluationResult, Error> {
        tokio::task::yield_now().await;

        {
            let mut state = self.state.lock().unwrap();
            state.evaluated.push(script.to_string());
        }

        if let Some(marker) = &self.solver_marker {
            if script.contains(marker.as_str()) {
                self.apply_login_attempt();
                return Ok(EvaluationResult::Null);
            }
        }

        for (marker, outcome) in &self.script_results {
            if script.contains(marker.as_str()) {
                return match outcome {
                    ScriptOutcome::Value(raw) => Ok(EvaluationResult::String(raw.clone())),
                    ScriptOutcome::Fail(message) => {
                        Err(Error::script_execution_failed(message.clone()))
                    }
                };
            }
        }

        Ok(EvaluationResult::Null)
    }

    async fn body_text(&self) -> Result<String, Error> {
        Ok(self.state.lock().unwrap().body.clone())
    }

    async fn current_url(&self) -> Result<String, Error> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn wait_for_settle(&self, _timeout_ms: u64) {}

    async fn clear_cookies(&self) -> Result<(), Error> {
        if self.fail_cookie_clear {
            return Err(Error::internal("cookie store unavailable"));
        }
        self.state.lock().unwrap().cookie_clears += 1;
        Ok(())
    }

    async fn close(&self) -> Result<(), Error> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }

    fn is_active(&self) -> bool {
        !self.state.lock().unwrap().closed
    }
}

/// Factory handing out mock pages, one per session
pub struct MockPageFactory {
    template: Box<dyn Fn() -> MockPortalPage + Send + Sync>,
    fail_next: AtomicUsize,
    created: Mutex<Vec<Arc<MockPortalPage>>>,
}

impl MockPageFactory {
    /// Every created page uses the given login behavior
    pub fn new(behavior: MockLoginBehavior) -> Self {
        Self::with_template(move || MockPortalPage::new(behavior.clone()))
    }

    /// Full control over page construction
    pub fn with_template<F>(template: F) -> Self
    where
        F: Fn() -> MockPortalPage + Send + Sync + 'static,
    {
        Self {
            template: Box::new(template),
            fail_next: AtomicUsize::new(0),
            created: Mutex::new(Vec::new()),
        }
    }

    /// Fail the next `n` page creations
    pub fn fail_next(self, n: usize) -> Self {
        self.fail_next.store(n, Ordering::SeqCst);
        self
    }

    /// Pages handed out so far, in creation order
    pub fn created(&self) -> Vec<Arc<MockPortalPage>> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFactory for MockPageFactory {
    async fn create_page(&self, _identity_tag: &str) -> Result<Arc<dyn PortalPage>, Error> {
        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::internal("target creation refused"));
        }

        let page = Arc::new((self.template)());
        self.created.lock().unwrap().push(Arc::clone(&page));
        Ok(page)
    }
}
