//! Portal page traits

use std::sync::Arc;

use async_trait::async_trait;

use crate::cdp::EvaluationResult;

/// An isolated browsing context plus its active document view
///
/// One page backs one pooled session. Implementations must be safe to move
/// between tasks; the pool guarantees a page is never driven by two tasks at
/// once.
#[async_trait]
pub trait PortalPage: Send + Sync + std::fmt::Debug {
    /// Navigate to a URL and wait for the document to settle (best-effort)
    async fn navigate(&self, url: &str) -> Result<(), crate::Error>;

    /// Wait until an element matching the selector is visible
    async fn wait_for_visible(&self, selector: &str, timeout_ms: u64) -> Result<(), crate::Error>;

    /// Fill a form field identified by selector
    async fn fill(&self, selector: &str, value: &str) -> Result<(), crate::Error>;

    /// Evaluate JavaScript in the document, awaiting promises
    async fn evaluate(&self, script: &str) -> Result<EvaluationResult, crate::Error>;

    /// Visible text of the document body
    async fn body_text(&self) -> Result<String, crate::Error>;

    /// Current document location
    async fn current_url(&self) -> Result<String, crate::Error>;

    /// Best-effort wait for in-flight work to settle; a timeout is tolerated
    async fn wait_for_settle(&self, timeout_ms: u64);

    /// Drop all cookies held by this page's context
    async fn clear_cookies(&self) -> Result<(), crate::Error>;

    /// Close the page
    async fn close(&self) -> Result<(), crate::Error>;

    /// Check if the page is still usable
    fn is_active(&self) -> bool;
}

/// Creates portal pages for the session pool
#[async_trait]
pub trait PageFactory: Send + Sync {
    /// Create a fresh, isolated page reporting the given client identity
    async fn create_page(&self, identity_tag: &str) -> Result<Arc<dyn PortalPage>, crate::Error>;
}
