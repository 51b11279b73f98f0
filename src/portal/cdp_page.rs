//! CDP-backed portal page

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::page::{PageFactory, PortalPage};
use crate::cdp::{CdpClient, CdpWebSocketConnection, DevToolsBrowser, EvaluationResult};
use crate::Error;

/// Poll interval while waiting for element visibility
const VISIBILITY_POLL_MS: u64 = 100;

/// Portal page driven over CDP
#[derive(Debug)]
pub struct CdpPortalPage {
    client: CdpClient,
    browser: DevToolsBrowser,
    target_id: String,
    settle_ms: u64,
}

impl CdpPortalPage {
    /// Wrap an established CDP client for a dedicated target
    pub fn new(client: CdpClient, browser: DevToolsBrowser, target_id: String, settle_ms: u64) -> Self {
        Self {
            client,
            browser,
            target_id,
            settle_ms,
        }
    }
}

#[async_trait]
impl PortalPage for CdpPortalPage {
    async fn navigate(&self, url: &str) -> Result<(), Error> {
        self.client.navigate(url, self.settle_ms).await
    }

    async fn wait_for_visible(&self, selector: &str, timeout_ms: u64) -> Result<(), Error> {
        let probe = format!(
            "(function() {{ var el = document.querySelector({sel}); \
             return el !== null && el.offsetParent !== null; }})()",
            sel = serde_json::to_string(selector)?
        );

        let attempts = timeout_ms.div_ceil(VISIBILITY_POLL_MS);
        for _ in 0..attempts {
            match self.client.evaluate(&probe, false).await {
                Ok(EvaluationResult::Bool(true)) => return Ok(()),
                Ok(_) => {}
                Err(e) => debug!("Visibility probe for {} failed: {}", selector, e),
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(VISIBILITY_POLL_MS)).await;
        }

        Err(Error::timeout(format!(
            "Element {} not visible after {}ms",
            selector, timeout_ms
        )))
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), Error> {
        let script = format!(
            "(function() {{ var el = document.querySelector({sel}); \
             if (!el) throw new Error('no element for ' + {sel}); \
             el.value = {val}; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); }})()",
            sel = serde_json::to_string(selector)?,
            val = serde_json::to_string(value)?
        );
        self.client.evaluate(&script, false).await?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<EvaluationResult, Error> {
        self.client.evaluate(script, true).await
    }

    async fn body_text(&self) -> Result<String, Error> {
        let result = self
            .client
            .evaluate("document.body ? document.body.innerText : ''", false)
            .await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }

    async fn current_url(&self) -> Result<String, Error> {
        let result = self.client.evaluate("window.location.href", false).await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }

    async fn wait_for_settle(&self, timeout_ms: u64) {
        self.client.wait_for_ready(timeout_ms).await;
    }

    async fn clear_cookies(&self) -> Result<(), Error> {
        self.client.clear_cookies().await
    }

    async fn close(&self) -> Result<(), Error> {
        self.client.connection().close().await?;
        self.browser.close_target(&self.target_id).await
    }

    fn is_active(&self) -> bool {
        self.client.connection().is_active()
    }
}

/// Creates CDP-backed pages, one DevTools target per session
#[derive(Debug, Clone)]
pub struct CdpPageFactory {
    browser: DevToolsBrowser,
    settle_ms: u64,
}

impl CdpPageFactory {
    /// Create a factory over a DevTools endpoint
    pub fn new(browser: DevToolsBrowser, settle_ms: u64) -> Self {
        Self { browser, settle_ms }
    }
}

#[async_trait]
impl PageFactory for CdpPageFactory {
    async fn create_page(&self, identity_tag: &str) -> Result<Arc<dyn PortalPage>, Error> {
        let target = self.browser.create_target().await?;
        let connection = CdpWebSocketConnection::connect(&target.web_socket_debugger_url).await?;
        let client = CdpClient::new(connection);

        for domain in ["Page", "Runtime", "Network"] {
            client
                .call_method(&format!("{}.enable", domain), serde_json::Value::Null)
                .await?;
        }

        client.set_user_agent(identity_tag).await?;

        Ok(Arc::new(CdpPortalPage::new(
            client,
            self.browser.clone(),
            target.id,
            self.settle_ms,
        )))
    }
}
