//! CDP client
//!
//! Typed operations over a raw connection: navigation with load settling,
//! script evaluation with exception surfacing, cookie and identity control.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::traits::CdpConnection;
use super::types::{EvaluateParams, EvaluateResponse, EvaluationResult, NavigateParams};
use crate::Error;

/// Poll interval while waiting for `document.readyState`
const READY_POLL_MS: u64 = 100;

/// CDP client implementation
#[derive(Debug, Clone)]
pub struct CdpClient {
    connection: Arc<dyn CdpConnection>,
}

impl CdpClient {
    /// Create a new CDP client over an established connection
    pub fn new(connection: Arc<dyn CdpConnection>) -> Self {
        Self { connection }
    }

    /// Get the underlying connection
    pub fn connection(&self) -> Arc<dyn CdpConnection> {
        Arc::clone(&self.connection)
    }

    /// Navigate to a URL and poll `document.readyState` until the document
    /// completes or the bounded wait elapses. A settle timeout is tolerated.
    pub async fn navigate(&self, url: &str, settle_ms: u64) -> Result<(), Error> {
        debug!("Navigating to {}", url);

        let params = NavigateParams { url: url.to_string() };
        self.call_method("Page.navigate", serde_json::to_value(params)?)
            .await
            .map_err(|e| Error::navigation_failed(format!("{}: {}", url, e)))?;

        self.wait_for_ready(settle_ms).await;
        Ok(())
    }

    /// Best-effort wait for the document to finish loading
    pub async fn wait_for_ready(&self, settle_ms: u64) {
        let attempts = settle_ms / READY_POLL_MS;
        for _ in 0..attempts {
            tokio::time::sleep(tokio::time::Duration::from_millis(READY_POLL_MS)).await;
            match self.evaluate("document.readyState", false).await {
                Ok(EvaluationResult::String(state)) if state == "complete" => return,
                Ok(_) => {}
                // The document may be mid-navigation; keep polling
                Err(e) => debug!("readyState probe failed: {}", e),
            }
        }
        debug!("Document did not settle within {}ms, continuing", settle_ms);
    }

    /// Evaluate JavaScript in the page
    pub async fn evaluate(&self, script: &str, await_promise: bool) -> Result<EvaluationResult, Error> {
        let params = EvaluateParams {
            expression: script.to_string(),
            await_promise: Some(await_promise),
            return_by_value: Some(true),
        };

        let result = self
            .call_method("Runtime.evaluate", serde_json::to_value(params)?)
            .await?;

        let response: EvaluateResponse = serde_json::from_value(result)
            .map_err(|e| Error::cdp(format!("Malformed Runtime.evaluate response: {}", e)))?;

        if let Some(exception) = &response.exception_details {
            let description = exception
                .get("exception")
                .and_then(|e| e.get("description"))
                .and_then(|d| d.as_str())
                .unwrap_or("Unknown error");
            return Err(Error::script_execution_failed(description.to_string()));
        }

        Ok(EvaluationResult::from_remote_object(&response.result))
    }

    /// Clear all browser cookies held by this target's context
    pub async fn clear_cookies(&self) -> Result<(), Error> {
        let _ = self
            .call_method("Network.clearBrowserCookies", Value::Null)
            .await?;
        Ok(())
    }

    /// Override the user agent reported by this target
    pub async fn set_user_agent(&self, user_agent: &str) -> Result<(), Error> {
        let params = serde_json::json!({ "userAgent": user_agent });
        let _ = self.call_method("Network.setUserAgentOverride", params).await?;
        Ok(())
    }

    /// Call a raw CDP method
    pub async fn call_method(&self, method: &str, params: Value) -> Result<Value, Error> {
        let response = self.connection.send_command(method, params).await?;
        Ok(response.result)
    }
}
