//! DevTools target management
//!
//! Talks to the backing browser's DevTools HTTP endpoint to create and close
//! page targets. Each pooled session gets its own target, which gives it an
//! isolated document and cookie view per identity.

use serde::Deserialize;
use tracing::{debug, info};

use crate::Error;

/// Target descriptor returned by `/json/new`
#[derive(Debug, Clone, Deserialize)]
pub struct TargetDescriptor {
    pub id: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: String,
}

/// Browser handle over the DevTools HTTP endpoint
#[derive(Debug, Clone)]
pub struct DevToolsBrowser {
    endpoint: String,
    http: reqwest::Client,
}

impl DevToolsBrowser {
    /// Create a browser handle
    ///
    /// # Arguments
    /// * `endpoint` - DevTools HTTP endpoint (e.g., "http://localhost:9222")
    pub fn new<S: Into<String>>(endpoint: S) -> Self {
        let endpoint = endpoint.into();
        info!("Using DevTools endpoint {}", endpoint);
        Self {
            endpoint,
            http: reqwest::Client::new(),
        }
    }

    /// Create a fresh page target and return its descriptor
    pub async fn create_target(&self) -> Result<TargetDescriptor, Error> {
        let url = format!("{}/json/new?about:blank", self.endpoint);
        debug!("Creating DevTools target via {}", url);

        let response = self
            .http
            .put(&url)
            .send()
            .await
            .map_err(|e| Error::internal(format!("Failed to reach DevTools endpoint: {}", e)))?;

        let target: TargetDescriptor = response
            .json()
            .await
            .map_err(|e| Error::internal(format!("Malformed target descriptor: {}", e)))?;

        Ok(target)
    }

    /// Close a page target
    pub async fn close_target(&self, target_id: &str) -> Result<(), Error> {
        let url = format!("{}/json/close/{}", self.endpoint, target_id);
        debug!("Closing DevTools target {}", target_id);

        self.http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::internal(format!("Failed to close target: {}", e)))?;

        Ok(())
    }
}
