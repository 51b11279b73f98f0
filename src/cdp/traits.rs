//! CDP layer traits

use async_trait::async_trait;
use serde_json::Value;

use crate::cdp::types::CdpRpcResponse;

/// CDP connection trait
///
/// Represents a WebSocket connection to a single DevTools target.
#[async_trait]
pub trait CdpConnection: Send + Sync + std::fmt::Debug {
    /// Send a CDP command and wait for its response
    async fn send_command(&self, method: &str, params: Value) -> Result<CdpRpcResponse, crate::Error>;

    /// Close the connection
    async fn close(&self) -> Result<(), crate::Error>;

    /// Check if the connection is active
    fn is_active(&self) -> bool;
}
