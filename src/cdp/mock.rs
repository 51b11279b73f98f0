//! Mock CDP connection for testing

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::traits::CdpConnection;
use super::types::CdpRpcResponse;
use crate::Error;

/// Mock CDP connection with canned per-method responses
#[derive(Debug, Default)]
pub struct MockCdpConnection {
    responses: Mutex<HashMap<String, Value>>,
    call_counts: Mutex<HashMap<String, usize>>,
}

impl MockCdpConnection {
    /// Create a new mock connection
    pub fn new() -> Self {
        Self::default()
    }

    /// Stub the result payload returned for a method
    pub fn stub(&self, method: &str, result: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(method.to_string(), result);
    }

    /// Number of times a method was called
    pub fn calls(&self, method: &str) -> usize {
        self.call_counts
            .lock()
            .unwrap()
            .get(method)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl CdpConnection for MockCdpConnection {
    async fn send_command(&self, method: &str, _params: Value) -> Result<CdpRpcResponse, Error> {
        *self
            .call_counts
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_insert(0) += 1;

        let result = self
            .responses
            .lock()
            .unwrap()
            .get(method)
            .cloned()
            .unwrap_or(Value::Object(serde_json::Map::new()));

        Ok(CdpRpcResponse {
            id: 0,
            result,
            error: None,
        })
    }

    async fn close(&self) -> Result<(), Error> {
        Ok(())
    }

    fn is_active(&self) -> bool {
        true
    }
}
