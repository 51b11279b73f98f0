//! CDP wire types
//!
//! The subset of the protocol this service speaks: command envelopes and the
//! `Runtime.evaluate` result shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outgoing CDP command
#[derive(Debug, Clone, Serialize)]
pub struct CdpRequest {
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Incoming CDP command response
#[derive(Debug, Clone, Deserialize)]
pub struct CdpRpcResponse {
    pub id: u64,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<CdpRpcError>,
}

/// CDP-level error payload
#[derive(Debug, Clone, Deserialize)]
pub struct CdpRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Parameters for `Runtime.evaluate`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateParams {
    pub expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub await_promise: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_by_value: Option<bool>,
}

/// Parameters for `Page.navigate`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateParams {
    pub url: String,
}

/// `Runtime.evaluate` response envelope
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    pub result: RemoteObject,
    #[serde(default)]
    pub exception_details: Option<Value>,
}

/// A remote JavaScript object returned by value
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    pub r#type: String,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
}

/// JavaScript evaluation result
#[derive(Debug, Clone)]
pub enum EvaluationResult {
    /// String value
    String(String),
    /// Number value
    Number(f64),
    /// Boolean value
    Bool(bool),
    /// Null value
    Null,
    /// Object/Array (as JSON)
    Object(Value),
}

impl EvaluationResult {
    /// Decode a remote object returned by value
    pub fn from_remote_object(obj: &RemoteObject) -> Self {
        match obj.r#type.as_str() {
            "string" => EvaluationResult::String(
                obj.value
                    .as_ref()
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
            ),
            "number" => EvaluationResult::Number(
                obj.value.as_ref().and_then(|v| v.as_f64()).unwrap_or(0.0),
            ),
            "boolean" => EvaluationResult::Bool(
                obj.value.as_ref().and_then(|v| v.as_bool()).unwrap_or(false),
            ),
            "undefined" | "null" => EvaluationResult::Null,
            _ => EvaluationResult::Object(obj.value.clone().unwrap_or(Value::Null)),
        }
    }

    /// String content, if this result is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            EvaluationResult::String(s) => Some(s),
            _ => None,
        }
    }
}
