//! Unified error types for vtop-relay

use axum::http::StatusCode;
use thiserror::Error;

/// Unified Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for vtop-relay
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket errors
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// CDP protocol errors
    #[error("CDP error: {0}")]
    Cdp(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Captcha could not be cleared within the retry budget
    #[error("Captcha solving failed.")]
    CaptchaExhausted,

    /// Portal rejected the supplied username/password
    #[error("Invalid credentials.")]
    InvalidCredentials,

    /// Login never reached the authenticated content area
    #[error("Login failed.")]
    LoginFailed,

    /// Unrecognized failure signature after login submission
    #[error("Unknown error occurred.")]
    UnknownLoginFailure,

    /// Pool is empty and the overflow admission bound is reached
    #[error("No session available, retry later.")]
    PoolExhausted,

    /// A session could not be pre-warmed
    #[error("Session preparation failed: {0}")]
    PoolPreparation(String),

    /// Timeout
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// Navigation failed
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// Script execution failed
    #[error("Script execution failed: {0}")]
    ScriptExecutionFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new WebSocket error
    pub fn websocket<S: Into<String>>(msg: S) -> Self {
        Error::WebSocket(msg.into())
    }

    /// Create a new CDP error
    pub fn cdp<S: Into<String>>(msg: S) -> Self {
        Error::Cdp(msg.into())
    }

    /// Create a new pool preparation error
    pub fn pool_preparation<S: Into<String>>(msg: S) -> Self {
        Error::PoolPreparation(msg.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Error::Timeout(msg.into())
    }

    /// Create a new navigation failed error
    pub fn navigation_failed<S: Into<String>>(msg: S) -> Self {
        Error::NavigationFailed(msg.into())
    }

    /// Create a new script execution failed error
    pub fn script_execution_failed<S: Into<String>>(msg: S) -> Self {
        Error::ScriptExecutionFailed(msg.into())
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }

    /// HTTP status code reported to the caller for this error kind
    pub fn http_status(&self) -> StatusCode {
        match self {
            Error::CaptchaExhausted => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials | Error::LoginFailed => StatusCode::UNAUTHORIZED,
            Error::PoolExhausted => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_status_mapping() {
        assert_eq!(Error::CaptchaExhausted.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::InvalidCredentials.http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::LoginFailed.http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            Error::UnknownLoginFailure.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_pool_exhausted_maps_to_service_unavailable() {
        assert_eq!(
            Error::PoolExhausted.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_caller_facing_messages() {
        assert_eq!(Error::InvalidCredentials.to_string(), "Invalid credentials.");
        assert_eq!(Error::CaptchaExhausted.to_string(), "Captcha solving failed.");
    }
}
