//! Configuration management for vtop-relay

use crate::{Error, Result};
use serde::Deserialize;
use std::env;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Number of sessions kept pre-warmed in the pool
    pub pool_size: usize,

    /// Overflow sessions allowed beyond the pool before requests are rejected
    pub max_overflow: usize,

    /// Captcha retry budget for pre-warmed sessions
    pub pooled_captcha_retries: u32,

    /// Captcha retry budget for overflow (cold) sessions
    pub cold_captcha_retries: u32,

    /// Pause between captcha retries in milliseconds
    pub retry_pause_ms: u64,

    /// Best-effort page settle wait in milliseconds
    pub settle_timeout_ms: u64,

    /// Bounded wait for element visibility in milliseconds
    pub selector_timeout_ms: u64,

    /// DevTools HTTP endpoint of the backing browser
    pub devtools_endpoint: String,

    /// Pre-login page the challenge is served from
    pub prelogin_url: String,

    /// URL prefix of the authenticated content area
    pub content_url_prefix: String,

    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            pool_size: 3,
            max_overflow: 4,
            pooled_captcha_retries: 5,
            cold_captcha_retries: 20,
            retry_pause_ms: 500,
            settle_timeout_ms: 3000,
            selector_timeout_ms: 10000,
            devtools_endpoint: "http://localhost:9222".to_string(),
            prelogin_url: "https://vtop.vit.ac.in/vtop/prelogin/setup?flag=VTOP".to_string(),
            content_url_prefix: "https://vtop.vit.ac.in/vtop/content".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(host) = env::var("VTOP_RELAY_HOST") {
            config.host = host;
        }

        // Legacy PORT is honored, VTOP_RELAY_PORT wins
        if let Ok(port) = env::var("PORT") {
            config.port = port
                .parse()
                .map_err(|_| Error::configuration("Invalid PORT"))?;
        }

        if let Ok(port) = env::var("VTOP_RELAY_PORT") {
            config.port = port
                .parse()
                .map_err(|_| Error::configuration("Invalid VTOP_RELAY_PORT"))?;
        }

        if let Ok(pool_size) = env::var("VTOP_RELAY_POOL_SIZE") {
            config.pool_size = pool_size
                .parse()
                .map_err(|_| Error::configuration("Invalid VTOP_RELAY_POOL_SIZE"))?;
        }

        if let Ok(max_overflow) = env::var("VTOP_RELAY_MAX_OVERFLOW") {
            config.max_overflow = max_overflow
                .parse()
                .map_err(|_| Error::configuration("Invalid VTOP_RELAY_MAX_OVERFLOW"))?;
        }

        if let Ok(retries) = env::var("VTOP_RELAY_POOLED_RETRIES") {
            config.pooled_captcha_retries = retries
                .parse()
                .map_err(|_| Error::configuration("Invalid VTOP_RELAY_POOLED_RETRIES"))?;
        }

        if let Ok(retries) = env::var("VTOP_RELAY_COLD_RETRIES") {
            config.cold_captcha_retries = retries
                .parse()
                .map_err(|_| Error::configuration("Invalid VTOP_RELAY_COLD_RETRIES"))?;
        }

        if let Ok(pause) = env::var("VTOP_RELAY_RETRY_PAUSE_MS") {
            config.retry_pause_ms = pause
                .parse()
                .map_err(|_| Error::configuration("Invalid VTOP_RELAY_RETRY_PAUSE_MS"))?;
        }

        if let Ok(timeout) = env::var("VTOP_RELAY_SETTLE_TIMEOUT_MS") {
            config.settle_timeout_ms = timeout
                .parse()
                .map_err(|_| Error::configuration("Invalid VTOP_RELAY_SETTLE_TIMEOUT_MS"))?;
        }

        if let Ok(timeout) = env::var("VTOP_RELAY_SELECTOR_TIMEOUT_MS") {
            config.selector_timeout_ms = timeout
                .parse()
                .map_err(|_| Error::configuration("Invalid VTOP_RELAY_SELECTOR_TIMEOUT_MS"))?;
        }

        if let Ok(endpoint) = env::var("VTOP_RELAY_DEVTOOLS") {
            config.devtools_endpoint = endpoint;
        }

        if let Ok(url) = env::var("VTOP_RELAY_PRELOGIN_URL") {
            config.prelogin_url = url;
        }

        if let Ok(prefix) = env::var("VTOP_RELAY_CONTENT_URL_PREFIX") {
            config.content_url_prefix = prefix;
        }

        if let Ok(log_level) = env::var("VTOP_RELAY_LOG_LEVEL") {
            config.log_level = log_level;
        }

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::configuration(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.pool_size, 3);
        assert!(config.cold_captcha_retries > config.pooled_captcha_retries);
    }

    #[test]
    fn test_from_file() {
        let toml = r#"
            host = "127.0.0.1"
            port = 9000
            pool_size = 5
            max_overflow = 2
            pooled_captcha_retries = 3
            cold_captcha_retries = 10
            retry_pause_ms = 250
            settle_timeout_ms = 2000
            selector_timeout_ms = 8000
            devtools_endpoint = "http://localhost:9223"
            prelogin_url = "https://vtop.vit.ac.in/vtop/prelogin/setup?flag=VTOP"
            content_url_prefix = "https://vtop.vit.ac.in/vtop/content"
            log_level = "debug"
        "#;

        let dir = std::env::temp_dir().join("vtop-relay-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, toml).unwrap();

        let config = Config::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.pool_size, 5);
        assert_eq!(config.retry_pause_ms, 250);
    }
}
