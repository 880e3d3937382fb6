use std::time::Duration;

use clap::Parser;
use thiserror::Error;

/// Debug relay — rate-limited, cached LLM code-debugging endpoint.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Config {
    /// Listen address (e.g. ":8000" or "0.0.0.0:8000")
    #[arg(long, default_value = ":8000", env = "ADDR")]
    pub addr: String,

    /// Log format: "text" or "json"
    #[arg(long, default_value = "text", env = "LOG_FORMAT")]
    pub log_format: String,

    /// File that ERROR events are appended to
    #[arg(long, default_value = "backend_errors.log", env = "ERROR_LOG")]
    pub error_log: String,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible completion API
    #[arg(long, default_value = "https://api.openai.com", env = "OPENAI_BASE_URL")]
    pub openai_base_url: String,

    /// Model identifier sent with every completion request
    #[arg(long, default_value = "gpt-3.5-turbo", env = "MODEL")]
    pub model: String,

    /// Maximum number of tokens the model may generate
    #[arg(long, default_value_t = 500, env = "MAX_TOKENS")]
    pub max_tokens: u32,

    /// Seconds to wait for the completion API before giving up
    #[arg(long, default_value_t = 60, env = "UPSTREAM_TIMEOUT_SECS")]
    pub upstream_timeout_secs: u64,

    /// Maximum number of cached responses
    #[arg(long, default_value_t = 100, env = "CACHE_CAPACITY")]
    pub cache_capacity: usize,

    /// Seconds a cached response stays valid
    #[arg(long, default_value_t = 300, env = "CACHE_TTL_SECS")]
    pub cache_ttl_secs: u64,

    /// Requests allowed per client within one rate-limit window
    #[arg(long, default_value_t = 5, env = "RATE_LIMIT_REQUESTS")]
    pub rate_limit_requests: u32,

    /// Length of the rolling rate-limit window in seconds
    #[arg(long, default_value_t = 60, env = "RATE_LIMIT_WINDOW_SECS")]
    pub rate_limit_window_secs: u64,
}

/// Startup configuration errors. All of them are fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY is required")]
    MissingApiKey,
}

impl Config {
    /// The provider credential, rejecting an unset or blank value.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        match self.openai_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ConfigError::MissingApiKey),
        }
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

/// Convert Go-style ":8000" to "0.0.0.0:8000".
pub fn normalize_addr(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["debug-relay"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_match_original_limits() {
        let config = parse(&["--openai-api-key", "sk-test"]);
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert_eq!(config.max_tokens, 500);
        assert_eq!(config.cache_capacity, 100);
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.rate_limit_requests, 5);
        assert_eq!(config.rate_limit_window(), Duration::from_secs(60));
    }

    #[test]
    fn test_api_key_present() {
        let config = parse(&["--openai-api-key", " sk-test "]);
        assert_eq!(config.api_key(), Ok("sk-test"));
    }

    #[test]
    fn test_api_key_blank_is_missing() {
        let config = parse(&["--openai-api-key", "   "]);
        assert_eq!(config.api_key(), Err(ConfigError::MissingApiKey));
    }

    #[test]
    fn test_normalize_addr() {
        assert_eq!(normalize_addr(":8000"), "0.0.0.0:8000");
        assert_eq!(normalize_addr("127.0.0.1:9000"), "127.0.0.1:9000");
    }
}
