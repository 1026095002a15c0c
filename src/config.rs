//! Client configuration.
//!
//! `ClientConfig` controls how a [`NetClient`](crate::client::NetClient) issues
//! requests: how long the adapter waits, which user agent is sent and which TLS
//! hashes (if any) are pinned.
//!
//! `ClientConfig` provides defaults via [`Default`] and a fluent
//! [`ClientConfig::builder()`] that validates on `build()`.
//!
//! # Examples
//!
//! ```rust
//! use std::time::Duration;
//! use netbridge::config::ClientConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = ClientConfig::builder()
//!     .timeout(Duration::from_secs(15))
//!     .user_agent("my-app/2.0")
//!     .build()?;
//! assert_eq!(cfg.timeout, Duration::from_secs(15));
//! # Ok(()) }
//! ```
//!
//! # Fields (summary)
//! - `timeout`: adapter wait and transport timeout (default: 30 s).
//! - `text_timeout`: timeout for the text retrieval helpers (default: 10 s).
//! - `user_agent`: `User-Agent` header value.
//! - `certificate_hash` / `public_key_hash`: initial pinning hashes. Both must be set
//!   for pinning to be active.
//! - `logging`: whether the default logger emits anything.
//! - `detailed_logging`: log a line for every completed request too.

use std::fmt;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "netbridge/0.1 (+https://crates.io/crates/netbridge)";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_TEXT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub text_timeout: Duration,
    pub user_agent: String,
    pub certificate_hash: Option<String>,
    pub public_key_hash: Option<String>,
    pub logging: bool,
    pub detailed_logging: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            text_timeout: DEFAULT_TEXT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            certificate_hash: None,
            public_key_hash: None,
            logging: true,
            detailed_logging: false,
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    inner: ClientConfig,
}

impl ClientConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut ClientConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn timeout(self, d: Duration) -> Self { self.map(|c| c.timeout = d) }
    pub fn text_timeout(self, d: Duration) -> Self { self.map(|c| c.text_timeout = d) }
    pub fn user_agent<S: Into<String>>(self, ua: S) -> Self { self.map(|c| c.user_agent = ua.into()) }
    pub fn certificate_hash<S: Into<String>>(self, h: S) -> Self { self.map(|c| c.certificate_hash = Some(h.into())) }
    pub fn public_key_hash<S: Into<String>>(self, h: S) -> Self { self.map(|c| c.public_key_hash = Some(h.into())) }
    pub fn logging(self, on: bool) -> Self { self.map(|c| c.logging = on) }
    pub fn detailed_logging(self, on: bool) -> Self { self.map(|c| c.detailed_logging = on) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut ClientConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroTimeout,
    ZeroTextTimeout,
    EmptyUserAgent,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroTimeout => write!(f, "timeout must be greater than zero"),
            ConfigError::ZeroTextTimeout => write!(f, "text_timeout must be greater than zero"),
            ConfigError::EmptyUserAgent => write!(f, "user_agent must not be empty"),
        }
    }
}
impl std::error::Error for ConfigError {}

fn validate(c: &ClientConfig) -> Result<(), ConfigError> {
    if c.timeout.is_zero() {
        return Err(ConfigError::ZeroTimeout);
    }
    if c.text_timeout.is_zero() {
        return Err(ConfigError::ZeroTextTimeout);
    }
    if c.user_agent.trim().is_empty() {
        return Err(ConfigError::EmptyUserAgent);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.text_timeout, Duration::from_secs(10));
        assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
        assert!(cfg.certificate_hash.is_none());
        assert!(cfg.public_key_hash.is_none());
        assert!(cfg.logging);
        assert!(!cfg.detailed_logging);
    }

    #[test]
    fn builder_sets_fields() {
        let cfg = ClientConfig::builder()
            .timeout(Duration::from_secs(5))
            .user_agent("agent/1")
            .certificate_hash("aa")
            .public_key_hash("bb")
            .with(|c| c.detailed_logging = true)
            .build()
            .unwrap();

        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.user_agent, "agent/1");
        assert_eq!(cfg.certificate_hash.as_deref(), Some("aa"));
        assert_eq!(cfg.public_key_hash.as_deref(), Some("bb"));
        assert!(cfg.detailed_logging);
    }

    #[test]
    fn builder_rejects_invalid_values() {
        let err = ClientConfig::builder().timeout(Duration::ZERO).build().unwrap_err();
        assert_eq!(err, ConfigError::ZeroTimeout);

        let err = ClientConfig::builder().text_timeout(Duration::ZERO).build().unwrap_err();
        assert_eq!(err, ConfigError::ZeroTextTimeout);

        let err = ClientConfig::builder().user_agent("  ").build().unwrap_err();
        assert_eq!(err, ConfigError::EmptyUserAgent);
        assert_eq!(err.to_string(), "user_agent must not be empty");
    }
}
