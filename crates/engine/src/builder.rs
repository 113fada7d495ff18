//! Fluent construction of [`DownloaderConfig`].
//!
//! ```
//! use std::time::Duration;
//! use scdl_engine::DownloaderConfig;
//!
//! let config = DownloaderConfig::builder()
//!     .with_timeout(Duration::from_secs(60))
//!     .with_header("X-Forwarded-For", "10.0.0.1")
//!     .build();
//! assert_eq!(config.timeout, Duration::from_secs(60));
//! assert!(config.headers.contains_key("referer"));
//! ```

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, warn};

use crate::DownloaderConfig;

#[derive(Debug, Clone, Default)]
pub struct DownloaderConfigBuilder {
    config: DownloaderConfig,
}

impl DownloaderConfigBuilder {
    /// Starts from the defaults, including the browser-like default headers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Upper bound for a whole request. Zero disables it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Longest pause allowed between two body chunks.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.config.follow_redirects = follow;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Sets one header, replacing a default of the same name. Invalid pairs are skipped.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let (name, value) = (name.as_ref(), value.as_ref());
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.config.headers.insert(name, value);
            }
            _ => warn!(name, "Skipping invalid header"),
        }
        self
    }

    /// Layers `headers` over the current set; values in `headers` win.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        for (name, value) in headers.iter() {
            self.config.headers.insert(name.clone(), value.clone());
        }
        self
    }

    /// Drops every header set so far, defaults included.
    pub fn without_default_headers(mut self) -> Self {
        self.config.headers.clear();
        self
    }

    /// Finishes the config. A read timeout longer than the overall timeout is capped.
    pub fn build(mut self) -> DownloaderConfig {
        let config = &mut self.config;
        if !config.timeout.is_zero() && config.read_timeout > config.timeout {
            debug!(
                read_timeout = ?config.read_timeout,
                timeout = ?config.timeout,
                "Capping read timeout to the overall timeout"
            );
            config.read_timeout = config.timeout;
        }
        self.config
    }
}
