use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, ORIGIN, REFERER};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36";

/// HTTP client settings shared by metadata, playlist and segment requests.
///
/// Every request is bounded by `connect_timeout` and `timeout`; segment
/// fetches additionally apply their own per-request timeout.
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Overall timeout for a request, zero for none
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Maximum time between two received body chunks
    pub read_timeout: Duration,
    pub follow_redirects: bool,
    pub user_agent: String,
    /// Sent with every request
    pub headers: HeaderMap,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(20),
            follow_redirects: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: default_headers(),
        }
    }
}

impl DownloaderConfig {
    pub fn builder() -> crate::builder::DownloaderConfigBuilder {
        crate::builder::DownloaderConfigBuilder::new()
    }
}

/// Headers the web player sends; the CDN rejects some requests without them.
pub fn default_headers() -> HeaderMap {
    [
        (ACCEPT, "*/*"),
        (ACCEPT_LANGUAGE, "en-US,en;q=0.9"),
        (ORIGIN, "https://soundcloud.com"),
        (REFERER, "https://soundcloud.com/"),
    ]
    .into_iter()
    .map(|(name, value)| (name, HeaderValue::from_static(value)))
    .collect()
}
