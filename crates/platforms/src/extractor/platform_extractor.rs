use crate::extractor::auth::AuthContext;
use crate::media::Track;

use super::error::ResolutionError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use tracing::debug;

const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36";

/// Base extractor shared by platform implementations.
///
/// Holds the page URL being resolved, the HTTP client, the headers every
/// platform request carries and the caller's [`AuthContext`]. Requests built
/// through [`Extractor::request`] are always authenticated.
#[derive(Debug, Clone)]
pub struct Extractor {
    // url to extract from, e.g. "https://soundcloud.com/artist/track"
    pub url: String,
    // name of the platform, e.g. "SoundCloud"
    pub platform_name: String,
    pub client: Client,
    auth: AuthContext,
    platform_headers: HeaderMap,
}

impl Extractor {
    pub fn new<S1: Into<String>, S2: Into<String>>(
        platform_name: S1,
        platform_url: S2,
        client: Client,
        auth: AuthContext,
    ) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(DEFAULT_UA),
        );
        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
        );
        default_headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );

        Self {
            platform_name: platform_name.into(),
            url: platform_url.into(),
            client,
            auth,
            platform_headers: default_headers,
        }
    }

    /// Adds a platform header. Invalid names or values are skipped with a debug log.
    pub fn add_header(&mut self, key: impl AsRef<str>, value: impl AsRef<str>) {
        match (
            key.as_ref().parse::<HeaderName>(),
            HeaderValue::from_str(value.as_ref()),
        ) {
            (Ok(name), Ok(value)) => {
                self.platform_headers.insert(name, value);
            }
            _ => debug!(header = key.as_ref(), "Skipping invalid platform header"),
        }
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Create an authenticated HTTP request carrying the platform headers.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let request = self
            .client
            .request(method, url)
            .headers(self.platform_headers.clone());
        self.auth.apply(request)
    }
}

#[async_trait]
pub trait PlatformExtractor: Send + Sync {
    fn get_extractor(&self) -> &Extractor;

    /// Resolve the page URL into track metadata and its stream variants.
    async fn extract(&self) -> Result<Track, ResolutionError>;
}
