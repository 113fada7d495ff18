use std::sync::LazyLock;

use super::auth::AuthContext;
use super::error::ResolutionError;
use super::platform_extractor::PlatformExtractor;
use crate::extractor::platforms::{self, soundcloud::SoundCloud};
use regex::Regex;
use reqwest::Client;

// A type alias for a thread-safe constructor function.
type ExtractorConstructor =
    fn(String, Client, AuthContext, Option<&str>) -> Box<dyn PlatformExtractor>;

struct PlatformEntry {
    regex: &'static LazyLock<Regex>,
    constructor: ExtractorConstructor,
}

fn new_soundcloud(
    url: String,
    client: Client,
    auth: AuthContext,
    api_base: Option<&str>,
) -> Box<dyn PlatformExtractor> {
    let extractor = SoundCloud::new(url, client, auth);
    match api_base {
        Some(base) => Box::new(extractor.with_api_base(base)),
        None => Box::new(extractor),
    }
}

// Static platform registry
static PLATFORMS: &[PlatformEntry] = &[PlatformEntry {
    regex: &platforms::soundcloud::URL_REGEX,
    constructor: new_soundcloud,
}];

/// A factory for creating platform-specific extractors.
pub struct ExtractorFactory {
    client: Client,
    api_base: Option<String>,
}

impl ExtractorFactory {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            api_base: None,
        }
    }

    /// Overrides the metadata API host of every extractor this factory creates.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn create_extractor(
        &self,
        url: &str,
        auth: AuthContext,
    ) -> Result<Box<dyn PlatformExtractor>, ResolutionError> {
        let url = url.trim();
        for platform in PLATFORMS {
            if platform.regex.is_match(url) {
                return Ok((platform.constructor)(
                    url.to_string(),
                    self.client.clone(),
                    auth,
                    self.api_base.as_deref(),
                ));
            }
        }
        Err(ResolutionError::MalformedUrl(url.to_string()))
    }
}
