// HLS Playlist Engine: resolves a stream variant's manifest url into a parsed Manifest.

use std::sync::Arc;

use bytes::Bytes;
use m3u8_rs::{MasterPlaylist, Playlist, parse_playlist_res};
use reqwest::{Client, StatusCode};
use scdl_platforms::AuthContext;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::hls::config::HlsConfig;
use crate::hls::error::ManifestError;
use crate::hls::fetcher::is_retryable_status;
use crate::hls::manifest::Manifest;

/// Indirection document returned by the platform's stream endpoints.
#[derive(Debug, Deserialize)]
struct StreamLocation {
    url: String,
}

enum PlaylistDocument {
    Indirection(Url),
    Master(MasterPlaylist),
    Media(Manifest),
}

pub struct ManifestFetcher {
    http_client: Client,
    config: Arc<HlsConfig>,
    auth: AuthContext,
}

impl ManifestFetcher {
    pub fn new(http_client: Client, config: Arc<HlsConfig>, auth: AuthContext) -> Self {
        Self {
            http_client,
            config,
            auth,
        }
    }

    /// Follows indirection documents and master playlists from `manifest_url`
    /// down to a media playlist and parses it.
    ///
    /// Requests to the host of `manifest_url` carry the caller's credentials;
    /// requests to any other host (the CDN) do not.
    pub async fn fetch(&self, manifest_url: &str) -> Result<Manifest, ManifestError> {
        let origin = Url::parse(manifest_url).map_err(|e| {
            ManifestError::ParseError(format!("invalid manifest url {manifest_url}: {e}"))
        })?;
        let mut current = origin.clone();
        let mut hops = 0;

        loop {
            let authenticated = same_host(&origin, &current);
            let body = self.fetch_with_retries(&current, authenticated).await?;

            match parse_document(&body, &current)? {
                PlaylistDocument::Media(manifest) => {
                    info!(
                        url = %current,
                        segments = manifest.len(),
                        duration = ?manifest.total_duration(),
                        "Media playlist loaded"
                    );
                    return Ok(manifest);
                }
                PlaylistDocument::Indirection(next) => {
                    debug!(from = %current, to = %next, "Following stream indirection");
                    current = next;
                }
                PlaylistDocument::Master(master) => {
                    let variant = master
                        .variants
                        .iter()
                        .max_by_key(|v| v.bandwidth)
                        .ok_or_else(|| {
                            ManifestError::ParseError("master playlist has no variants".to_string())
                        })?;
                    let next = current.join(&variant.uri).map_err(|e| {
                        ManifestError::ParseError(format!(
                            "invalid variant uri {}: {e}",
                            variant.uri
                        ))
                    })?;
                    debug!(
                        bandwidth = variant.bandwidth,
                        url = %next,
                        "Selected master playlist variant"
                    );
                    current = next;
                }
            }

            hops += 1;
            if hops > self.config.playlist_config.max_indirection_hops {
                return Err(ManifestError::ParseError(format!(
                    "too many indirections resolving {manifest_url}"
                )));
            }
        }
    }

    /// Fetches a manifest document with retry logic.
    /// Retries on network errors, server errors (5xx), 408 and 429; other
    /// client errors fail at once.
    async fn fetch_with_retries(
        &self,
        url: &Url,
        authenticated: bool,
    ) -> Result<Bytes, ManifestError> {
        let max_attempts = self.config.playlist_config.max_attempts.max(1);
        let mut last_status: Option<StatusCode> = None;
        let mut attempts = 0;

        loop {
            attempts += 1;
            let mut request = self
                .http_client
                .get(url.clone())
                .timeout(self.config.playlist_config.fetch_timeout);
            if authenticated {
                request = self.auth.apply(request);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        match response.bytes().await {
                            Ok(body) => return Ok(body),
                            Err(e) => {
                                warn!(%url, attempt = attempts, error = %e, "Manifest body read failed")
                            }
                        }
                    } else if is_retryable_status(status) {
                        warn!(%url, attempt = attempts, %status, "Manifest request failed");
                        last_status = Some(status);
                    } else {
                        return Err(ManifestError::Unreachable {
                            url: url.to_string(),
                            status: Some(status),
                            attempts,
                        });
                    }
                }
                Err(e) => {
                    if !e.is_connect() && !e.is_timeout() && !e.is_request() {
                        return Err(ManifestError::Unreachable {
                            url: url.to_string(),
                            status: e.status(),
                            attempts,
                        });
                    }
                    warn!(%url, attempt = attempts, error = %e, "Manifest request failed");
                }
            }

            if attempts >= max_attempts {
                return Err(ManifestError::Unreachable {
                    url: url.to_string(),
                    status: last_status,
                    attempts,
                });
            }

            let delay = HlsConfig::backoff(self.config.playlist_config.retry_delay_base, attempts);
            tokio::time::sleep(delay).await;
        }
    }
}

fn same_host(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme() && a.host_str() == b.host_str() && a.port() == b.port()
}

/// Classifies a fetched document: JSON indirection, master or media playlist.
fn parse_document(body: &[u8], url: &Url) -> Result<PlaylistDocument, ManifestError> {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();

    if trimmed.starts_with('{') {
        let location: StreamLocation = serde_json::from_str(trimmed).map_err(|e| {
            ManifestError::ParseError(format!("invalid stream location document: {e}"))
        })?;
        let next = url.join(&location.url).map_err(|e| {
            ManifestError::ParseError(format!("invalid stream location {}: {e}", location.url))
        })?;
        return Ok(PlaylistDocument::Indirection(next));
    }

    if !trimmed.starts_with("#EXTM3U") {
        return Err(ManifestError::ParseError(format!(
            "{url} is neither a playlist nor a stream location"
        )));
    }

    match parse_playlist_res(trimmed.as_bytes()) {
        Ok(Playlist::MasterPlaylist(master)) => Ok(PlaylistDocument::Master(master)),
        Ok(Playlist::MediaPlaylist(media)) => {
            Manifest::from_media_playlist(&media, url).map(PlaylistDocument::Media)
        }
        Err(e) => Err(ManifestError::ParseError(format!(
            "failed to parse playlist {url}: {e}"
        ))),
    }
}
