use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::{
    extractor::{
        auth::AuthContext,
        error::ResolutionError,
        platform_extractor::{Extractor, PlatformExtractor},
        platforms::soundcloud::models::{ResolveResponse, Transcoding},
    },
    media::{AccessTier, StreamProtocol, StreamVariant, Track},
};

pub static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:www\.|m\.)?soundcloud\.com/([A-Za-z0-9_-]+)/([A-Za-z0-9_-]+)/?(?:[?#].*)?$",
    )
    .unwrap()
});

pub const DEFAULT_API_BASE: &str = "https://api-v2.soundcloud.com";

pub struct SoundCloud {
    pub extractor: Extractor,
    api_base: String,
}

impl SoundCloud {
    const BASE_URL: &'static str = "https://soundcloud.com";

    pub fn new(url: String, client: Client, auth: AuthContext) -> Self {
        let mut extractor = Extractor::new("SoundCloud", url, client, auth);
        extractor.add_header(reqwest::header::ORIGIN.as_str(), Self::BASE_URL);
        extractor.add_header(reqwest::header::REFERER.as_str(), Self::BASE_URL);
        Self {
            extractor,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Points metadata requests at another API host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Validates the page URL and returns its canonical form, without query or fragment.
    pub fn canonical_url(&self) -> Result<String, ResolutionError> {
        let caps = URL_REGEX
            .captures(self.extractor.url.trim())
            .ok_or_else(|| ResolutionError::MalformedUrl(self.extractor.url.clone()))?;
        Ok(format!("{}/{}/{}", Self::BASE_URL, &caps[1], &caps[2]))
    }

    pub async fn resolve(&self, track_url: &str) -> Result<ResolveResponse, ResolutionError> {
        let resolve_url = format!("{}/resolve", self.api_base);
        let response = self
            .extractor
            .get(&resolve_url)
            .query(&[("url", track_url)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, url = track_url, "Resolve request rejected");
            return Err(ResolutionError::from_status(status));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn build_track(&self, data: ResolveResponse) -> Result<Track, ResolutionError> {
        if let Some(kind) = data.kind.as_deref()
            && kind != "track"
        {
            return Err(ResolutionError::MalformedUrl(format!(
                "{} resolves to a {kind}, not a track",
                self.extractor.url
            )));
        }

        let (Some(title), Some(duration)) = (data.title, data.duration) else {
            return Err(ResolutionError::Upstream {
                status: None,
                message: "track data is missing title or duration".to_string(),
            });
        };

        let track_authorization = data.track_authorization.as_deref();
        let streams = data
            .media
            .transcodings
            .iter()
            .filter_map(|t| to_variant(t, track_authorization))
            .collect::<Vec<_>>();

        Ok(Track {
            id: data.id.unwrap_or_default(),
            title,
            artist: data.user.map(|u| u.username).unwrap_or_default(),
            duration: Duration::from_millis(duration),
            permalink_url: data
                .permalink_url
                .unwrap_or_else(|| self.extractor.url.clone()),
            artwork_url: data.artwork_url.map(|url| upgrade_artwork(&url)),
            policy: data.policy,
            streams,
        })
    }
}

/// Maps a transcoding entry to a variant. Unknown protocols are dropped.
fn to_variant(transcoding: &Transcoding, track_authorization: Option<&str>) -> Option<StreamVariant> {
    let Ok(protocol) = transcoding.format.protocol.parse::<StreamProtocol>() else {
        debug!(
            protocol = %transcoding.format.protocol,
            preset = %transcoding.preset,
            "Skipping transcoding with unknown protocol"
        );
        return None;
    };

    Some(StreamVariant {
        manifest_url: authorize_url(&transcoding.url, track_authorization),
        protocol,
        access: AccessTier::from_quality(&transcoding.quality),
        bitrate_kbps: preset_bitrate(&transcoding.preset),
        preset: transcoding.preset.clone(),
        mime_type: transcoding.format.mime_type.clone(),
        snipped: transcoding.snipped,
        duration: Duration::from_millis(transcoding.duration),
    })
}

/// Approximate bitrate of a preset. An explicit `<n>k` part wins over the family default.
pub(crate) fn preset_bitrate(preset: &str) -> u32 {
    let mut parts = preset.split('_');
    let family = parts.next().unwrap_or_default();

    let explicit = parts
        .filter_map(|p| p.strip_suffix('k'))
        .find_map(|n| n.parse::<u32>().ok());
    if let Some(kbps) = explicit {
        return kbps;
    }

    match family {
        "mp3" => 128,
        "opus" => 64,
        "aac" => 160,
        _ => 0,
    }
}

fn authorize_url(url: &str, track_authorization: Option<&str>) -> String {
    let Some(token) = track_authorization else {
        return url.to_string();
    };
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed
                .query_pairs_mut()
                .append_pair("track_authorization", token);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}

// "-large" thumbnails are 100x100
fn upgrade_artwork(url: &str) -> String {
    url.replace("-large.", "-t500x500.")
}

#[async_trait::async_trait]
impl PlatformExtractor for SoundCloud {
    fn get_extractor(&self) -> &Extractor {
        &self.extractor
    }

    async fn extract(&self) -> Result<Track, ResolutionError> {
        let track_url = self.canonical_url()?;
        debug!(url = %track_url, "Resolving track");

        let data = self.resolve(&track_url).await?;
        let track = self.build_track(data)?;
        debug!(
            id = track.id,
            title = %track.title,
            variants = track.streams.len(),
            "Resolved track"
        );
        Ok(track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soundcloud(url: &str) -> SoundCloud {
        SoundCloud::new(url.to_string(), Client::new(), AuthContext::new("cid"))
    }

    #[test]
    fn test_url_regex() {
        assert!(URL_REGEX.is_match("https://soundcloud.com/artist/track-name"));
        assert!(URL_REGEX.is_match("https://www.soundcloud.com/artist/track_name/"));
        assert!(URL_REGEX.is_match("https://m.soundcloud.com/artist/track?in=x"));
        assert!(URL_REGEX.is_match("soundcloud.com/artist/track"));
        assert!(!URL_REGEX.is_match("https://soundcloud.com/artist"));
        assert!(!URL_REGEX.is_match("https://example.com/artist/track"));
        assert!(!URL_REGEX.is_match("https://soundcloud.com/artist/sets/album/extra"));
    }

    #[test]
    fn test_canonical_url_strips_query() {
        let sc = soundcloud("https://m.soundcloud.com/artist/song/?si=abc");
        assert_eq!(
            sc.canonical_url().unwrap(),
            "https://soundcloud.com/artist/song"
        );

        let sc = soundcloud("not a url");
        assert!(matches!(
            sc.canonical_url(),
            Err(ResolutionError::MalformedUrl(_))
        ));
    }

    #[test]
    fn test_preset_bitrate() {
        assert_eq!(preset_bitrate("aac_160k"), 160);
        assert_eq!(preset_bitrate("mp3_1_0"), 128);
        assert_eq!(preset_bitrate("mp3_0_0"), 128);
        assert_eq!(preset_bitrate("opus_0_0"), 64);
        assert_eq!(preset_bitrate("abr_sq"), 0);
        assert_eq!(preset_bitrate(""), 0);
    }

    #[test]
    fn test_authorize_url() {
        assert_eq!(
            authorize_url("https://api.example.com/media/1/stream/hls", Some("tok")),
            "https://api.example.com/media/1/stream/hls?track_authorization=tok"
        );
        assert_eq!(
            authorize_url("https://api.example.com/media/1/stream/hls", None),
            "https://api.example.com/media/1/stream/hls"
        );
    }

    #[test]
    fn test_build_track() {
        let body = r#"{
            "kind": "track",
            "id": 42,
            "title": "Song",
            "duration": 185000,
            "permalink_url": "https://soundcloud.com/artist/song",
            "artwork_url": "https://i1.sndcdn.com/artworks-abc-large.jpg",
            "policy": "ALLOW",
            "track_authorization": "auth",
            "user": { "username": "Artist" },
            "media": { "transcodings": [
                { "url": "https://api.example.com/t/1", "preset": "aac_160k", "duration": 185000,
                  "snipped": false, "quality": "hq",
                  "format": { "protocol": "hls", "mime_type": "audio/mp4; codecs=\"mp4a.40.2\"" } },
                { "url": "https://api.example.com/t/2", "preset": "opus_0_0", "duration": 185000,
                  "snipped": false, "quality": "sq",
                  "format": { "protocol": "ctr-encrypted-hls", "mime_type": "audio/ogg" } },
                { "url": "https://api.example.com/t/3", "preset": "mp3_0_0", "duration": 185000,
                  "snipped": false, "quality": "sq",
                  "format": { "protocol": "dash", "mime_type": "audio/mpeg" } }
            ] }
        }"#;
        let data: ResolveResponse = serde_json::from_str(body).unwrap();
        let track = soundcloud("https://soundcloud.com/artist/song")
            .build_track(data)
            .unwrap();

        assert_eq!(track.id, 42);
        assert_eq!(track.artist, "Artist");
        assert_eq!(track.duration, Duration::from_secs(185));
        assert_eq!(
            track.artwork_url.as_deref(),
            Some("https://i1.sndcdn.com/artworks-abc-t500x500.jpg")
        );
        assert_eq!(track.streams.len(), 2);
        assert_eq!(track.streams[0].access, AccessTier::Elevated);
        assert_eq!(track.streams[0].bitrate_kbps, 160);
        assert!(
            track.streams[0]
                .manifest_url
                .ends_with("?track_authorization=auth")
        );
        assert_eq!(track.streams[1].protocol, StreamProtocol::EncryptedHls);
    }

    #[test]
    fn test_build_track_rejects_playlists_and_missing_fields() {
        let sc = soundcloud("https://soundcloud.com/artist/album");

        let data: ResolveResponse =
            serde_json::from_str(r#"{ "kind": "playlist", "title": "x", "duration": 1 }"#).unwrap();
        assert!(matches!(
            sc.build_track(data),
            Err(ResolutionError::MalformedUrl(_))
        ));

        let data: ResolveResponse =
            serde_json::from_str(r#"{ "kind": "track", "title": "x" }"#).unwrap();
        assert!(matches!(
            sc.build_track(data),
            Err(ResolutionError::Upstream { .. })
        ));
    }
}
