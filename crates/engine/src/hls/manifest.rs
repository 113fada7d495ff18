// HLS Manifest: the ordered list of segment locations of one media playlist.

use std::collections::HashMap;
use std::time::Duration;

use m3u8_rs::{KeyMethod, MediaPlaylist};
use tracing::debug;
use url::Url;

use super::error::ManifestError;

/// A byte sub-range of a resource, `length` bytes starting at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: u64,
    pub length: u64,
}

impl ByteRange {
    /// Validated sub-range: non-empty and ending within `u64`.
    pub fn new(offset: u64, length: u64) -> Result<Self, ManifestError> {
        if length == 0 {
            return Err(ManifestError::ParseError(format!(
                "empty byte range at offset {offset}"
            )));
        }
        if offset.checked_add(length).is_none() {
            return Err(ManifestError::ParseError(format!(
                "byte range {length}@{offset} overflows"
            )));
        }
        Ok(Self { offset, length })
    }

    /// Offset one past the last byte.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.length)
    }

    /// `Range` header value for this sub-range.
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.offset, self.end().saturating_sub(1))
    }
}

/// Location of one segment, in playback order.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRef {
    pub index: u64,
    pub url: Url,
    pub byte_range: Option<ByteRange>,
    pub duration: Duration,
    /// Initialization section (`#EXT-X-MAP`) rather than a media segment
    pub is_init: bool,
}

impl SegmentRef {
    pub fn expected_size(&self) -> Option<u64> {
        self.byte_range.map(|r| r.length)
    }
}

#[derive(Debug, Clone)]
pub struct Manifest {
    pub url: Url,
    segments: Vec<SegmentRef>,
}

impl Manifest {
    /// Builds the manifest of a parsed media playlist.
    ///
    /// Segment URIs are resolved against `playlist_url`. An initialization
    /// section becomes segment 0. Encrypted playlists are rejected.
    pub fn from_media_playlist(
        playlist: &MediaPlaylist,
        playlist_url: &Url,
    ) -> Result<Self, ManifestError> {
        if playlist.segments.is_empty() {
            return Err(ManifestError::EmptyPlaylist);
        }

        let mut segments = Vec::with_capacity(playlist.segments.len() + 1);
        // end offset of the previous sub-range, per resolved url
        let mut range_ends: HashMap<Url, u64> = HashMap::new();
        let mut last_map: Option<(Url, Option<ByteRange>)> = None;

        for segment in &playlist.segments {
            if let Some(key) = &segment.key
                && key.method != KeyMethod::None
            {
                return Err(ManifestError::ParseError(format!(
                    "encrypted segments are not supported (method {:?})",
                    key.method
                )));
            }

            if let Some(map) = &segment.map {
                let url = resolve_uri(playlist_url, &map.uri)?;
                let byte_range = map
                    .byte_range
                    .as_ref()
                    .map(|r| ByteRange::new(r.offset.unwrap_or(0), r.length))
                    .transpose()?;
                let current = (url, byte_range);
                if last_map.as_ref() != Some(&current) {
                    debug!(url = %current.0, "Initialization section found");
                    segments.push(SegmentRef {
                        index: segments.len() as u64,
                        url: current.0.clone(),
                        byte_range: current.1,
                        duration: Duration::ZERO,
                        is_init: true,
                    });
                    last_map = Some(current);
                }
            }

            let url = resolve_uri(playlist_url, &segment.uri)?;
            let byte_range = match &segment.byte_range {
                Some(range) => {
                    // Without an explicit offset the sub-range continues the previous one
                    let offset = range
                        .offset
                        .or_else(|| range_ends.get(&url).copied())
                        .unwrap_or(0);
                    let byte_range = ByteRange::new(offset, range.length)?;
                    range_ends.insert(url.clone(), byte_range.end());
                    Some(byte_range)
                }
                None => None,
            };

            segments.push(SegmentRef {
                index: segments.len() as u64,
                url,
                byte_range,
                duration: Duration::try_from_secs_f32(segment.duration).unwrap_or_default(),
                is_init: false,
            });
        }

        Ok(Self {
            url: playlist_url.clone(),
            segments,
        })
    }

    pub fn segments(&self) -> &[SegmentRef] {
        &self.segments
    }

    /// Total expected segment count, initialization section included.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn total_duration(&self) -> Duration {
        self.segments.iter().map(|s| s.duration).sum()
    }
}

fn resolve_uri(base: &Url, uri: &str) -> Result<Url, ManifestError> {
    base.join(uri.trim())
        .map_err(|e| ManifestError::ParseError(format!("invalid segment uri {uri}: {e}")))
}
