use std::cmp::Reverse;

use tracing::{debug, warn};

use super::auth::AuthContext;
use super::error::NoPlayableStreamError;
use crate::media::{AccessTier, StreamVariant, Track};

/// Picks the variant to download.
///
/// Only plain HLS variants the caller is entitled to are considered; adaptive
/// presets are skipped. Full-length variants win over previews, then the
/// highest bitrate, then a preset in `preferred_codec`'s family. Remaining
/// ties keep the platform's order.
pub fn select_stream(
    track: &Track,
    auth: &AuthContext,
    preferred_codec: Option<&str>,
) -> Result<StreamVariant, NoPlayableStreamError> {
    let fail = |reason: &str| NoPlayableStreamError {
        track_id: track.id,
        reason: reason.to_string(),
    };

    if track.streams.is_empty() {
        return Err(fail("the track offers no streams"));
    }

    let hls = track
        .streams
        .iter()
        .filter(|v| v.protocol.is_plain_hls() && !v.is_adaptive())
        .collect::<Vec<_>>();
    if hls.is_empty() {
        return Err(fail("no unencrypted HLS stream is available"));
    }

    let entitled = hls
        .into_iter()
        .filter(|v| v.access == AccessTier::Public || auth.has_elevated_access())
        .collect::<Vec<_>>();
    if entitled.is_empty() {
        return Err(fail("every HLS stream requires an elevated access token"));
    }

    let has_full = entitled.iter().any(|v| !v.snipped);
    let preferred = preferred_codec.map(str::to_lowercase);

    let selected = entitled
        .into_iter()
        .enumerate()
        .filter(|(_, v)| !has_full || !v.snipped)
        .max_by_key(|(i, v)| {
            let codec_match = preferred
                .as_deref()
                .is_some_and(|codec| v.codec_family() == codec);
            (v.bitrate_kbps, codec_match, v.access, Reverse(*i))
        })
        .map(|(_, v)| v.clone())
        .ok_or_else(|| fail("no candidate stream left"))?;

    if selected.snipped {
        warn!(
            track_id = track.id,
            preview_only = track.is_preview_only(),
            "Only a preview stream is available"
        );
    }
    debug!(track_id = track.id, variant = %selected, "Selected stream");
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::StreamProtocol;
    use std::time::Duration;

    fn variant(
        preset: &str,
        protocol: StreamProtocol,
        access: AccessTier,
        kbps: u32,
    ) -> StreamVariant {
        StreamVariant {
            manifest_url: format!("https://api.example.com/{preset}"),
            protocol,
            access,
            bitrate_kbps: kbps,
            preset: preset.to_string(),
            mime_type: String::new(),
            snipped: false,
            duration: Duration::from_secs(30),
        }
    }

    fn track(streams: Vec<StreamVariant>) -> Track {
        Track {
            id: 7,
            title: "t".to_string(),
            artist: "a".to_string(),
            duration: Duration::from_secs(30),
            permalink_url: "https://soundcloud.com/a/t".to_string(),
            artwork_url: None,
            policy: None,
            streams,
        }
    }

    #[test]
    fn test_picks_highest_entitled_bitrate() {
        let t = track(vec![
            variant("mp3_0_0", StreamProtocol::Hls, AccessTier::Public, 128),
            variant("aac_160k", StreamProtocol::Hls, AccessTier::Elevated, 160),
            variant("opus_0_0", StreamProtocol::Hls, AccessTier::Public, 64),
        ]);

        let public = select_stream(&t, &AuthContext::new("cid"), None).unwrap();
        assert_eq!(public.preset, "mp3_0_0");

        let elevated = AuthContext::new("cid").with_access_token("tok");
        let hq = select_stream(&t, &elevated, None).unwrap();
        assert_eq!(hq.preset, "aac_160k");
    }

    #[test]
    fn test_elevated_only_without_token_fails() {
        let t = track(vec![variant(
            "aac_160k",
            StreamProtocol::Hls,
            AccessTier::Elevated,
            160,
        )]);
        let err = select_stream(&t, &AuthContext::new("cid"), None).unwrap_err();
        assert_eq!(err.track_id, 7);
        assert!(err.reason.contains("elevated"));
    }

    #[test]
    fn test_skips_non_hls_encrypted_and_adaptive() {
        let t = track(vec![
            variant("mp3_0_0", StreamProtocol::Progressive, AccessTier::Public, 128),
            variant("aac_160k", StreamProtocol::EncryptedHls, AccessTier::Public, 160),
            variant("abr_sq", StreamProtocol::Hls, AccessTier::Public, 0),
        ]);
        assert!(select_stream(&t, &AuthContext::new("cid"), None).is_err());

        assert!(select_stream(&track(vec![]), &AuthContext::new("cid"), None).is_err());
    }

    #[test]
    fn test_preview_only_used_as_last_resort() {
        let mut preview = variant("mp3_0_0", StreamProtocol::Hls, AccessTier::Public, 128);
        preview.snipped = true;
        let full = variant("opus_0_0", StreamProtocol::Hls, AccessTier::Public, 64);

        let t = track(vec![preview.clone(), full]);
        let selected = select_stream(&t, &AuthContext::new("cid"), None).unwrap();
        assert_eq!(selected.preset, "opus_0_0");

        let t = track(vec![preview]);
        let selected = select_stream(&t, &AuthContext::new("cid"), None).unwrap();
        assert!(selected.snipped);
    }

    #[test]
    fn test_codec_preference_breaks_ties() {
        let t = track(vec![
            variant("mp3_0_0", StreamProtocol::Hls, AccessTier::Public, 128),
            variant("opus_0_0", StreamProtocol::Hls, AccessTier::Public, 128),
        ]);
        let auth = AuthContext::new("cid");

        assert_eq!(select_stream(&t, &auth, None).unwrap().preset, "mp3_0_0");
        assert_eq!(
            select_stream(&t, &auth, Some("opus")).unwrap().preset,
            "opus_0_0"
        );
    }
}
