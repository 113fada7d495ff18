use crate::media::{AccessTier, StreamProtocol};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StreamVariant {
    // Url to request the manifest (or its indirection document) from
    pub manifest_url: String,
    pub protocol: StreamProtocol,
    pub access: AccessTier,
    // Approximate bitrate in kbit/s, 0 when unknown or adaptive
    pub bitrate_kbps: u32,
    // Platform preset name, e.g. "mp3_1_0", "aac_160k"
    pub preset: String,
    pub mime_type: String,
    // Preview-only variant (usually 30 seconds)
    pub snipped: bool,
    pub duration: Duration,
}

impl StreamVariant {
    /// Codec family encoded in the preset name (`"aac_160k"` -> `"aac"`).
    pub fn codec_family(&self) -> &str {
        self.preset.split('_').next().unwrap_or_default()
    }

    /// Adaptive bitrate presets bundle several renditions behind one playlist.
    pub fn is_adaptive(&self) -> bool {
        self.codec_family() == "abr"
    }
}

impl fmt::Display for StreamVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) - {} kbps [{}]",
            self.preset, self.protocol, self.bitrate_kbps, self.access
        )?;
        if self.snipped {
            write!(f, " (preview)")?;
        }
        Ok(())
    }
}
