use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::TranscodeError;

/// Output codecs the encoder can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    Mp3,
    Opus,
    Vorbis,
    Aac,
    Flac,
    Wav,
}

impl AudioCodec {
    pub const ALL: [AudioCodec; 6] = [
        AudioCodec::Mp3,
        AudioCodec::Opus,
        AudioCodec::Vorbis,
        AudioCodec::Aac,
        AudioCodec::Flac,
        AudioCodec::Wav,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "mp3",
            AudioCodec::Opus => "opus",
            AudioCodec::Vorbis => "vorbis",
            AudioCodec::Aac => "aac",
            AudioCodec::Flac => "flac",
            AudioCodec::Wav => "wav",
        }
    }

    /// Encoder implementation passed to `-c:a`.
    pub fn encoder(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "libmp3lame",
            AudioCodec::Opus => "libopus",
            AudioCodec::Vorbis => "libvorbis",
            AudioCodec::Aac => "aac",
            AudioCodec::Flac => "flac",
            AudioCodec::Wav => "pcm_s16le",
        }
    }

    /// Container muxer passed to `-f`; the temporary output name has no usable extension.
    pub fn muxer(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "mp3",
            AudioCodec::Opus | AudioCodec::Vorbis => "ogg",
            AudioCodec::Aac => "ipod",
            AudioCodec::Flac => "flac",
            AudioCodec::Wav => "wav",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "mp3",
            AudioCodec::Opus | AudioCodec::Vorbis => "ogg",
            AudioCodec::Aac => "m4a",
            AudioCodec::Flac => "flac",
            AudioCodec::Wav => "wav",
        }
    }

    /// Whether the container can carry cover art as an attached picture.
    /// Containers that take cover art as an attached picture stream. Ogg
    /// (opus, vorbis) would need a `METADATA_BLOCK_PICTURE` comment instead.
    pub fn supports_artwork(&self) -> bool {
        matches!(self, AudioCodec::Mp3 | AudioCodec::Flac | AudioCodec::Aac)
    }

    pub fn default_quality(&self) -> Quality {
        match self {
            AudioCodec::Mp3 => Quality::Bitrate(192),
            AudioCodec::Opus => Quality::Bitrate(96),
            AudioCodec::Vorbis => Quality::Scale(3),
            AudioCodec::Aac => Quality::Bitrate(192),
            AudioCodec::Flac => Quality::Compression(8),
            AudioCodec::Wav => Quality::Lossless,
        }
    }

    /// Checks that `quality` is meaningful for this codec.
    pub fn validate_quality(&self, quality: Quality) -> Result<Quality, TranscodeError> {
        let valid = match (self, quality) {
            (AudioCodec::Mp3, Quality::Bitrate(kbps)) => (32..=320).contains(&kbps),
            (AudioCodec::Mp3, Quality::Scale(q)) => q <= 9,
            (AudioCodec::Opus, Quality::Bitrate(kbps)) => (6..=510).contains(&kbps),
            (AudioCodec::Vorbis, Quality::Bitrate(kbps)) => (45..=500).contains(&kbps),
            (AudioCodec::Vorbis, Quality::Scale(q)) => q <= 10,
            (AudioCodec::Aac, Quality::Bitrate(kbps)) => (32..=512).contains(&kbps),
            (AudioCodec::Flac, Quality::Compression(level)) => level <= 12,
            (AudioCodec::Wav, Quality::Lossless) => true,
            _ => false,
        };

        if valid {
            Ok(quality)
        } else {
            Err(TranscodeError::InvalidQuality {
                codec: *self,
                quality,
            })
        }
    }
}

impl Display for AudioCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AudioCodec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mp3" => Ok(AudioCodec::Mp3),
            "opus" => Ok(AudioCodec::Opus),
            "vorbis" | "ogg" => Ok(AudioCodec::Vorbis),
            "aac" | "m4a" => Ok(AudioCodec::Aac),
            "flac" => Ok(AudioCodec::Flac),
            "wav" => Ok(AudioCodec::Wav),
            other => Err(format!(
                "unknown codec '{other}', expected one of: mp3, opus, vorbis, aac, flac, wav"
            )),
        }
    }
}

/// Codec-specific quality directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    /// Constant bitrate in kbit/s (`-b:a <n>k`)
    Bitrate(u32),
    /// Variable bitrate scale (`-qscale:a <n>`)
    Scale(u8),
    /// Lossless compression effort (`-compression_level <n>`)
    Compression(u8),
    /// No parameter, e.g. PCM
    Lossless,
}

impl Quality {
    pub fn to_args(&self) -> Vec<String> {
        match self {
            Quality::Bitrate(kbps) => vec!["-b:a".to_string(), format!("{kbps}k")],
            Quality::Scale(q) => vec!["-qscale:a".to_string(), q.to_string()],
            Quality::Compression(level) => {
                vec!["-compression_level".to_string(), level.to_string()]
            }
            Quality::Lossless => Vec::new(),
        }
    }
}

impl Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quality::Bitrate(kbps) => write!(f, "{kbps}k"),
            Quality::Scale(q) => write!(f, "q{q}"),
            Quality::Compression(level) => write!(f, "c{level}"),
            Quality::Lossless => write!(f, "lossless"),
        }
    }
}

/// Parses `192k`, `q3`, `c8` or `lossless`.
impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let invalid = || format!("invalid quality '{s}', expected e.g. 192k, q3, c8 or lossless");

        if s == "lossless" {
            return Ok(Quality::Lossless);
        }
        if let Some(kbps) = s.strip_suffix('k') {
            return kbps.parse().map(Quality::Bitrate).map_err(|_| invalid());
        }
        if let Some(q) = s.strip_prefix('q') {
            return q.parse().map(Quality::Scale).map_err(|_| invalid());
        }
        if let Some(level) = s.strip_prefix('c') {
            return level.parse().map(Quality::Compression).map_err(|_| invalid());
        }
        Err(invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        assert_eq!(AudioCodec::Mp3.encoder(), "libmp3lame");
        assert_eq!(AudioCodec::Mp3.default_quality().to_args(), vec!["-b:a", "192k"]);
        assert_eq!(AudioCodec::Opus.extension(), "ogg");
        assert_eq!(AudioCodec::Opus.default_quality().to_args(), vec!["-b:a", "96k"]);
        assert_eq!(AudioCodec::Vorbis.default_quality().to_args(), vec!["-qscale:a", "3"]);
        assert_eq!(AudioCodec::Aac.extension(), "m4a");
        assert_eq!(
            AudioCodec::Flac.default_quality().to_args(),
            vec!["-compression_level", "8"]
        );
        assert_eq!(AudioCodec::Wav.encoder(), "pcm_s16le");
        assert!(AudioCodec::Wav.default_quality().to_args().is_empty());

        for codec in AudioCodec::ALL {
            assert!(codec.validate_quality(codec.default_quality()).is_ok());
        }
    }

    #[test]
    fn test_quality_validation() {
        assert!(AudioCodec::Mp3.validate_quality(Quality::Bitrate(320)).is_ok());
        assert!(AudioCodec::Mp3.validate_quality(Quality::Bitrate(1000)).is_err());
        assert!(AudioCodec::Opus.validate_quality(Quality::Scale(3)).is_err());
        assert!(AudioCodec::Wav.validate_quality(Quality::Bitrate(128)).is_err());
        assert!(matches!(
            AudioCodec::Flac.validate_quality(Quality::Compression(13)),
            Err(TranscodeError::InvalidQuality { codec: AudioCodec::Flac, .. })
        ));
    }

    #[test]
    fn test_parse() {
        assert_eq!("OPUS".parse::<AudioCodec>(), Ok(AudioCodec::Opus));
        assert_eq!("m4a".parse::<AudioCodec>(), Ok(AudioCodec::Aac));
        assert!("wma".parse::<AudioCodec>().is_err());

        assert_eq!("160k".parse::<Quality>(), Ok(Quality::Bitrate(160)));
        assert_eq!("q5".parse::<Quality>(), Ok(Quality::Scale(5)));
        assert_eq!("c0".parse::<Quality>(), Ok(Quality::Compression(0)));
        assert_eq!("lossless".parse::<Quality>(), Ok(Quality::Lossless));
        assert!("loud".parse::<Quality>().is_err());
    }
}
