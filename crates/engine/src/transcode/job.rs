use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::codec::{AudioCodec, Quality};
use super::error::TranscodeError;

/// Tags written into the output container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub title: Option<String>,
    pub artist: Option<String>,
}

/// One encoder run: codec, quality and where the result goes.
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    pub codec: AudioCodec,
    pub quality: Quality,
    pub output_path: PathBuf,
    pub tags: TrackTags,
    pub artwork_url: Option<String>,
}

impl TranscodeJob {
    /// Job with the codec's default quality.
    pub fn new(codec: AudioCodec, output_path: impl Into<PathBuf>) -> Self {
        Self {
            codec,
            quality: codec.default_quality(),
            output_path: output_path.into(),
            tags: TrackTags::default(),
            artwork_url: None,
        }
    }

    pub fn with_quality(mut self, quality: Quality) -> Result<Self, TranscodeError> {
        self.quality = self.codec.validate_quality(quality)?;
        Ok(self)
    }

    pub fn with_tags(mut self, tags: TrackTags) -> Self {
        self.tags = tags;
        self
    }

    /// Cover art to attach. Ignored for containers without picture support.
    pub fn with_artwork(mut self, artwork_url: Option<String>) -> Self {
        self.artwork_url = artwork_url;
        self
    }

    /// Sibling path the encoder writes to before the result is moved into place.
    pub fn part_path(&self) -> PathBuf {
        let mut name = self
            .output_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("output"));
        name.push(".part");
        self.output_path.with_file_name(name)
    }

    fn artwork(&self) -> Option<&str> {
        self.artwork_url
            .as_deref()
            .filter(|_| self.codec.supports_artwork())
    }

    /// Encoder arguments: raw stream on stdin, progress on stdout, result at `output`.
    pub fn encoder_args(&self, output: &Path, extra_args: &[String]) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error", "-y"]
            .into_iter()
            .map(OsString::from)
            .collect();

        args.extend(["-i", "pipe:0"].map(OsString::from));
        if let Some(artwork) = self.artwork() {
            args.extend(["-i", artwork].map(OsString::from));
            args.extend(["-map", "0:a", "-map", "1:v", "-c:v", "copy"].map(OsString::from));
            args.extend(["-disposition:v:0", "attached_pic"].map(OsString::from));
        } else {
            args.extend(["-map", "0:a", "-vn"].map(OsString::from));
        }

        args.extend(["-c:a", self.codec.encoder()].map(OsString::from));
        args.extend(self.quality.to_args().into_iter().map(OsString::from));

        if let Some(title) = &self.tags.title {
            args.push("-metadata".into());
            args.push(format!("title={title}").into());
        }
        if let Some(artist) = &self.tags.artist {
            args.push("-metadata".into());
            args.push(format!("artist={artist}").into());
        }

        args.extend(extra_args.iter().map(OsString::from));
        args.extend(["-progress", "pipe:1", "-nostats"].map(OsString::from));
        args.extend(["-f", self.codec.muxer()].map(OsString::from));
        args.push(output.as_os_str().to_os_string());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_part_path() {
        let job = TranscodeJob::new(AudioCodec::Opus, "/music/Song.ogg");
        assert_eq!(job.part_path(), PathBuf::from("/music/Song.ogg.part"));
    }

    #[test]
    fn test_encoder_args() {
        let job = TranscodeJob::new(AudioCodec::Opus, "/music/Song.ogg").with_tags(TrackTags {
            title: Some("Song".to_string()),
            artist: Some("Artist".to_string()),
        });
        let args = as_strings(&job.encoder_args(Path::new("/music/Song.ogg.part"), &[]));

        assert_eq!(args.last().map(String::as_str), Some("/music/Song.ogg.part"));
        let joined = args.join(" ");
        assert!(joined.contains("-i pipe:0"));
        assert!(joined.contains("-c:a libopus -b:a 96k"));
        assert!(joined.contains("-metadata title=Song"));
        assert!(joined.contains("-progress pipe:1"));
        assert!(joined.contains("-f ogg"));
    }

    #[test]
    fn test_artwork_only_for_supported_containers() {
        let artwork = Some("https://i1.sndcdn.com/a-t500x500.jpg".to_string());

        let mp3 = TranscodeJob::new(AudioCodec::Mp3, "a.mp3").with_artwork(artwork.clone());
        let args = as_strings(&mp3.encoder_args(Path::new("a.mp3.part"), &[]));
        assert!(args.join(" ").contains("-map 1:v"));

        let opus = TranscodeJob::new(AudioCodec::Opus, "a.ogg").with_artwork(artwork);
        let args = as_strings(&opus.encoder_args(Path::new("a.ogg.part"), &[]));
        assert!(!args.join(" ").contains("1:v"));
    }

    #[test]
    fn test_with_quality_validates() {
        assert!(
            TranscodeJob::new(AudioCodec::Mp3, "a.mp3")
                .with_quality(Quality::Bitrate(320))
                .is_ok()
        );
        assert!(
            TranscodeJob::new(AudioCodec::Wav, "a.wav")
                .with_quality(Quality::Bitrate(320))
                .is_err()
        );
    }
}
