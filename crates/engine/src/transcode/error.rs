use std::path::PathBuf;

use crate::hls::AcquisitionError;

use super::codec::{AudioCodec, Quality};

#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("encoder '{program}' not found on the search path")]
    EncoderNotFound { program: PathBuf },

    #[error("encoder exited with {}: {stderr}", .exit_code.map(|c| format!("code {c}")).unwrap_or_else(|| "a signal".to_string()))]
    EncoderProcess {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("byte source failed mid-stream: {0}")]
    UpstreamStarved(#[source] AcquisitionError),

    #[error("quality {quality} is not valid for {codec}")]
    InvalidQuality { codec: AudioCodec, quality: Quality },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transcode cancelled")]
    Cancelled,
}
