use scdl_platforms::{NoPlayableStreamError, ResolutionError};

use crate::hls::{AcquisitionError, ManifestError};
use crate::transcode::TranscodeError;

/// Terminal outcome of a failed pipeline run. Stage errors are carried unmodified.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    NoPlayableStream(#[from] NoPlayableStreamError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error(transparent)]
    Transcode(TranscodeError),

    #[error("download cancelled")]
    Cancelled,

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TranscodeError> for PipelineError {
    fn from(err: TranscodeError) -> Self {
        match err {
            TranscodeError::UpstreamStarved(AcquisitionError::Cancelled)
            | TranscodeError::Cancelled => PipelineError::Cancelled,
            TranscodeError::UpstreamStarved(source) => PipelineError::Acquisition(source),
            other => PipelineError::Transcode(other),
        }
    }
}

impl PipelineError {
    /// Whether the run ended because the caller cancelled it.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_failure_surfaces_origin() {
        let err = PipelineError::from(TranscodeError::UpstreamStarved(
            AcquisitionError::SegmentUnavailable {
                index: 3,
                status: None,
                reason: "timed out".to_string(),
            },
        ));
        match err {
            PipelineError::Acquisition(e) => assert_eq!(e.index(), Some(3)),
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(PipelineError::from(TranscodeError::Cancelled).is_cancelled());
        assert!(
            PipelineError::from(TranscodeError::UpstreamStarved(AcquisitionError::Cancelled))
                .is_cancelled()
        );
        assert!(matches!(
            PipelineError::from(TranscodeError::EncoderProcess {
                exit_code: Some(1),
                stderr: String::new()
            }),
            PipelineError::Transcode(TranscodeError::EncoderProcess { .. })
        ));
    }
}
