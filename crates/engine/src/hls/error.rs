use reqwest::StatusCode;

fn status_suffix(status: &Option<StatusCode>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ManifestError {
    #[error("manifest unreachable at {url} after {attempts} attempt(s){}", status_suffix(.status))]
    Unreachable {
        url: String,
        status: Option<StatusCode>,
        attempts: u32,
    },
    #[error("playlist contains no segments")]
    EmptyPlaylist,
    #[error("invalid playlist: {0}")]
    ParseError(String),
}

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum AcquisitionError {
    #[error("segment {index} unavailable{}: {reason}", status_suffix(.status))]
    SegmentUnavailable {
        index: u64,
        status: Option<StatusCode>,
        reason: String,
    },
    #[error("retry budget exhausted after {retries} retries")]
    Exhausted { retries: u32 },
    #[error("segment {index} size mismatch: expected {expected} bytes, got {actual}")]
    IntegrityMismatch {
        index: u64,
        expected: u64,
        actual: u64,
    },
    #[error("acquisition ended after {emitted} of {expected} segments")]
    Incomplete { emitted: u64, expected: u64 },
    #[error("acquisition cancelled")]
    Cancelled,
}

impl AcquisitionError {
    /// Index of the segment the failure is attributed to, if any.
    pub fn index(&self) -> Option<u64> {
        match self {
            AcquisitionError::SegmentUnavailable { index, .. }
            | AcquisitionError::IntegrityMismatch { index, .. } => Some(*index),
            _ => None,
        }
    }
}
