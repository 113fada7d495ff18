use reqwest::StatusCode;
use thiserror::Error;

/// Failure to turn a track URL into a [`Track`](crate::media::Track).
///
/// None of these are retried internally: resolution failures are rarely
/// transient, the caller decides whether another attempt makes sense.
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("track not found")]
    NotFound,
    #[error("unauthorized (HTTP {status}): check the client id and access token")]
    Unauthorized { status: StatusCode },
    #[error("malformed track url: {0}")]
    MalformedUrl(String),
    #[error("upstream error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Upstream {
        status: Option<StatusCode>,
        message: String,
    },
}

impl ResolutionError {
    /// Maps a non-success metadata response status.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ResolutionError::Unauthorized { status }
            }
            StatusCode::NOT_FOUND => ResolutionError::NotFound,
            _ => ResolutionError::Upstream {
                status: Some(status),
                message: "metadata request failed".to_string(),
            },
        }
    }
}

impl From<reqwest::Error> for ResolutionError {
    fn from(err: reqwest::Error) -> Self {
        ResolutionError::Upstream {
            status: err.status(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ResolutionError {
    fn from(err: serde_json::Error) -> Self {
        ResolutionError::Upstream {
            status: None,
            message: format!("invalid metadata response: {err}"),
        }
    }
}

/// No variant of the track survived stream selection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no playable stream for track {track_id}: {reason}")]
pub struct NoPlayableStreamError {
    pub track_id: u64,
    pub reason: String,
}
