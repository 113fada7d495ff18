use std::time::Duration;

use super::stream_variant::StreamVariant;
use serde::{Deserialize, Serialize};

/// A resolved track and every stream variant the platform offered for it.
///
/// Immutable once resolved; the pipeline hands `streams` to the selector and
/// keeps the descriptive fields for tagging the output file.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Track {
    pub id: u64,
    pub title: String,
    pub artist: String,
    pub duration: Duration,
    pub permalink_url: String,
    pub artwork_url: Option<String>,
    // Monetization policy reported by the platform, e.g. "ALLOW", "SNIP", "BLOCK"
    pub policy: Option<String>,
    pub streams: Vec<StreamVariant>,
}

impl Track {
    /// Whether the platform only serves a preview of this track to the caller.
    pub fn is_preview_only(&self) -> bool {
        self.policy.as_deref() == Some("SNIP")
    }
}
