use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Delivery protocol of a stream variant.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamProtocol {
    /// Plain (unencrypted) HTTP Live Streaming.
    Hls,
    /// HLS with AES/CENC encrypted segments.
    EncryptedHls,
    /// A single progressive-download file.
    Progressive,
}

impl StreamProtocol {
    pub fn as_str(&self) -> &str {
        match self {
            StreamProtocol::Hls => "hls",
            StreamProtocol::EncryptedHls => "encrypted-hls",
            StreamProtocol::Progressive => "progressive",
        }
    }

    /// Whether the variant is delivered as plain HLS segments we can reassemble.
    pub fn is_plain_hls(&self) -> bool {
        matches!(self, StreamProtocol::Hls)
    }
}

impl Display for StreamProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StreamProtocol {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hls" => Ok(StreamProtocol::Hls),
            "encrypted-hls" | "ctr-encrypted-hls" | "cbc-encrypted-hls" => {
                Ok(StreamProtocol::EncryptedHls)
            }
            "progressive" => Ok(StreamProtocol::Progressive),
            _ => Err(()),
        }
    }
}

/// Authorization level a variant requires.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccessTier {
    /// Available with a client identifier alone.
    Public,
    /// Requires an elevated (subscription) access token.
    Elevated,
}

impl AccessTier {
    pub fn as_str(&self) -> &str {
        match self {
            AccessTier::Public => "public",
            AccessTier::Elevated => "elevated",
        }
    }

    /// Maps the platform's quality label to a tier. `hq` is subscription-only.
    pub fn from_quality(quality: &str) -> Self {
        match quality.to_lowercase().as_str() {
            "hq" => AccessTier::Elevated,
            _ => AccessTier::Public,
        }
    }
}

impl Display for AccessTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
