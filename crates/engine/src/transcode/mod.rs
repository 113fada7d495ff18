//! External encoder stage: codec table, job arguments and the process bridge.

pub mod codec;
pub mod encoder;
pub mod error;
pub mod job;
mod locate;

pub use codec::{AudioCodec, Quality};
pub use encoder::{EncoderConfig, TranscodeBridge};
pub use error::TranscodeError;
pub use job::{TrackTags, TranscodeJob};
pub use locate::locate_encoder;
