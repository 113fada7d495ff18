pub mod formats;
pub mod stream_variant;
pub mod track;

pub use formats::{AccessTier, StreamProtocol};
pub use stream_variant::StreamVariant;
pub use track::Track;
