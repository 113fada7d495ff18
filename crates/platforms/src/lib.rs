pub mod extractor;
pub mod media;

pub use extractor::{
    AuthContext, NoPlayableStreamError, PlatformExtractor, ResolutionError, select_stream,
};
pub use media::{AccessTier, StreamProtocol, StreamVariant, Track};
