pub mod auth;
pub mod error;
pub mod factory;
pub mod platform_extractor;
pub mod platforms;
pub mod selector;

pub use auth::AuthContext;
pub use error::{NoPlayableStreamError, ResolutionError};
pub use platform_extractor::PlatformExtractor;
pub use selector::select_stream;
