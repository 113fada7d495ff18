mod builder;
pub mod models;

pub use builder::{DEFAULT_API_BASE, SoundCloud, URL_REGEX};
