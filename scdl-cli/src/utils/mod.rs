mod headers;
pub mod progress;

pub use self::headers::parse_headers;
