// HLS acquisition: manifest resolution, bounded segment fetching and ordered emission

pub mod acquirer;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod manifest;
pub mod output;
pub mod playlist;
pub mod scheduler;

// Re-exports for easier access
pub use acquirer::{SegmentAcquirer, SegmentStream};
pub use config::{
    HlsConfig, HlsFetcherConfig, HlsOutputConfig, HlsPlaylistConfig, HlsSchedulerConfig,
};
pub use error::{AcquisitionError, ManifestError};
pub use fetcher::{SegmentDownloader, SegmentFetcher};
pub use manifest::{ByteRange, Manifest, SegmentRef};
pub use playlist::ManifestFetcher;
pub use scheduler::AcquiredSegment;
