//! # scdl-engine
//!
//! Download engine for SoundCloud tracks served over HLS.
//!
//! A run resolves the track, picks a stream variant, fetches its media
//! playlist, acquires the segments with a bounded worker pool and pipes the
//! ordered bytes into an external encoder.
//!
//! ## Features
//!
//! - Indirection documents and master playlists followed to the media playlist
//! - Concurrent segment fetching with in-order emission and retry budgets
//! - Streaming transcode through `ffmpeg` with atomic output placement
//! - Cooperative cancellation and progress events

pub mod builder;
pub mod config;
pub mod downloader;
pub mod error;
pub mod hls;
pub mod pipeline;
pub mod progress;
pub mod transcode;
pub mod utils;

pub use builder::DownloaderConfigBuilder;
pub use config::DownloaderConfig;
pub use downloader::create_client;
pub use error::PipelineError;

pub use hls::{
    AcquisitionError, HlsConfig, Manifest, ManifestError, ManifestFetcher, SegmentAcquirer,
};
pub use pipeline::{DownloadPipeline, DownloadRequest, PipelineConfig};
pub use progress::{PipelineEvent, ProgressReporter, Stage};
pub use transcode::{
    AudioCodec, EncoderConfig, Quality, TranscodeBridge, TranscodeError, TranscodeJob,
};
pub use utils::sanitize_file_name;

// Platform types callers need to build a request
pub use scdl_platforms::AuthContext;
