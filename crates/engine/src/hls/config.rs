use std::time::Duration;

// --- Top-Level Configuration ---
#[derive(Debug, Clone, Default)]
pub struct HlsConfig {
    pub playlist_config: HlsPlaylistConfig,
    pub scheduler_config: HlsSchedulerConfig,
    pub fetcher_config: HlsFetcherConfig,
    pub output_config: HlsOutputConfig,
}

// --- Playlist Configuration ---
#[derive(Debug, Clone)]
pub struct HlsPlaylistConfig {
    pub fetch_timeout: Duration,
    /// Attempts per manifest request, including the first one
    pub max_attempts: u32,
    pub retry_delay_base: Duration, // Base for exponential backoff
    /// JSON indirection documents and master playlists followed before giving up
    pub max_indirection_hops: u32,
}

impl Default for HlsPlaylistConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(15),
            max_attempts: 3,
            retry_delay_base: Duration::from_millis(500),
            max_indirection_hops: 3,
        }
    }
}

// --- Scheduler Configuration ---
#[derive(Debug, Clone)]
pub struct HlsSchedulerConfig {
    pub download_concurrency: usize, // Max concurrent segment downloads
    /// Segments allowed past the emission cursor, bounds the reorder buffer
    pub prefetch_window: usize,
}

impl Default for HlsSchedulerConfig {
    fn default() -> Self {
        Self {
            download_concurrency: 4,
            prefetch_window: 8,
        }
    }
}

// --- Fetcher Configuration ---
#[derive(Debug, Clone)]
pub struct HlsFetcherConfig {
    pub segment_download_timeout: Duration,
    pub max_segment_retries: u32,
    pub segment_retry_delay_base: Duration, // Base for exponential backoff
    pub max_retry_jitter: Duration,
    /// Retries shared by every segment of one acquisition
    pub total_retry_budget: u32,
}

impl Default for HlsFetcherConfig {
    fn default() -> Self {
        Self {
            segment_download_timeout: Duration::from_secs(20),
            max_segment_retries: 3,
            segment_retry_delay_base: Duration::from_millis(500),
            max_retry_jitter: Duration::from_millis(250),
            total_retry_budget: 24,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HlsOutputConfig {
    /// Capacity of the ordered channel between acquisition and transcoding
    pub emitted_channel_capacity: usize,
}

impl Default for HlsOutputConfig {
    fn default() -> Self {
        Self {
            emitted_channel_capacity: 4,
        }
    }
}

impl HlsConfig {
    /// Retry backoff for the given attempt number (1-based): `base * 2^(attempt-1)`.
    pub(crate) fn backoff(base: Duration, attempt: u32) -> Duration {
        base.saturating_mul(2_u32.saturating_pow(attempt.saturating_sub(1)))
    }
}
