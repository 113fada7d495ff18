// HLS Segment Acquirer: wires the scheduler and output manager for one manifest.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use reqwest::Client;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::debug;

use crate::hls::config::HlsConfig;
use crate::hls::error::AcquisitionError;
use crate::hls::fetcher::{SegmentDownloader, SegmentFetcher};
use crate::hls::manifest::Manifest;
use crate::hls::output::OutputManager;
use crate::hls::scheduler::{AcquiredSegment, SegmentScheduler};

/// Segments of one manifest, in playback order.
///
/// Yields at most one error, after which the stream ends. Dropping the stream
/// cancels the acquisition and aborts in-flight fetches.
pub struct SegmentStream {
    inner: ReceiverStream<Result<AcquiredSegment, AcquisitionError>>,
    total: u64,
    _guard: DropGuard,
}

impl SegmentStream {
    /// Number of segments the stream yields on success.
    pub fn total(&self) -> u64 {
        self.total
    }
}

impl Stream for SegmentStream {
    type Item = Result<AcquiredSegment, AcquisitionError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

pub struct SegmentAcquirer {
    config: Arc<HlsConfig>,
    segment_fetcher: Arc<dyn SegmentDownloader>,
}

impl SegmentAcquirer {
    /// Acquirer fetching over HTTP. The retry budget spans every acquisition it runs.
    pub fn new(http_client: Client, config: Arc<HlsConfig>) -> Self {
        let segment_fetcher = Arc::new(SegmentFetcher::new(http_client, Arc::clone(&config)));
        Self {
            config,
            segment_fetcher,
        }
    }

    pub fn with_downloader(
        config: Arc<HlsConfig>,
        segment_fetcher: Arc<dyn SegmentDownloader>,
    ) -> Self {
        Self {
            config,
            segment_fetcher,
        }
    }

    /// Starts fetching every segment of `manifest`. Must be called within a Tokio runtime.
    ///
    /// Cancelling `token` aborts the acquisition; the stream then ends with
    /// [`AcquisitionError::Cancelled`] or without a further item.
    pub fn acquire(&self, manifest: &Manifest, token: &CancellationToken) -> SegmentStream {
        let token = token.child_token();
        let total = manifest.len() as u64;
        let concurrency = self.config.scheduler_config.download_concurrency.max(1);

        let (ordered_tx, ordered_rx) =
            mpsc::channel(self.config.output_config.emitted_channel_capacity.max(1));
        let (completed_tx, completed_rx) = mpsc::channel(concurrency);
        let (emitted_tx, emitted_rx) = watch::channel(0_u64);

        let mut output_manager =
            OutputManager::new(completed_rx, ordered_tx, total, emitted_tx, token.clone());
        let mut scheduler = SegmentScheduler::new(
            Arc::clone(&self.config),
            Arc::clone(&self.segment_fetcher),
            manifest.segments().to_vec(),
            completed_tx,
            emitted_rx,
            token.clone(),
        );

        debug!(segments = total, concurrency, "Starting segment acquisition");
        tokio::spawn(async move {
            output_manager.run().await;
        });
        tokio::spawn(async move {
            scheduler.run().await;
        });

        SegmentStream {
            inner: ReceiverStream::new(ordered_rx),
            total,
            _guard: token.drop_guard(),
        }
    }
}
