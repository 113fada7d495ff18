// HLS Segment Scheduler: runs the bounded pool of segment fetches ahead of the emission point.

use crate::hls::config::HlsConfig;
use crate::hls::error::AcquisitionError;
use crate::hls::fetcher::SegmentDownloader;
use crate::hls::manifest::SegmentRef;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// A downloaded segment, tagged with its playback position.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquiredSegment {
    pub index: u64,
    pub data: Bytes,
}

pub struct SegmentScheduler {
    config: Arc<HlsConfig>,
    segment_fetcher: Arc<dyn SegmentDownloader>,
    pending: VecDeque<SegmentRef>,
    output_tx: mpsc::Sender<Result<AcquiredSegment, AcquisitionError>>,
    // next index the output manager will emit
    emitted_rx: watch::Receiver<u64>,
    token: CancellationToken,
}

impl SegmentScheduler {
    pub fn new(
        config: Arc<HlsConfig>,
        segment_fetcher: Arc<dyn SegmentDownloader>,
        segments: Vec<SegmentRef>,
        output_tx: mpsc::Sender<Result<AcquiredSegment, AcquisitionError>>,
        emitted_rx: watch::Receiver<u64>,
        token: CancellationToken,
    ) -> Self {
        Self {
            config,
            segment_fetcher,
            pending: segments.into(),
            output_tx,
            emitted_rx,
            token,
        }
    }

    async fn perform_segment_fetch(
        segment_fetcher: Arc<dyn SegmentDownloader>,
        segment: SegmentRef,
    ) -> Result<AcquiredSegment, AcquisitionError> {
        let data = segment_fetcher.download_segment(&segment).await?;

        if let Some(expected) = segment.expected_size()
            && data.len() as u64 != expected
        {
            return Err(AcquisitionError::IntegrityMismatch {
                index: segment.index,
                expected,
                actual: data.len() as u64,
            });
        }

        Ok(AcquiredSegment {
            index: segment.index,
            data,
        })
    }

    /// Whether the next pending segment may start now.
    fn can_launch(&mut self, in_progress: usize) -> bool {
        let concurrency = self.config.scheduler_config.download_concurrency.max(1);
        let window = self.config.scheduler_config.prefetch_window.max(1) as u64;
        let cursor = *self.emitted_rx.borrow_and_update();

        in_progress < concurrency
            && self
                .pending
                .front()
                .is_some_and(|segment| segment.index < cursor + window)
    }

    pub async fn run(&mut self) {
        info!(segments = self.pending.len(), "SegmentScheduler started.");
        // OutputManager restores the order of completions
        let mut futures = FuturesUnordered::new();

        loop {
            if self.can_launch(futures.len()) {
                if let Some(segment) = self.pending.pop_front() {
                    debug!(index = segment.index, url = %segment.url, "Launching segment fetch.");
                    futures.push(Self::perform_segment_fetch(
                        Arc::clone(&self.segment_fetcher),
                        segment,
                    ));
                }
                continue;
            }

            if futures.is_empty() && self.pending.is_empty() {
                break;
            }

            let in_progress_count = futures.len();
            tokio::select! {
                biased;

                _ = self.token.cancelled() => {
                    debug!(in_flight = in_progress_count, "Cancelled, aborting in-flight fetches.");
                    break;
                }

                Some(result) = futures.next(), if in_progress_count > 0 => {
                    let failed = result.is_err();
                    if let Err(e) = &result {
                        warn!(error = %e, "Segment fetch failed.");
                    }
                    if self.output_tx.send(result).await.is_err() {
                        error!("Output channel closed. Shutting down scheduler.");
                        break;
                    }
                    if failed {
                        // Stop launching; dropping the pool aborts the other fetches
                        break;
                    }
                }

                changed = self.emitted_rx.changed() => {
                    if changed.is_err() {
                        debug!("OutputManager gone. Shutting down scheduler.");
                        break;
                    }
                }
            }
        }
        info!("SegmentScheduler finished.");
    }
}
