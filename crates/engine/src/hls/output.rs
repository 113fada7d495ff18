// HLS Output Manager: restores playback order of fetched segments.
// Completions are buffered until the earliest unemitted index is ready.

use crate::hls::error::AcquisitionError;
use crate::hls::scheduler::AcquiredSegment;
use std::collections::BTreeMap;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

pub struct OutputManager {
    input_rx: mpsc::Receiver<Result<AcquiredSegment, AcquisitionError>>,
    event_tx: mpsc::Sender<Result<AcquiredSegment, AcquisitionError>>,
    reorder_buffer: BTreeMap<u64, AcquiredSegment>,
    expected_next_index: u64,
    total_segments: u64,
    emitted_tx: watch::Sender<u64>,
    token: CancellationToken,
}

impl OutputManager {
    pub fn new(
        input_rx: mpsc::Receiver<Result<AcquiredSegment, AcquisitionError>>,
        event_tx: mpsc::Sender<Result<AcquiredSegment, AcquisitionError>>,
        total_segments: u64,
        emitted_tx: watch::Sender<u64>,
        token: CancellationToken,
    ) -> Self {
        Self {
            input_rx,
            event_tx,
            reorder_buffer: BTreeMap::new(),
            expected_next_index: 0,
            total_segments,
            emitted_tx,
            token,
        }
    }

    /// Main loop for the OutputManager.
    pub async fn run(&mut self) {
        while self.expected_next_index < self.total_segments {
            tokio::select! {
                biased;

                _ = self.token.cancelled() => {
                    debug!(
                        buffered = self.reorder_buffer.len(),
                        "Cancelled, discarding reorder buffer."
                    );
                    self.reorder_buffer.clear();
                    let _ = self.event_tx.try_send(Err(AcquisitionError::Cancelled));
                    return;
                }

                processed_result = self.input_rx.recv() => {
                    match processed_result {
                        Some(Ok(segment)) => {
                            trace!(index = segment.index, "Adding segment to reorder buffer.");
                            self.reorder_buffer.insert(segment.index, segment);
                            if self.try_emit_segments().await.is_err() {
                                debug!("Ordered stream receiver dropped. Exiting.");
                                return;
                            }
                        }
                        Some(Err(e)) => {
                            error!(error = %e, "Acquisition failed. Discarding buffered segments.");
                            self.reorder_buffer.clear();
                            let _ = self.send_event(Err(e)).await;
                            return;
                        }
                        None => {
                            // Scheduler ended before every segment arrived
                            let err = AcquisitionError::Incomplete {
                                emitted: self.expected_next_index,
                                expected: self.total_segments,
                            };
                            error!(error = %err, "Segment source closed early.");
                            self.reorder_buffer.clear();
                            let _ = self.send_event(Err(err)).await;
                            return;
                        }
                    }
                }
            }
        }
        debug!(segments = self.total_segments, "All segments emitted in order.");
    }

    /// Emits every segment that continues the ordered prefix.
    /// Returns Err(()) if the ordered stream is gone or the run was cancelled.
    async fn try_emit_segments(&mut self) -> Result<(), ()> {
        while let Some(segment) = self.reorder_buffer.remove(&self.expected_next_index) {
            self.send_event(Ok(segment)).await?;
            self.expected_next_index += 1;
            self.emitted_tx.send_replace(self.expected_next_index);
        }
        Ok(())
    }

    async fn send_event(
        &self,
        event: Result<AcquiredSegment, AcquisitionError>,
    ) -> Result<(), ()> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(()),
            sent = self.event_tx.send(event) => sent.map_err(|_| ()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn segment(index: u64) -> AcquiredSegment {
        AcquiredSegment {
            index,
            data: Bytes::from(vec![index as u8; 4]),
        }
    }

    #[tokio::test]
    async fn test_reorders_out_of_order_completions() {
        let (input_tx, input_rx) = mpsc::channel(8);
        let (event_tx, mut event_rx) = mpsc::channel(8);
        let (emitted_tx, emitted_rx) = watch::channel(0);
        let mut manager =
            OutputManager::new(input_rx, event_tx, 4, emitted_tx, CancellationToken::new());

        for index in [2, 0, 3, 1] {
            input_tx.send(Ok(segment(index))).await.unwrap();
        }
        manager.run().await;

        let mut order = Vec::new();
        while let Ok(event) = event_rx.try_recv() {
            order.push(event.unwrap().index);
        }
        assert_eq!(order, vec![0, 1, 2, 3]);
        assert_eq!(*emitted_rx.borrow(), 4);
    }

    #[tokio::test]
    async fn test_forwards_error_and_discards_buffer() {
        let (input_tx, input_rx) = mpsc::channel(8);
        let (event_tx, mut event_rx) = mpsc::channel(8);
        let (emitted_tx, _emitted_rx) = watch::channel(0);
        let mut manager =
            OutputManager::new(input_rx, event_tx, 4, emitted_tx, CancellationToken::new());

        input_tx.send(Ok(segment(0))).await.unwrap();
        input_tx.send(Ok(segment(2))).await.unwrap();
        input_tx
            .send(Err(AcquisitionError::SegmentUnavailable {
                index: 1,
                status: None,
                reason: "gone".to_string(),
            }))
            .await
            .unwrap();
        manager.run().await;
        drop(manager);

        assert_eq!(event_rx.recv().await.unwrap().unwrap().index, 0);
        let err = event_rx.recv().await.unwrap().unwrap_err();
        assert_eq!(err.index(), Some(1));
        assert!(event_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_reports_incomplete_when_input_closes() {
        let (input_tx, input_rx) = mpsc::channel(8);
        let (event_tx, mut event_rx) = mpsc::channel(8);
        let (emitted_tx, _emitted_rx) = watch::channel(0);
        let mut manager =
            OutputManager::new(input_rx, event_tx, 3, emitted_tx, CancellationToken::new());

        input_tx.send(Ok(segment(0))).await.unwrap();
        drop(input_tx);
        manager.run().await;

        assert!(event_rx.recv().await.unwrap().is_ok());
        assert_eq!(
            event_rx.recv().await.unwrap().unwrap_err(),
            AcquisitionError::Incomplete {
                emitted: 1,
                expected: 3
            }
        );
    }
}
